use chrono::Utc;
use clap::{Parser, Subcommand};
use liftlog_core::*;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Workout logging and progression analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new workout session, optionally from a template
    Start {
        /// Template name (case-insensitive)
        #[arg(long)]
        template: Option<String>,
    },

    /// Repeat a previous session's movements and variants
    Duplicate {
        /// Session id or unique prefix
        session: String,
    },

    /// Add a movement to an in-progress session
    Add {
        /// Session id or unique prefix
        session: String,
        /// Movement name (case-insensitive)
        movement: String,
        /// Target set count (defaults to the movement's)
        #[arg(long)]
        sets: Option<i32>,
    },

    /// Record a set in an in-progress session
    Log {
        /// Session id or unique prefix
        session: String,
        /// Movement slot (ordering index within the session)
        slot: i32,
        /// Set index within the slot
        set: i32,
        #[arg(long)]
        reps: i32,
        /// Weight in the canonical unit (lb)
        #[arg(long)]
        weight: f64,
        /// Mark as a warmup set (excluded from all analytics)
        #[arg(long)]
        warmup: bool,
    },

    /// Finish a session: records duration and detects personal records
    Finish {
        /// Session id or unique prefix
        session: String,
    },

    /// Cancel a session without any PR work
    Cancel {
        /// Session id or unique prefix
        session: String,
    },

    /// Show trailing-week stats, strength trend and streak (default)
    Stats,

    /// Show the logged history of one movement
    History {
        /// Movement name (case-insensitive)
        movement: String,
        /// Narrow to one equipment variant
        #[arg(long)]
        variant: Option<String>,
    },

    /// Roll up the session journal to the CSV archive
    Rollup {
        /// Remove processed journal files afterwards
        #[arg(long)]
        cleanup: bool,
    },

    /// List movements and their variants
    Movements,

    /// List workout templates
    Templates,

    /// Seed an empty store with the starter catalog
    Seed,
}

struct Paths {
    store: PathBuf,
    journal_dir: PathBuf,
    journal: PathBuf,
    csv: PathBuf,
}

impl Paths {
    fn new(data_dir: &Path) -> Self {
        let journal_dir = data_dir.join("journal");
        Self {
            store: data_dir.join("store.json"),
            journal: journal_dir.join("sessions.jsonl"),
            journal_dir,
            csv: data_dir.join("sessions.csv"),
        }
    }
}

fn main() -> Result<()> {
    liftlog_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = Paths::new(&data_dir);

    match cli.command {
        Some(Commands::Start { template }) => cmd_start(&paths, template),
        Some(Commands::Duplicate { session }) => cmd_duplicate(&paths, &session),
        Some(Commands::Add {
            session,
            movement,
            sets,
        }) => cmd_add(&paths, &session, &movement, sets),
        Some(Commands::Log {
            session,
            slot,
            set,
            reps,
            weight,
            warmup,
        }) => cmd_log(&paths, &session, slot, set, reps, weight, warmup),
        Some(Commands::Finish { session }) => cmd_finish(&paths, &session),
        Some(Commands::Cancel { session }) => cmd_cancel(&paths, &session),
        Some(Commands::History { movement, variant }) => {
            cmd_history(&paths, &config, &movement, variant.as_deref())
        }
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&paths, cleanup),
        Some(Commands::Movements) => cmd_movements(&paths),
        Some(Commands::Templates) => cmd_templates(&paths),
        Some(Commands::Seed) => cmd_seed(&paths),
        Some(Commands::Stats) | None => cmd_stats(&paths, &config),
    }
}

fn find_session_id(store: &WorkoutStore, prefix: &str) -> Result<Uuid> {
    store
        .session_by_prefix(prefix)
        .map(|s| s.id)
        .ok_or_else(|| Error::Other(format!("No unique session matches '{}'", prefix)))
}

fn take_session(store: &mut WorkoutStore, id: Uuid) -> Result<WorkoutSession> {
    let index = store
        .sessions
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| Error::Other(format!("Session {} not found", id)))?;
    Ok(store.sessions.swap_remove(index))
}

fn require_in_progress(session: &WorkoutSession) -> Result<()> {
    if session.status != SessionStatus::InProgress {
        return Err(Error::Other(format!(
            "Session {} is {:?}, not in progress",
            session.id, session.status
        )));
    }
    Ok(())
}

fn cmd_start(paths: &Paths, template_name: Option<String>) -> Result<()> {
    WorkoutStore::update(&paths.store, |store| {
        let template = match &template_name {
            Some(name) => Some(store.catalog.template_by_name(name).ok_or_else(|| {
                Error::Other(format!("No template named '{}'", name))
            })?),
            None => None,
        };

        let session = create_session(&store.catalog, &store.sessions, template, Utc::now());
        println!("✓ Started session {}", session.id);
        print_session_movements(&session, &store.catalog);
        store.sessions.push(session);
        Ok(())
    })?;
    Ok(())
}

fn cmd_duplicate(paths: &Paths, prefix: &str) -> Result<()> {
    WorkoutStore::update(&paths.store, |store| {
        let id = find_session_id(store, prefix)?;
        let source = store
            .session(id)
            .ok_or_else(|| Error::Other(format!("Session {} not found", id)))?;
        let session = duplicate_session(&store.catalog, source, Utc::now());
        println!("✓ Started session {} (repeat of {})", session.id, id);
        print_session_movements(&session, &store.catalog);
        store.sessions.push(session);
        Ok(())
    })?;
    Ok(())
}

fn cmd_add(paths: &Paths, prefix: &str, movement_name: &str, sets: Option<i32>) -> Result<()> {
    WorkoutStore::update(&paths.store, |store| {
        let id = find_session_id(store, prefix)?;
        let mut session = take_session(store, id)?;
        let outcome = (|| {
            require_in_progress(&session)?;
            let movement = store.catalog.movement_by_name(movement_name).ok_or_else(|| {
                Error::Other(format!("No movement named '{}'", movement_name))
            })?;
            let added = add_movement(&mut session, movement, sets, &store.sessions, Utc::now());
            println!(
                "✓ Added {} at slot {} ({} sets)",
                movement.name, added.ordering_index, added.target_set_count
            );
            Ok(())
        })();
        store.sessions.push(session);
        outcome
    })?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_log(
    paths: &Paths,
    prefix: &str,
    slot: i32,
    set_index: i32,
    reps: i32,
    weight: f64,
    warmup: bool,
) -> Result<()> {
    WorkoutStore::update(&paths.store, |store| {
        let id = find_session_id(store, prefix)?;
        let session = store
            .session_mut(id)
            .ok_or_else(|| Error::Other(format!("Session {} not found", id)))?;
        require_in_progress(session)?;

        let movement = session
            .movements
            .iter_mut()
            .find(|m| m.ordering_index == slot)
            .ok_or_else(|| Error::Other(format!("No movement at slot {}", slot)))?;
        let set = movement
            .sets
            .iter_mut()
            .find(|s| s.set_index == set_index)
            .ok_or_else(|| Error::Other(format!("No set {} in slot {}", set_index, slot)))?;

        set.reps = reps.max(0);
        set.weight = weight;
        set.is_warmup = warmup;
        set.is_completed = true;
        set.timestamp = Utc::now();

        println!(
            "✓ Logged slot {} set {}: {} x {} lb{}",
            slot,
            set_index,
            set.reps,
            set.weight,
            if warmup { " (warmup)" } else { "" }
        );
        Ok(())
    })?;
    Ok(())
}

fn cmd_finish(paths: &Paths, prefix: &str) -> Result<()> {
    let journal_path = paths.journal.clone();
    WorkoutStore::update(&paths.store, |store| {
        let id = find_session_id(store, prefix)?;
        let mut session = take_session(store, id)?;
        let outcome = (|| {
            require_in_progress(&session)?;
            finish_session(&mut session, &store.sessions, Utc::now());

            let mut sink = JsonlSink::new(&journal_path);
            sink.append(&session)?;

            println!(
                "✓ Finished session {} in {}s with {} PR(s)",
                session.id,
                session.duration_seconds,
                session.personal_record_count()
            );
            Ok(())
        })();
        store.sessions.push(session);
        outcome
    })?;
    Ok(())
}

fn cmd_cancel(paths: &Paths, prefix: &str) -> Result<()> {
    WorkoutStore::update(&paths.store, |store| {
        let id = find_session_id(store, prefix)?;
        let session = store
            .session_mut(id)
            .ok_or_else(|| Error::Other(format!("Session {} not found", id)))?;
        require_in_progress(session)?;
        cancel_session(session, Utc::now());
        println!("✓ Cancelled session {}", id);
        Ok(())
    })?;
    Ok(())
}

fn cmd_stats(paths: &Paths, config: &Config) -> Result<()> {
    let store = WorkoutStore::load(&paths.store)?;
    let now = Utc::now();
    let stats = profile_stats(&store.sessions, &store.catalog, now);
    let streak = weekly_streak(&store.sessions, now, config.stats.week_start_day());

    println!("╭─────────────────────────────────────────╮");
    println!("│  TRAILING 7 DAYS                        │");
    println!("╰─────────────────────────────────────────╯");
    println!("  Workouts (7d): {}", stats.workout_count);
    println!("  Volume (7d):   {:.0} lb", stats.total_volume);
    match &stats.strength_trend {
        Some(trend) => println!(
            "  Strength:      {}{:.1}% vs 4 weeks ago",
            if trend.is_up() { "+" } else { "" },
            trend.percent_change * 100.0
        ),
        None => println!("  Strength:      not enough data"),
    }
    println!("  Week streak:   {}", streak);

    if !stats.muscle_group_sets.is_empty() {
        println!();
        println!("  Sets by muscle group:");
        for group in &stats.muscle_group_sets {
            println!("    {:<12} {}", group.name, group.set_count);
        }
    }

    let in_progress = store.in_progress_sessions();
    if !in_progress.is_empty() {
        println!();
        println!("  In progress:");
        for session in in_progress {
            println!(
                "    {}  {} (started {})",
                session.id,
                store.catalog.session_title(session),
                session.start_time.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

fn cmd_history(
    paths: &Paths,
    _config: &Config,
    movement_name: &str,
    variant_name: Option<&str>,
) -> Result<()> {
    let store = WorkoutStore::load(&paths.store)?;
    let movement = store
        .catalog
        .movement_by_name(movement_name)
        .ok_or_else(|| Error::Other(format!("No movement named '{}'", movement_name)))?;
    let variant = match variant_name {
        Some(name) => {
            let needle = name.to_lowercase();
            let found = movement
                .variants
                .iter()
                .find(|v| v.name.to_lowercase() == needle)
                .ok_or_else(|| {
                    Error::Other(format!("'{}' has no variant '{}'", movement.name, name))
                })?;
            Some(found)
        }
        None => None,
    };

    let summary = exercise_history(
        movement.id,
        variant.map(|v| v.id),
        &store.sessions,
        &store.catalog,
        Utc::now(),
    );

    match variant {
        Some(v) => println!("History: {} {}", v.name, movement.name),
        None => println!("History: {}", movement.name),
    }
    match summary.all_time_pr {
        Some(pr) => println!(
            "  All-time PR:    {:.1} lb ({})",
            pr.value,
            pr.date.format("%Y-%m-%d")
        ),
        None => println!("  All-time PR:    none"),
    }
    if let Some(best) = summary.best_e1rm {
        println!(
            "  Best est. 1RM:  {:.1} lb ({})",
            best.value,
            best.date.format("%Y-%m-%d")
        );
    }
    if let Some(average) = summary.recent_average_weight {
        println!("  14-day average: {:.1} lb", average);
    }
    println!(
        "  Sessions charted: {} days, {} volume points",
        summary.best_set_series.len(),
        summary.volume_series.len()
    );

    if !summary.set_logs.is_empty() {
        println!();
        println!("  Recent sets:");
        for entry in summary.set_logs.iter().take(10) {
            println!(
                "    {}  {:<16} set {}: {} x {:.1} lb",
                entry.date.format("%Y-%m-%d"),
                entry.workout_name,
                entry.set_index,
                entry.reps,
                entry.weight
            );
        }
    }

    Ok(())
}

fn cmd_rollup(paths: &Paths, cleanup: bool) -> Result<()> {
    if !paths.journal.exists() {
        println!("No journal found, nothing to roll up.");
        return Ok(());
    }

    let store = WorkoutStore::load(&paths.store)?;
    let count = export::journal_to_csv_and_archive(&paths.journal, &paths.csv, &store.catalog)?;
    println!("✓ Rolled up {} session(s) to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = export::cleanup_processed_journals(&paths.journal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed journal(s)", cleaned);
        }
    }

    Ok(())
}

fn cmd_movements(paths: &Paths) -> Result<()> {
    let store = WorkoutStore::load(&paths.store)?;
    if store.catalog.movements.is_empty() {
        println!("No movements. Run 'liftlog seed' to load the starter catalog.");
        return Ok(());
    }

    for movement in store.catalog.sorted_movements() {
        println!(
            "{} [{}] ({} sets default)",
            movement.name, movement.category, movement.default_set_count
        );
        for variant in movement.sorted_variants() {
            println!("    {} ({})", variant.name, variant.resistance_type.display_name());
        }
    }
    Ok(())
}

fn cmd_templates(paths: &Paths) -> Result<()> {
    let store = WorkoutStore::load(&paths.store)?;
    if store.catalog.templates.is_empty() {
        println!("No templates. Run 'liftlog seed' to load the starter catalog.");
        return Ok(());
    }

    for template in store.catalog.sorted_templates() {
        println!("{}", template.name);
        for item in template.sorted_items() {
            let name = store
                .catalog
                .movement(item.movement_id)
                .map(|m| m.name.as_str())
                .unwrap_or("(missing movement)");
            let sets = item
                .target_sets
                .map(|t| t.to_string())
                .unwrap_or_else(|| "default".into());
            if item.quantity > 1 {
                println!("    {} x{} ({} sets)", name, item.quantity, sets);
            } else {
                println!("    {} ({} sets)", name, sets);
            }
        }
    }
    Ok(())
}

fn cmd_seed(paths: &Paths) -> Result<()> {
    WorkoutStore::update(&paths.store, |store| {
        if !store.catalog.is_empty() {
            println!("Catalog already has data, leaving it untouched.");
            return Ok(());
        }
        store.catalog = seed_catalog();
        let errors = store.catalog.validate();
        if !errors.is_empty() {
            return Err(Error::Catalog(format!("Seed catalog invalid: {:?}", errors)));
        }
        println!(
            "✓ Seeded catalog: {} movements, {} templates",
            store.catalog.movements.len(),
            store.catalog.templates.len()
        );
        Ok(())
    })?;
    Ok(())
}

fn print_session_movements(session: &WorkoutSession, catalog: &Catalog) {
    for movement in session.ordered_movements() {
        let name = catalog
            .movement(movement.movement_id)
            .map(|m| m.name.as_str())
            .unwrap_or("(missing movement)");
        let variant = movement
            .selected_variant_id
            .and_then(|id| catalog.variant(id))
            .map(|(_, v)| v.name.as_str())
            .unwrap_or("-");
        println!(
            "  {}. {} [{}] ({} sets)",
            movement.ordering_index, name, variant, movement.target_set_count
        );
    }
}
