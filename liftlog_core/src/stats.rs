//! Windowed aggregates over completed sessions: profile stats, strength
//! trend and per-movement history.
//!
//! Everything here is pure and read-only: each function takes the session
//! collection and a reference `now` (injectable for tests) and returns a
//! value object. Only working sets (positive reps, not warmup) contribute.

use crate::catalog::Catalog;
use crate::types::{PerformedSet, SessionStatus, WorkoutSession};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Substring -> lift key for the four benchmark lifts tracked by the
/// strength trend. Matched case-insensitively against movement names.
static BENCHMARK_ALIASES: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("bench", "Bench"),
        ("squat", "Squat"),
        ("deadlift", "Deadlift"),
        ("overhead press", "OHP"),
        ("shoulder press", "OHP"),
        ("ohp", "OHP"),
    ]
});

fn seven_days() -> Duration {
    Duration::days(7)
}

fn fourteen_days() -> Duration {
    Duration::days(14)
}

fn eight_weeks() -> Duration {
    Duration::days(56)
}

/// Estimated one-rep-max: `weight * (1 + reps/30)`, zero for rep-less sets
pub fn e1rm(weight: f64, reps: i32) -> f64 {
    if reps <= 0 {
        return 0.0;
    }
    weight * (1.0 + f64::from(reps) / 30.0)
}

// ============================================================================
// Value objects
// ============================================================================

/// Trailing-week profile summary
#[derive(Clone, Debug)]
pub struct ProfileStats {
    /// Sum of weight * reps over working sets in the trailing 7 days
    pub total_volume: f64,
    /// Completed sessions started in the trailing 7 days
    pub workout_count: usize,
    /// Absent when either comparison window has no qualifying data
    pub strength_trend: Option<StrengthTrend>,
    /// Top five categories by working-set count
    pub muscle_group_sets: Vec<MuscleGroupStat>,
}

/// Relative change of average benchmark e1RM, this week vs. four weeks ago
#[derive(Clone, Copy, Debug)]
pub struct StrengthTrend {
    pub percent_change: f64,
}

impl StrengthTrend {
    pub fn is_up(&self) -> bool {
        self.percent_change >= 0.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MuscleGroupStat {
    pub name: String,
    pub set_count: usize,
}

/// A dated record value (all-time PR, best e1RM)
#[derive(Clone, Copy, Debug)]
pub struct ExerciseRecord {
    pub value: f64,
    pub date: DateTime<Utc>,
}

/// One point of a chart series, ascending by date
#[derive(Clone, Copy, Debug)]
pub struct ChartPoint {
    pub date: DateTime<Utc>,
    pub value: f64,
}

/// One working set in the full history log
#[derive(Clone, Debug)]
pub struct SetLogEntry {
    pub date: DateTime<Utc>,
    pub workout_name: String,
    pub set_index: i32,
    pub reps: i32,
    pub weight: f64,
}

/// Per-movement (optionally per-variant) historical summary
#[derive(Clone, Debug)]
pub struct ExerciseHistorySummary {
    /// Best working-set weight per calendar day, merged across sessions
    pub best_set_series: Vec<ChartPoint>,
    /// Volume per session (one point per session, not per day)
    pub volume_series: Vec<ChartPoint>,
    pub all_time_pr: Option<ExerciseRecord>,
    pub best_e1rm: Option<ExerciseRecord>,
    /// Mean working-set weight over the trailing 14 days, if any
    pub recent_average_weight: Option<f64>,
    /// Every qualifying working set, most recent first
    pub set_logs: Vec<SetLogEntry>,
}

/// A distinct (movement, variant) pair with logged working sets
#[derive(Clone, Debug)]
pub struct ExerciseHistoryEntry {
    pub movement_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub display_name: String,
}

// ============================================================================
// Profile stats
// ============================================================================

/// Compute the trailing-7-day profile summary plus the strength trend.
pub fn profile_stats(
    sessions: &[WorkoutSession],
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> ProfileStats {
    let completed: Vec<&WorkoutSession> = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Completed)
        .collect();
    let window_start = now - seven_days();
    let recent: Vec<&WorkoutSession> = completed
        .iter()
        .copied()
        .filter(|s| s.start_time > window_start && s.start_time <= now)
        .collect();

    let mut total_volume = 0.0;
    let mut category_counts: HashMap<String, usize> = HashMap::new();
    for session in &recent {
        for movement in &session.movements {
            let working: Vec<&PerformedSet> =
                movement.sets.iter().filter(|s| s.is_working()).collect();
            if working.is_empty() {
                continue;
            }
            total_volume += working
                .iter()
                .map(|s| s.weight * f64::from(s.reps))
                .sum::<f64>();

            let Some(definition) = catalog.movement(movement.movement_id) else {
                tracing::debug!(
                    "Session {} references missing movement {}, skipping in breakdown",
                    session.id,
                    movement.movement_id
                );
                continue;
            };
            let category = definition.category.trim();
            let name = if category.is_empty() { "Other" } else { category };
            *category_counts.entry(name.to_string()).or_insert(0) += working.len();
        }
    }

    let mut muscle_group_sets: Vec<MuscleGroupStat> = category_counts
        .into_iter()
        .map(|(name, set_count)| MuscleGroupStat { name, set_count })
        .collect();
    muscle_group_sets.sort_by(|a, b| {
        b.set_count
            .cmp(&a.set_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    muscle_group_sets.truncate(5);

    ProfileStats {
        total_volume,
        workout_count: recent.len(),
        strength_trend: strength_trend(&completed, catalog, now),
        muscle_group_sets,
    }
}

/// Average best benchmark e1RM in the current week against the week four
/// weeks earlier, restricted to the trailing 8 weeks. `None` whenever the
/// comparison would be meaningless (either window empty, or a zero prior).
fn strength_trend(
    completed: &[&WorkoutSession],
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Option<StrengthTrend> {
    let in_range: Vec<&WorkoutSession> = completed
        .iter()
        .copied()
        .filter(|s| s.start_time >= now - eight_weeks())
        .collect();

    let current = average_benchmark_e1rm(&in_range, catalog, now - seven_days(), now)?;
    let prior =
        average_benchmark_e1rm(&in_range, catalog, now - Duration::days(35), now - Duration::days(28))?;
    if prior <= 0.0 {
        return None;
    }

    Some(StrengthTrend {
        percent_change: (current - prior) / prior,
    })
}

/// Best e1RM per benchmark lift within the window, averaged over however
/// many of the four lifts actually have a qualifying set there.
fn average_benchmark_e1rm(
    sessions: &[&WorkoutSession],
    catalog: &Catalog,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Option<f64> {
    let mut best_by_lift: HashMap<&'static str, f64> = HashMap::new();

    for session in sessions
        .iter()
        .filter(|s| s.start_time > window_start && s.start_time <= window_end)
    {
        for movement in &session.movements {
            let Some(definition) = catalog.movement(movement.movement_id) else {
                continue;
            };
            let Some(lift) = benchmark_key(&definition.name) else {
                continue;
            };
            let best = movement
                .sets
                .iter()
                .filter(|s| s.is_working())
                .map(|s| e1rm(s.weight, s.reps))
                .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.max(v))));
            if let Some(best) = best {
                let entry = best_by_lift.entry(lift).or_insert(0.0);
                if best > *entry {
                    *entry = best;
                }
            }
        }
    }

    if best_by_lift.is_empty() {
        return None;
    }
    Some(best_by_lift.values().sum::<f64>() / best_by_lift.len() as f64)
}

/// Map a movement name onto one of the four benchmark lifts, if any
fn benchmark_key(movement_name: &str) -> Option<&'static str> {
    let name = movement_name.to_lowercase();
    BENCHMARK_ALIASES
        .iter()
        .find(|(needle, _)| name.contains(needle))
        .map(|(_, key)| *key)
}

// ============================================================================
// Per-movement history
// ============================================================================

/// Summarize the completed history of one movement, optionally narrowed to
/// a single variant.
///
/// All-time PR and best-e1RM ties break to the earliest session date:
/// sessions are scanned in ascending start-time order and a record is only
/// replaced on a strictly greater value.
pub fn exercise_history(
    movement_id: Uuid,
    variant_id: Option<Uuid>,
    sessions: &[WorkoutSession],
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> ExerciseHistorySummary {
    let mut qualifying: Vec<&WorkoutSession> = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Completed)
        .collect();
    qualifying.sort_by_key(|s| s.start_time);

    let recent_cutoff = now - fourteen_days();
    let mut best_set_by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut volume_series: Vec<ChartPoint> = Vec::new();
    let mut all_time_pr: Option<ExerciseRecord> = None;
    let mut best_e1rm: Option<ExerciseRecord> = None;
    let mut recent_weights: Vec<f64> = Vec::new();
    let mut set_logs: Vec<SetLogEntry> = Vec::new();

    for session in qualifying {
        let session_date = session.start_time;
        let working: Vec<&PerformedSet> = session
            .movements
            .iter()
            .filter(|m| {
                m.movement_id == movement_id
                    && variant_id.map_or(true, |v| m.selected_variant_id == Some(v))
            })
            .flat_map(|m| m.sets.iter())
            .filter(|s| s.is_working())
            .collect();

        if working.is_empty() {
            continue;
        }

        let day = session_date.date_naive();
        let max_weight = working.iter().map(|s| s.weight).fold(0.0, f64::max);
        let day_best = best_set_by_day.entry(day).or_insert(0.0);
        if max_weight > *day_best {
            *day_best = max_weight;
        }

        let session_volume: f64 = working.iter().map(|s| s.weight * f64::from(s.reps)).sum();
        volume_series.push(ChartPoint {
            date: session_date,
            value: session_volume,
        });

        let title = catalog.session_title(session);
        for set in working {
            set_logs.push(SetLogEntry {
                date: session_date,
                workout_name: title.clone(),
                set_index: set.set_index,
                reps: set.reps,
                weight: set.weight,
            });

            if all_time_pr.map_or(true, |pr| set.weight > pr.value) {
                all_time_pr = Some(ExerciseRecord {
                    value: set.weight,
                    date: session_date,
                });
            }

            let estimated = e1rm(set.weight, set.reps);
            if best_e1rm.map_or(true, |record| estimated > record.value) {
                best_e1rm = Some(ExerciseRecord {
                    value: estimated,
                    date: session_date,
                });
            }

            if session_date >= recent_cutoff {
                recent_weights.push(set.weight);
            }
        }
    }

    let best_set_series = best_set_by_day
        .into_iter()
        .map(|(day, value)| ChartPoint {
            date: day.and_time(NaiveTime::MIN).and_utc(),
            value,
        })
        .collect();

    let recent_average_weight = if recent_weights.is_empty() {
        None
    } else {
        Some(recent_weights.iter().sum::<f64>() / recent_weights.len() as f64)
    };

    // Sessions were walked ascending; the log reads most recent first.
    set_logs.sort_by(|a, b| b.date.cmp(&a.date));

    ExerciseHistorySummary {
        best_set_series,
        volume_series,
        all_time_pr,
        best_e1rm,
        recent_average_weight,
        set_logs,
    }
}

/// The distinct (movement, variant) pairs with at least one working set in
/// completed history, sorted by display name case-insensitively.
pub fn exercise_history_entries(
    sessions: &[WorkoutSession],
    catalog: &Catalog,
) -> Vec<ExerciseHistoryEntry> {
    let mut entries: HashMap<(Uuid, Option<Uuid>), ExerciseHistoryEntry> = HashMap::new();

    for session in sessions.iter().filter(|s| s.status == SessionStatus::Completed) {
        for item in &session.movements {
            if !item.sets.iter().any(|s| s.is_working()) {
                continue;
            }
            let Some(movement) = catalog.movement(item.movement_id) else {
                continue;
            };
            let variant = item
                .selected_variant_id
                .and_then(|id| movement.variant(id));
            let key = (movement.id, variant.map(|v| v.id));
            entries.entry(key).or_insert_with(|| ExerciseHistoryEntry {
                movement_id: movement.id,
                variant_id: variant.map(|v| v.id),
                display_name: match variant {
                    Some(v) => format!("{} {}", v.name, movement.name),
                    None => movement.name.clone(),
                },
            });
        }
    }

    let mut sorted: Vec<ExerciseHistoryEntry> = entries.into_values().collect();
    sorted.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
    });
    sorted
}
