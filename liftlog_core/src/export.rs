//! CSV rollup of journaled sessions.
//!
//! Converts the append-only journal into one summary row per finished
//! session and archives the journal atomically: the CSV is fsynced before
//! the journal is renamed, and the journal is renamed (not deleted) so a
//! botched rollup can be recovered by hand.

use crate::catalog::Catalog;
use crate::types::WorkoutSession;
use crate::Result;
use std::fs::OpenOptions;
use std::path::Path;

/// One summary row per session in the CSV archive
#[derive(Debug, serde::Serialize)]
struct SummaryRow {
    id: String,
    title: String,
    started_at: String,
    ended_at: Option<String>,
    duration_seconds: i64,
    status: String,
    movements: usize,
    working_sets: usize,
    volume: f64,
    personal_records: usize,
}

impl SummaryRow {
    fn from_session(session: &WorkoutSession, catalog: &Catalog) -> Self {
        let working: Vec<_> = session
            .movements
            .iter()
            .flat_map(|m| m.sets.iter())
            .filter(|s| s.is_working())
            .collect();
        let volume = working.iter().map(|s| s.weight * f64::from(s.reps)).sum();

        SummaryRow {
            id: session.id.to_string(),
            title: catalog.session_title(session),
            started_at: session.start_time.to_rfc3339(),
            ended_at: session.end_time.map(|t| t.to_rfc3339()),
            duration_seconds: session.duration_seconds,
            status: format!("{:?}", session.status).to_lowercase(),
            movements: session.movements.len(),
            working_sets: working.len(),
            volume,
            personal_records: session.personal_record_count(),
        }
    }
}

/// Roll up journaled sessions into the CSV archive, then rename the
/// journal to `.processed`. Returns the number of sessions written.
pub fn journal_to_csv_and_archive(
    journal_path: &Path,
    csv_path: &Path,
    catalog: &Catalog,
) -> Result<usize> {
    let sessions = crate::journal::read_sessions(journal_path)?;

    if sessions.is_empty() {
        tracing::info!("No sessions in journal to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for session in &sessions {
        writer.serialize(SummaryRow::from_session(session, catalog))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} session summaries to CSV", sessions.len());

    let processed_path = journal_path.with_extension("jsonl.processed");
    std::fs::rename(journal_path, &processed_path)?;
    tracing::info!("Archived journal to {:?}", processed_path);

    Ok(sessions.len())
}

/// Remove all `.processed` journal archives in the given directory
pub fn cleanup_processed_journals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed journal: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed journals", count);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_catalog;
    use crate::journal::{JsonlSink, SessionSink};
    use crate::types::{PerformedSet, SessionMovement, SessionStatus};
    use chrono::Utc;
    use std::fs::File;
    use uuid::Uuid;

    fn finished_session(catalog: &Catalog) -> WorkoutSession {
        let squat = catalog.movement_by_name("Squat").unwrap();
        let mut session = WorkoutSession::new(None, Utc::now());
        session.status = SessionStatus::Completed;
        session.end_time = Some(Utc::now());
        session.duration_seconds = 1800;
        session.movements.push(SessionMovement {
            id: Uuid::new_v4(),
            movement_id: squat.id,
            selected_variant_id: squat.variants.first().map(|v| v.id),
            ordering_index: 1,
            target_set_count: 1,
            sets: vec![PerformedSet {
                reps: 5,
                weight: 100.0,
                ..PerformedSet::empty(1, Utc::now())
            }],
            notes: None,
        });
        session
    }

    #[test]
    fn test_rollup_writes_and_archives() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("sessions.jsonl");
        let csv_path = temp_dir.path().join("sessions.csv");
        let catalog = seed_catalog();

        let mut sink = JsonlSink::new(&journal_path);
        for _ in 0..3 {
            sink.append(&finished_session(&catalog)).unwrap();
        }

        let count = journal_to_csv_and_archive(&journal_path, &csv_path, &catalog).unwrap();
        assert_eq!(count, 3);
        assert!(csv_path.exists());
        assert!(!journal_path.exists());
        assert!(journal_path.with_extension("jsonl.processed").exists());

        let contents = std::fs::read_to_string(&csv_path).unwrap();
        assert!(contents.contains("Custom Workout"));
        assert!(contents.contains("500"));
    }

    #[test]
    fn test_rollup_appends_without_duplicate_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("sessions.jsonl");
        let csv_path = temp_dir.path().join("sessions.csv");
        let catalog = seed_catalog();

        let mut sink = JsonlSink::new(&journal_path);
        sink.append(&finished_session(&catalog)).unwrap();
        journal_to_csv_and_archive(&journal_path, &csv_path, &catalog).unwrap();

        let mut sink = JsonlSink::new(&journal_path);
        sink.append(&finished_session(&catalog)).unwrap();
        journal_to_csv_and_archive(&journal_path, &csv_path, &catalog).unwrap();

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 2);
    }

    #[test]
    fn test_empty_journal_rolls_up_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("empty.jsonl");
        let csv_path = temp_dir.path().join("sessions.csv");
        File::create(&journal_path).unwrap();

        let count =
            journal_to_csv_and_archive(&journal_path, &csv_path, &seed_catalog()).unwrap();
        assert_eq!(count, 0);
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_cleanup_processed_journals() {
        let temp_dir = tempfile::tempdir().unwrap();
        File::create(temp_dir.path().join("a.jsonl.processed")).unwrap();
        File::create(temp_dir.path().join("b.jsonl.processed")).unwrap();
        File::create(temp_dir.path().join("keep.jsonl")).unwrap();

        let count = cleanup_processed_journals(temp_dir.path()).unwrap();
        assert_eq!(count, 2);
        assert!(temp_dir.path().join("keep.jsonl").exists());
    }
}
