//! Workout store persistence with file locking.
//!
//! The store is the single owner of all persisted records: the catalog
//! (movements and templates) and every workout session. It is saved as one
//! JSON document with shared/exclusive locking and an atomic
//! temp-file-then-rename write, so a failed save leaves the previous state
//! on disk untouched.

use crate::catalog::Catalog;
use crate::types::{SessionStatus, WorkoutSession};
use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Everything the engine persists
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorkoutStore {
    pub catalog: Catalog,
    pub sessions: Vec<WorkoutSession>,
}

impl WorkoutStore {
    pub fn session(&self, id: Uuid) -> Option<&WorkoutSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn session_mut(&mut self, id: Uuid) -> Option<&mut WorkoutSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Resolve a session by unambiguous id prefix (for CLI addressing)
    pub fn session_by_prefix(&self, prefix: &str) -> Option<&WorkoutSession> {
        let needle = prefix.to_lowercase();
        let mut matches = self
            .sessions
            .iter()
            .filter(|s| s.id.to_string().starts_with(&needle));
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }

    pub fn in_progress_sessions(&self) -> Vec<&WorkoutSession> {
        self.sessions
            .iter()
            .filter(|s| s.status == SessionStatus::InProgress)
            .collect()
    }

    /// Load the store from a file with shared locking.
    ///
    /// A missing file yields an empty store; a corrupt file is an error.
    /// Training history must never be silently reset.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No store file at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read_result = reader.read_to_string(&mut contents);
        file.unlock()?;
        read_result?;

        let store: WorkoutStore = serde_json::from_str(&contents)
            .map_err(|e| Error::Store(format!("corrupt store file {:?}: {}", path, e)))?;
        tracing::debug!(
            "Loaded store from {:?} ({} sessions)",
            path,
            store.sessions.len()
        );
        Ok(store)
    }

    /// Save the store with exclusive locking.
    ///
    /// Writes to a temp file in the same directory, syncs, then renames
    /// over the original, so readers see either the old state or the new.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved store to {:?} ({} sessions)", path, self.sessions.len());
        Ok(())
    }

    /// Load, modify, save — the all-or-nothing pattern callers should use
    /// for any mutation. If the closure or the save fails, the on-disk
    /// state is unchanged.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut WorkoutStore) -> Result<()>,
    {
        let mut store = Self::load(path)?;
        f(&mut store)?;
        store.save(path)?;
        Ok(store)
    }
}
