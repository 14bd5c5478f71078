#![forbid(unsafe_code)]

//! Core domain model and analytics engine for the Liftlog system.
//!
//! This crate provides:
//! - Domain types (movements, variants, templates, sessions, sets)
//! - Catalog management and seed data
//! - Session building (template expansion, duplication)
//! - Variant recommendation (least-recently-used rotation)
//! - Personal-record detection and session lifecycle
//! - Statistics (profile stats, strength trend, exercise history)
//! - Weekly streak calculation
//! - Persistence (store, journal, CSV export)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod builder;
pub mod recommend;
pub mod records;
pub mod stats;
pub mod streak;
pub mod store;
pub mod journal;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{seed_catalog, Catalog};
pub use config::Config;
pub use builder::{add_movement, create_session, duplicate_session};
pub use recommend::recommend_variant;
pub use records::{cancel_session, finish_session};
pub use stats::{
    exercise_history, exercise_history_entries, profile_stats, ExerciseHistorySummary,
    ProfileStats,
};
pub use streak::weekly_streak;
pub use store::WorkoutStore;
pub use journal::{JsonlSink, SessionSink};
