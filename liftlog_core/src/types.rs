//! Core domain types for the Liftlog system.
//!
//! This module defines the records the engine operates over:
//! - Movements and their equipment variants
//! - Workout templates and their items
//! - Workout sessions, session movements and performed sets
//!
//! Ownership runs strictly downward (a session owns its movements, a
//! movement owns its sets); every cross-entity link is a plain [`Uuid`]
//! resolved through the catalog, never an owning reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Movement Types
// ============================================================================

/// How resistance is applied and counted for an equipment variant
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResistanceType {
    PerDumbbell,
    TotalWeight,
    CableStack,
    Bodyweight,
    Assisted,
}

impl ResistanceType {
    pub fn display_name(&self) -> &'static str {
        match self {
            ResistanceType::PerDumbbell => "Per Dumbbell",
            ResistanceType::TotalWeight => "Total Weight",
            ResistanceType::CableStack => "Cable Stack",
            ResistanceType::Bodyweight => "Bodyweight",
            ResistanceType::Assisted => "Assisted",
        }
    }

    pub fn weight_label(&self) -> &'static str {
        match self {
            ResistanceType::PerDumbbell => "Weight per dumbbell",
            ResistanceType::TotalWeight => "Total weight",
            ResistanceType::CableStack => "Stack weight",
            ResistanceType::Bodyweight => "Bodyweight",
            ResistanceType::Assisted => "Assistance weight",
        }
    }
}

/// A named equipment/execution mode of a movement (e.g., barbell vs. dumbbell)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MovementVariant {
    pub id: Uuid,
    /// Owning movement, as an identity lookup
    pub movement_id: Uuid,
    pub name: String,
    pub resistance_type: ResistanceType,
    pub notes: Option<String>,
}

/// A movement definition (e.g., "Bench Press")
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    /// Unique, case-insensitively
    pub name: String,
    /// Muscle-group label used for volume breakdowns
    pub category: String,
    pub notes: Option<String>,
    pub default_set_count: i32,
    pub variants: Vec<MovementVariant>,
}

impl Movement {
    /// Variants in name order, case-insensitive. This is the canonical
    /// ordering used for recommendation tie-breaks.
    pub fn sorted_variants(&self) -> Vec<&MovementVariant> {
        let mut variants: Vec<&MovementVariant> = self.variants.iter().collect();
        variants.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        variants
    }

    pub fn variant(&self, id: Uuid) -> Option<&MovementVariant> {
        self.variants.iter().find(|v| v.id == id)
    }
}

// ============================================================================
// Template Types
// ============================================================================

/// One entry of a workout template
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemplateItem {
    pub id: Uuid,
    pub movement_id: Uuid,
    /// Preferred variant; when absent the recommender picks one at expansion
    pub default_variant_id: Option<Uuid>,
    /// Repeat this movement N times in the session (clamped to >= 1)
    pub quantity: i32,
    /// Overrides the movement's default set count when present
    pub target_sets: Option<i32>,
    pub ordering_index: i32,
}

/// A reusable workout plan expanded into sessions by the session builder
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<TemplateItem>,
    pub notes: Option<String>,
}

impl WorkoutTemplate {
    pub fn sorted_items(&self) -> Vec<&TemplateItem> {
        let mut items: Vec<&TemplateItem> = self.items.iter().collect();
        items.sort_by_key(|i| i.ordering_index);
        items
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// Lifecycle state of a workout session.
///
/// Transitions only `InProgress -> Completed` or `InProgress -> Cancelled`,
/// each exactly once.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Cancelled,
}

/// One logged set. Weight is always stored in the canonical unit (pounds);
/// display conversion happens outside the engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PerformedSet {
    pub id: Uuid,
    /// 1-based, contiguous within the owning session movement
    pub set_index: i32,
    pub reps: i32,
    pub weight: f64,
    pub is_warmup: bool,
    pub is_pr: bool,
    pub is_completed: bool,
    pub timestamp: DateTime<Utc>,
}

impl PerformedSet {
    pub fn empty(set_index: i32, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            set_index,
            reps: 0,
            weight: 0.0,
            is_warmup: false,
            is_pr: false,
            is_completed: false,
            timestamp,
        }
    }

    /// A working set is the unit of all aggregate analytics: positive reps
    /// and not a warmup. Everything else is a placeholder or warmup and
    /// never contributes to volume, PRs, streaks or trends.
    pub fn is_working(&self) -> bool {
        self.reps > 0 && !self.is_warmup
    }
}

/// One movement slot inside a session, with its chosen variant and sets
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionMovement {
    pub id: Uuid,
    pub movement_id: Uuid,
    /// Chosen by the user or the recommender; mutable while in progress
    pub selected_variant_id: Option<Uuid>,
    pub ordering_index: i32,
    pub target_set_count: i32,
    pub sets: Vec<PerformedSet>,
    pub notes: Option<String>,
}

impl SessionMovement {
    pub fn ordered_sets(&self) -> Vec<&PerformedSet> {
        let mut sets: Vec<&PerformedSet> = self.sets.iter().collect();
        sets.sort_by_key(|s| s.set_index);
        sets
    }

    /// Heaviest set, reps breaking weight ties
    pub fn best_set(&self) -> Option<&PerformedSet> {
        self.sets.iter().max_by(|a, b| {
            a.weight
                .partial_cmp(&b.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.reps.cmp(&b.reps))
        })
    }

    /// Remove the set with the given index and renumber the remainder so
    /// indices stay a contiguous 1..N sequence in display order.
    pub fn remove_set(&mut self, set_index: i32) -> bool {
        let before = self.sets.len();
        self.sets.retain(|s| s.set_index != set_index);
        if self.sets.len() == before {
            return false;
        }
        self.sets.sort_by_key(|s| s.set_index);
        for (position, set) in self.sets.iter_mut().enumerate() {
            set.set_index = position as i32 + 1;
        }
        true
    }
}

/// A logged workout, in progress or finished
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: Uuid,
    /// Template this session was expanded from, if any
    pub template_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    pub status: SessionStatus,
    pub movements: Vec<SessionMovement>,
}

impl WorkoutSession {
    pub fn new(template_id: Option<Uuid>, start_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id,
            start_time,
            end_time: None,
            duration_seconds: 0,
            status: SessionStatus::InProgress,
            movements: Vec::new(),
        }
    }

    pub fn ordered_movements(&self) -> Vec<&SessionMovement> {
        let mut movements: Vec<&SessionMovement> = self.movements.iter().collect();
        movements.sort_by_key(|m| m.ordering_index);
        movements
    }

    pub fn personal_record_count(&self) -> usize {
        self.movements
            .iter()
            .flat_map(|m| m.sets.iter())
            .filter(|s| s.is_pr)
            .count()
    }

    /// When this session was last active: end time if set, else start time.
    /// Used by the recommender as the "most recent use" of a variant.
    pub fn last_activity(&self) -> DateTime<Utc> {
        match self.end_time {
            Some(end) => end.max(self.start_time),
            None => self.start_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(index: i32, reps: i32, weight: f64) -> PerformedSet {
        PerformedSet {
            reps,
            weight,
            ..PerformedSet::empty(index, Utc::now())
        }
    }

    #[test]
    fn test_working_set_predicate() {
        let mut s = set(1, 5, 100.0);
        assert!(s.is_working());

        s.reps = 0;
        assert!(!s.is_working());

        s.reps = 5;
        s.is_warmup = true;
        assert!(!s.is_working());
    }

    #[test]
    fn test_sorted_variants_case_insensitive() {
        let movement_id = Uuid::new_v4();
        let mut movement = Movement {
            id: movement_id,
            name: "Bench Press".into(),
            category: "Chest".into(),
            notes: None,
            default_set_count: 3,
            variants: vec![],
        };
        for name in ["machine", "Barbell", "Dumbbell"] {
            movement.variants.push(MovementVariant {
                id: Uuid::new_v4(),
                movement_id,
                name: name.into(),
                resistance_type: ResistanceType::TotalWeight,
                notes: None,
            });
        }

        let names: Vec<&str> = movement
            .sorted_variants()
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["Barbell", "Dumbbell", "machine"]);
    }

    #[test]
    fn test_remove_set_renumbers() {
        let mut movement = SessionMovement {
            id: Uuid::new_v4(),
            movement_id: Uuid::new_v4(),
            selected_variant_id: None,
            ordering_index: 1,
            target_set_count: 3,
            sets: vec![set(1, 5, 100.0), set(2, 5, 105.0), set(3, 5, 110.0)],
            notes: None,
        };

        assert!(movement.remove_set(2));
        let indices: Vec<i32> = movement.sets.iter().map(|s| s.set_index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(movement.sets[1].weight, 110.0);

        assert!(!movement.remove_set(9));
    }

    #[test]
    fn test_best_set_breaks_weight_ties_by_reps() {
        let movement = SessionMovement {
            id: Uuid::new_v4(),
            movement_id: Uuid::new_v4(),
            selected_variant_id: None,
            ordering_index: 1,
            target_set_count: 2,
            sets: vec![set(1, 8, 100.0), set(2, 5, 100.0)],
            notes: None,
        };

        assert_eq!(movement.best_set().unwrap().reps, 8);
    }

    #[test]
    fn test_last_activity_prefers_end_time() {
        let mut session = WorkoutSession::new(None, Utc::now());
        assert_eq!(session.last_activity(), session.start_time);

        let end = session.start_time + chrono::Duration::hours(1);
        session.end_time = Some(end);
        assert_eq!(session.last_activity(), end);
    }
}
