//! Least-recently-used equipment variant recommendation.
//!
//! To promote rotation across equipment, the recommender picks the variant
//! of a movement whose most recent use in a *completed* session is earliest.
//! A variant never used in a completed session beats any variant with
//! recorded use; ties fall to the movement's name-sorted variant ordering.

use crate::types::{Movement, MovementVariant, SessionStatus, WorkoutSession};
use chrono::{DateTime, Utc};

/// Recommend a variant for the movement, or `None` iff it has no variants.
///
/// Read-only and deterministic: identical history always yields the same
/// choice.
pub fn recommend_variant<'a>(
    movement: &'a Movement,
    history: &[WorkoutSession],
) -> Option<&'a MovementVariant> {
    let variants = movement.sorted_variants();
    if variants.is_empty() {
        return None;
    }

    let mut best: Option<(&MovementVariant, Option<DateTime<Utc>>)> = None;
    for variant in variants {
        let used = last_used(variant, history);
        // Option orders None before Some, which is exactly the "never used
        // counts as the beginning of time" rule. Strict < keeps the first
        // name-sorted candidate on ties.
        match &best {
            Some((_, best_used)) if used >= *best_used => {}
            _ => best = Some((variant, used)),
        }
    }

    let (choice, used) = best?;
    tracing::debug!(
        "Recommending variant '{}' for '{}' (last used: {:?})",
        choice.name,
        movement.name,
        used
    );
    Some(choice)
}

/// Most recent use of a variant: max(end time, start time) over all
/// completed sessions referencing it. `None` if never used.
fn last_used(variant: &MovementVariant, history: &[WorkoutSession]) -> Option<DateTime<Utc>> {
    history
        .iter()
        .filter(|session| session.status == SessionStatus::Completed)
        .flat_map(|session| {
            session
                .movements
                .iter()
                .filter(|m| m.selected_variant_id == Some(variant.id))
                .map(move |_| session.last_activity())
        })
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResistanceType, SessionMovement};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn movement_with_variants(names: &[&str]) -> Movement {
        let id = Uuid::new_v4();
        Movement {
            id,
            name: "Bench Press".into(),
            category: "Chest".into(),
            notes: None,
            default_set_count: 3,
            variants: names
                .iter()
                .map(|name| MovementVariant {
                    id: Uuid::new_v4(),
                    movement_id: id,
                    name: (*name).into(),
                    resistance_type: ResistanceType::TotalWeight,
                    notes: None,
                })
                .collect(),
        }
    }

    fn session_using(
        movement: &Movement,
        variant_id: Uuid,
        days_ago: i64,
        status: SessionStatus,
    ) -> WorkoutSession {
        let start = Utc::now() - Duration::days(days_ago);
        let mut session = WorkoutSession::new(None, start);
        session.status = status;
        if status != SessionStatus::InProgress {
            session.end_time = Some(start + Duration::hours(1));
        }
        session.movements.push(SessionMovement {
            id: Uuid::new_v4(),
            movement_id: movement.id,
            selected_variant_id: Some(variant_id),
            ordering_index: 1,
            target_set_count: 3,
            sets: vec![],
            notes: None,
        });
        session
    }

    #[test]
    fn test_no_variants_returns_none() {
        let movement = movement_with_variants(&[]);
        assert!(recommend_variant(&movement, &[]).is_none());
    }

    #[test]
    fn test_never_used_beats_recently_used() {
        let movement = movement_with_variants(&["Barbell", "Dumbbell"]);
        let barbell = movement.variants[0].id;

        let history = vec![session_using(&movement, barbell, 10, SessionStatus::Completed)];

        let choice = recommend_variant(&movement, &history).unwrap();
        assert_eq!(choice.name, "Dumbbell");
    }

    #[test]
    fn test_least_recently_used_wins() {
        let movement = movement_with_variants(&["Barbell", "Dumbbell"]);
        let barbell = movement.variants[0].id;
        let dumbbell = movement.variants[1].id;

        let history = vec![
            session_using(&movement, barbell, 2, SessionStatus::Completed),
            session_using(&movement, dumbbell, 9, SessionStatus::Completed),
        ];

        let choice = recommend_variant(&movement, &history).unwrap();
        assert_eq!(choice.name, "Dumbbell");
    }

    #[test]
    fn test_only_completed_sessions_count_as_use() {
        let movement = movement_with_variants(&["Barbell", "Dumbbell"]);
        let barbell = movement.variants[0].id;
        let dumbbell = movement.variants[1].id;

        // Dumbbell's only uses are cancelled/in-progress, so it still
        // counts as never used.
        let history = vec![
            session_using(&movement, barbell, 30, SessionStatus::Completed),
            session_using(&movement, dumbbell, 1, SessionStatus::Cancelled),
            session_using(&movement, dumbbell, 2, SessionStatus::InProgress),
        ];

        let choice = recommend_variant(&movement, &history).unwrap();
        assert_eq!(choice.name, "Dumbbell");
    }

    #[test]
    fn test_all_unused_ties_break_by_name_order() {
        let movement = movement_with_variants(&["Machine", "Barbell", "Dumbbell"]);
        let choice = recommend_variant(&movement, &[]).unwrap();
        assert_eq!(choice.name, "Barbell");
    }

    #[test]
    fn test_recommendation_belongs_to_movement() {
        let movement = movement_with_variants(&["Barbell", "Dumbbell"]);
        let other = movement_with_variants(&["Cable"]);
        let history = vec![session_using(
            &other,
            other.variants[0].id,
            1,
            SessionStatus::Completed,
        )];

        let choice = recommend_variant(&movement, &history).unwrap();
        assert!(movement.variant(choice.id).is_some());
    }
}
