//! Session builder: expands templates (or prior sessions) into fresh
//! in-progress sessions with ordered movements, chosen variants and empty
//! target sets.
//!
//! Dangling references are never fatal here: a template item whose movement
//! has been deleted is skipped and the rest of the expansion proceeds.

use crate::catalog::Catalog;
use crate::recommend::recommend_variant;
use crate::types::{
    Movement, PerformedSet, SessionMovement, WorkoutSession, WorkoutTemplate,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Create a new in-progress session, expanding the template when given.
///
/// Template items are walked in ascending ordering index; each item is
/// repeated `quantity` times (minimum 1), producing session movements with
/// strictly increasing ordering indices starting at 1. The item's preferred
/// variant wins when it still belongs to the movement, otherwise the
/// recommender picks from `history`.
pub fn create_session(
    catalog: &Catalog,
    history: &[WorkoutSession],
    template: Option<&WorkoutTemplate>,
    now: DateTime<Utc>,
) -> WorkoutSession {
    let mut session = WorkoutSession::new(template.map(|t| t.id), now);

    if let Some(template) = template {
        let mut ordering_index = 0;
        for item in template.sorted_items() {
            let Some(movement) = catalog.movement(item.movement_id) else {
                tracing::warn!(
                    "Template '{}' item references missing movement {}, skipping",
                    template.name,
                    item.movement_id
                );
                continue;
            };

            let count = item.quantity.max(1);
            for _ in 0..count {
                ordering_index += 1;
                let target_sets = item.target_sets.unwrap_or(movement.default_set_count);
                let preferred = item
                    .default_variant_id
                    .filter(|id| movement.variant(*id).is_some());
                let session_movement = build_session_movement(
                    movement,
                    target_sets,
                    ordering_index,
                    preferred,
                    history,
                    now,
                );
                session.movements.push(session_movement);
            }
        }
        tracing::info!(
            "Created session {} from template '{}' with {} movements",
            session.id,
            template.name,
            session.movements.len()
        );
    } else {
        tracing::info!("Created empty session {}", session.id);
    }

    session
}

/// Repeat a prior session: same movements in order, same variants and
/// target set counts, fresh empty sets and a new start time. The
/// recommender is not consulted.
pub fn duplicate_session(
    catalog: &Catalog,
    source: &WorkoutSession,
    now: DateTime<Utc>,
) -> WorkoutSession {
    let mut session = WorkoutSession::new(source.template_id, now);

    let mut ordering_index = 0;
    for item in source.ordered_movements() {
        if catalog.movement(item.movement_id).is_none() {
            tracing::warn!(
                "Session {} movement references missing movement {}, skipping",
                source.id,
                item.movement_id
            );
            continue;
        }
        ordering_index += 1;
        session.movements.push(SessionMovement {
            id: Uuid::new_v4(),
            movement_id: item.movement_id,
            selected_variant_id: item.selected_variant_id,
            ordering_index,
            target_set_count: item.target_set_count.max(1),
            sets: empty_sets(item.target_set_count.max(1), now),
            notes: None,
        });
    }

    tracing::info!(
        "Duplicated session {} as {} ({} movements)",
        source.id,
        session.id,
        session.movements.len()
    );
    session
}

/// Append a single movement at the next ordering index, with a recommended
/// variant and pre-populated empty sets. Returns the new session movement.
pub fn add_movement<'a>(
    session: &'a mut WorkoutSession,
    movement: &Movement,
    target_sets: Option<i32>,
    history: &[WorkoutSession],
    now: DateTime<Utc>,
) -> &'a SessionMovement {
    let next_index = session
        .movements
        .iter()
        .map(|m| m.ordering_index)
        .max()
        .unwrap_or(0)
        + 1;
    let target = target_sets.unwrap_or(movement.default_set_count);
    let session_movement =
        build_session_movement(movement, target, next_index, None, history, now);

    tracing::debug!(
        "Added '{}' to session {} at index {}",
        movement.name,
        session.id,
        next_index
    );

    let slot = session.movements.len();
    session.movements.push(session_movement);
    &session.movements[slot]
}

fn build_session_movement(
    movement: &Movement,
    target_sets: i32,
    ordering_index: i32,
    selected_variant: Option<Uuid>,
    history: &[WorkoutSession],
    now: DateTime<Utc>,
) -> SessionMovement {
    let variant = selected_variant
        .or_else(|| recommend_variant(movement, history).map(|v| v.id));
    let target = target_sets.max(1);
    SessionMovement {
        id: Uuid::new_v4(),
        movement_id: movement.id,
        selected_variant_id: variant,
        ordering_index,
        target_set_count: target,
        sets: empty_sets(target, now),
        notes: None,
    }
}

fn empty_sets(count: i32, now: DateTime<Utc>) -> Vec<PerformedSet> {
    (1..=count).map(|index| PerformedSet::empty(index, now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_catalog;
    use crate::types::{SessionStatus, TemplateItem};

    #[test]
    fn test_create_session_without_template() {
        let catalog = seed_catalog();
        let session = create_session(&catalog, &[], None, Utc::now());

        assert_eq!(session.status, SessionStatus::InProgress);
        assert!(session.template_id.is_none());
        assert!(session.movements.is_empty());
        assert!(session.end_time.is_none());
    }

    #[test]
    fn test_template_expansion_orders_and_populates() {
        let catalog = seed_catalog();
        let push = catalog.template_by_name("PUSH").unwrap();

        let session = create_session(&catalog, &[], Some(push), Utc::now());

        assert_eq!(session.template_id, Some(push.id));
        assert_eq!(session.movements.len(), 4);
        let indices: Vec<i32> = session.movements.iter().map(|m| m.ordering_index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);

        for movement in &session.movements {
            assert_eq!(movement.sets.len(), movement.target_set_count as usize);
            let set_indices: Vec<i32> = movement.sets.iter().map(|s| s.set_index).collect();
            let expected: Vec<i32> = (1..=movement.target_set_count).collect();
            assert_eq!(set_indices, expected);
            assert!(movement.sets.iter().all(|s| s.reps == 0 && s.weight == 0.0));
            // Every seeded movement has variants, so one must be chosen
            assert!(movement.selected_variant_id.is_some());
        }
    }

    #[test]
    fn test_quantity_repeats_movement() {
        let mut catalog = seed_catalog();
        let squat_id = catalog.movement_by_name("Squat").unwrap().id;
        let template = catalog.templates.values_mut().next().unwrap();
        template.items = vec![TemplateItem {
            id: Uuid::new_v4(),
            movement_id: squat_id,
            default_variant_id: None,
            quantity: 3,
            target_sets: None,
            ordering_index: 0,
        }];
        let template = template.clone();

        let session = create_session(&catalog, &[], Some(&template), Utc::now());

        assert_eq!(session.movements.len(), 3);
        assert!(session.movements.iter().all(|m| m.movement_id == squat_id));
        let indices: Vec<i32> = session.movements.iter().map(|m| m.ordering_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_quantity_and_target_override() {
        let mut catalog = seed_catalog();
        let bench_id = catalog.movement_by_name("Bench Press").unwrap().id;
        let template = catalog.templates.values_mut().next().unwrap();
        template.items = vec![TemplateItem {
            id: Uuid::new_v4(),
            movement_id: bench_id,
            default_variant_id: None,
            quantity: 2,
            target_sets: Some(4),
            ordering_index: 0,
        }];
        let template = template.clone();

        let session = create_session(&catalog, &[], Some(&template), Utc::now());

        assert_eq!(session.movements.len(), 2);
        for movement in &session.movements {
            assert_eq!(movement.target_set_count, 4);
            assert_eq!(movement.sets.len(), 4);
        }
    }

    #[test]
    fn test_dangling_template_item_is_skipped() {
        let mut catalog = seed_catalog();
        let bench_id = catalog.movement_by_name("Bench Press").unwrap().id;
        let template = catalog.templates.values_mut().next().unwrap();
        template.items = vec![
            TemplateItem {
                id: Uuid::new_v4(),
                movement_id: Uuid::new_v4(), // deleted movement
                default_variant_id: None,
                quantity: 1,
                target_sets: None,
                ordering_index: 0,
            },
            TemplateItem {
                id: Uuid::new_v4(),
                movement_id: bench_id,
                default_variant_id: None,
                quantity: 1,
                target_sets: None,
                ordering_index: 1,
            },
        ];
        let template = template.clone();

        let session = create_session(&catalog, &[], Some(&template), Utc::now());

        assert_eq!(session.movements.len(), 1);
        assert_eq!(session.movements[0].movement_id, bench_id);
        assert_eq!(session.movements[0].ordering_index, 1);
    }

    #[test]
    fn test_negative_quantity_clamped_to_one() {
        let mut catalog = seed_catalog();
        let bench_id = catalog.movement_by_name("Bench Press").unwrap().id;
        let template = catalog.templates.values_mut().next().unwrap();
        template.items = vec![TemplateItem {
            id: Uuid::new_v4(),
            movement_id: bench_id,
            default_variant_id: None,
            quantity: -2,
            target_sets: Some(0),
            ordering_index: 0,
        }];
        let template = template.clone();

        let session = create_session(&catalog, &[], Some(&template), Utc::now());

        assert_eq!(session.movements.len(), 1);
        assert_eq!(session.movements[0].target_set_count, 1);
        assert_eq!(session.movements[0].sets.len(), 1);
    }

    #[test]
    fn test_preferred_variant_wins_over_recommender() {
        let mut catalog = seed_catalog();
        let bench = catalog.movement_by_name("Bench Press").unwrap();
        let bench_id = bench.id;
        // Not the first in name order, so the recommender would not pick it
        // for an empty history.
        let machine = bench.variants.iter().find(|v| v.name == "Machine").unwrap().id;
        let template = catalog.templates.values_mut().next().unwrap();
        template.items = vec![TemplateItem {
            id: Uuid::new_v4(),
            movement_id: bench_id,
            default_variant_id: Some(machine),
            quantity: 1,
            target_sets: None,
            ordering_index: 0,
        }];
        let template = template.clone();

        let session = create_session(&catalog, &[], Some(&template), Utc::now());
        assert_eq!(session.movements[0].selected_variant_id, Some(machine));
    }

    #[test]
    fn test_duplicate_preserves_variants_and_targets() {
        let catalog = seed_catalog();
        let push = catalog.template_by_name("PUSH").unwrap();
        let mut source = create_session(&catalog, &[], Some(push), Utc::now());
        source.movements[0].target_set_count = 5;
        let kept_variant = source.movements[0].selected_variant_id;

        let copy = duplicate_session(&catalog, &source, Utc::now());

        assert_eq!(copy.status, SessionStatus::InProgress);
        assert_eq!(copy.movements.len(), source.movements.len());
        assert_eq!(copy.movements[0].selected_variant_id, kept_variant);
        assert_eq!(copy.movements[0].target_set_count, 5);
        assert_eq!(copy.movements[0].sets.len(), 5);
        assert_ne!(copy.id, source.id);
    }

    #[test]
    fn test_add_movement_appends_at_next_index() {
        let catalog = seed_catalog();
        let push = catalog.template_by_name("PUSH").unwrap();
        let squat = catalog.movement_by_name("Squat").unwrap();
        let mut session = create_session(&catalog, &[], Some(push), Utc::now());

        let added = add_movement(&mut session, squat, None, &[], Utc::now());

        assert_eq!(added.ordering_index, 5);
        assert_eq!(added.target_set_count, squat.default_set_count);
        assert_eq!(added.sets.len(), squat.default_set_count as usize);
    }

    #[test]
    fn test_add_movement_to_empty_session_starts_at_one() {
        let catalog = seed_catalog();
        let squat = catalog.movement_by_name("Squat").unwrap();
        let mut session = create_session(&catalog, &[], None, Utc::now());

        let added = add_movement(&mut session, squat, Some(2), &[], Utc::now());

        assert_eq!(added.ordering_index, 1);
        assert_eq!(added.target_set_count, 2);
    }
}
