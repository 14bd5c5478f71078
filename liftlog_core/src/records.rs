//! Session lifecycle transitions and personal-record detection.
//!
//! `finish_session` is the only place PR flags are written: it runs exactly
//! once, at the in-progress -> completed transition, comparing the finishing
//! session's sets against the best weight per variant seen in *other*
//! completed sessions. Cancelled and in-progress history never counts.

use crate::types::{SessionStatus, WorkoutSession};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Complete a session: stamp the end time, record the whole-second duration
/// and run the personal-record pass in one unit.
///
/// No-op when the session is not in progress; the transition happens at
/// most once.
pub fn finish_session(
    session: &mut WorkoutSession,
    history: &[WorkoutSession],
    now: DateTime<Utc>,
) {
    if session.status != SessionStatus::InProgress {
        tracing::warn!(
            "Ignoring finish of session {} in state {:?}",
            session.id,
            session.status
        );
        return;
    }

    session.end_time = Some(now);
    session.duration_seconds = (now - session.start_time).num_seconds().max(0);
    session.status = SessionStatus::Completed;
    update_personal_records(session, history);

    tracing::info!(
        "Finished session {} ({}s, {} PRs)",
        session.id,
        session.duration_seconds,
        session.personal_record_count()
    );
}

/// Cancel a session: stamp the end time, no PR work.
pub fn cancel_session(session: &mut WorkoutSession, now: DateTime<Utc>) {
    if session.status != SessionStatus::InProgress {
        tracing::warn!(
            "Ignoring cancel of session {} in state {:?}",
            session.id,
            session.status
        );
        return;
    }

    session.end_time = Some(now);
    session.status = SessionStatus::Cancelled;
    tracing::info!("Cancelled session {}", session.id);
}

/// Single deterministic pass over the finishing session.
///
/// The best-weight-per-variant map is seeded from working sets of other
/// completed sessions, then the finishing session's sets are walked in
/// stored order: strictly beating the running best marks a PR and raises
/// the bar, so two sets in one session can both be PRs only if each beats
/// the weight before it.
fn update_personal_records(session: &mut WorkoutSession, history: &[WorkoutSession]) {
    let mut best_by_variant: HashMap<Uuid, f64> = HashMap::new();

    for other in history
        .iter()
        .filter(|s| s.status == SessionStatus::Completed && s.id != session.id)
    {
        for movement in &other.movements {
            let Some(variant_id) = movement.selected_variant_id else {
                continue;
            };
            for set in movement.sets.iter().filter(|s| s.is_working()) {
                let best = best_by_variant.entry(variant_id).or_insert(0.0);
                if set.weight > *best {
                    *best = set.weight;
                }
            }
        }
    }

    for movement in &mut session.movements {
        let variant_id = movement.selected_variant_id;
        for set in &mut movement.sets {
            let Some(variant_id) = variant_id else {
                set.is_pr = false;
                continue;
            };
            if !set.is_working() {
                set.is_pr = false;
                continue;
            }
            let best = best_by_variant.entry(variant_id).or_insert(0.0);
            if set.weight > *best {
                set.is_pr = true;
                *best = set.weight;
            } else {
                set.is_pr = false;
            }
        }
    }
}
