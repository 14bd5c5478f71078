//! Consecutive-week training streak.
//!
//! Counts calendar weeks, walking backward from the current one, that
//! contain at least one completed session. The current week having no
//! session means a streak of zero, regardless of history.

use crate::types::{SessionStatus, WorkoutSession};
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};

/// Number of consecutive weeks (current week first) with a completed
/// session. Week boundaries are midnight UTC on `week_start`.
pub fn weekly_streak(sessions: &[WorkoutSession], now: DateTime<Utc>, week_start: Weekday) -> u32 {
    let completed: Vec<DateTime<Utc>> = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Completed)
        .map(|s| s.start_time)
        .collect();
    if completed.is_empty() {
        return 0;
    }

    let today = now.date_naive();
    let days_into_week = (today.weekday().num_days_from_monday() + 7
        - week_start.num_days_from_monday())
        % 7;
    let mut window_start = (today - Duration::days(i64::from(days_into_week)))
        .and_time(NaiveTime::MIN)
        .and_utc();

    let mut streak = 0;
    loop {
        let window_end = window_start + Duration::days(7);
        let has_workout = completed
            .iter()
            .any(|start| *start >= window_start && *start < window_end);
        if !has_workout {
            break;
        }
        streak += 1;
        window_start -= Duration::days(7);
    }

    tracing::debug!("Weekly streak at {}: {}", now, streak);
    streak
}
