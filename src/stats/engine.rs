use std::cmp::Ordering;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

use crate::db::TaskRecord;

use super::{completed_dates, current_streak, minutes_by_date};

/// Flat reward for every completed task.
pub const POINTS_PER_TASK: u64 = 10;

/// Completed tasks stay on the active list for this long after creation.
pub const ACTIVE_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    /// Incomplete tasks plus tasks completed within the active window,
    /// newest first. Focus-session records are never listed.
    pub active: Vec<TaskRecord>,
    /// Completed tasks older than the active window, newest first.
    pub history: Vec<TaskRecord>,
    pub total_points: u64,
    pub today_minutes: u64,
    pub streak: u32,
}

/// [`compute_derived_in`] bucketed by the machine's local time zone.
pub fn compute_derived(tasks: &[TaskRecord], now: DateTime<Utc>) -> DerivedStats {
    compute_derived_in(tasks, now, &Local)
}

pub fn compute_derived_in<Tz: TimeZone>(
    tasks: &[TaskRecord],
    now: DateTime<Utc>,
    tz: &Tz,
) -> DerivedStats {
    let now_ms = now.timestamp_millis();
    let today = now.with_timezone(tz).date_naive();

    let mut active = Vec::new();
    let mut history = Vec::new();
    for task in tasks.iter().filter(|task| !task.is_focus_session()) {
        let age_ms = now_ms.saturating_sub(task.date);
        if !task.is_completed || age_ms <= ACTIVE_WINDOW_MS {
            active.push(task.clone());
        } else {
            history.push(task.clone());
        }
    }
    active.sort_by(newest_first);
    history.sort_by(newest_first);

    let completed = tasks.iter().filter(|task| task.is_completed).count() as u64;
    let today_minutes = minutes_by_date(tasks, tz)
        .get(&today)
        .copied()
        .unwrap_or(0);
    let streak = current_streak(&completed_dates(tasks, tz), today);

    DerivedStats {
        active,
        history,
        total_points: completed * POINTS_PER_TASK,
        today_minutes,
        streak,
    }
}

fn newest_first(a: &TaskRecord, b: &TaskRecord) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id))
}
