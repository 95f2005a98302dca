//! Derived views over an owner's complete task set.
//!
//! Everything here is a pure function of the tasks, the current instant and a
//! time zone. Nothing is cached between calls, so re-running on every store
//! snapshot is always safe.

pub mod badges;
pub mod engine;
pub mod heatmap;
pub mod streak;

pub use badges::{badge_progress, Badge, BadgeProgress, BADGES};
pub use engine::{compute_derived, compute_derived_in, DerivedStats, ACTIVE_WINDOW_MS, POINTS_PER_TASK};
pub use heatmap::{activity_heatmap, HeatmapCell, Intensity, HEATMAP_DAYS};
pub use streak::current_streak;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, TimeZone, Utc};

use crate::db::TaskRecord;

/// Calendar date of a task's creation in `tz`. `None` for timestamps chrono
/// cannot represent; such tasks still count toward points.
pub(crate) fn local_date<Tz: TimeZone>(task: &TaskRecord, tz: &Tz) -> Option<NaiveDate> {
    Utc.timestamp_millis_opt(task.date)
        .single()
        .map(|instant| instant.with_timezone(tz).date_naive())
}

pub(crate) fn completed_dates<Tz: TimeZone>(tasks: &[TaskRecord], tz: &Tz) -> BTreeSet<NaiveDate> {
    tasks
        .iter()
        .filter(|task| task.is_completed)
        .filter_map(|task| local_date(task, tz))
        .collect()
}

/// Completed minutes per calendar date.
pub(crate) fn minutes_by_date<Tz: TimeZone>(
    tasks: &[TaskRecord],
    tz: &Tz,
) -> BTreeMap<NaiveDate, u64> {
    let mut totals = BTreeMap::new();
    for task in tasks.iter().filter(|task| task.is_completed) {
        if let Some(date) = local_date(task, tz) {
            *totals.entry(date).or_insert(0u64) += u64::from(task.duration_minutes);
        }
    }
    totals
}
