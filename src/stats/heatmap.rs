use chrono::{Duration, NaiveDate, TimeZone};
use serde::Serialize;

use crate::db::TaskRecord;

use super::minutes_by_date;

/// Fifteen weeks, the span of the consistency map.
pub const HEATMAP_DAYS: u32 = 105;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Intensity {
    None,
    Low,
    Medium,
    High,
    Peak,
}

impl Intensity {
    pub fn from_minutes(minutes: u64) -> Self {
        match minutes {
            0 => Intensity::None,
            1..=29 => Intensity::Low,
            30..=59 => Intensity::Medium,
            60..=119 => Intensity::High,
            _ => Intensity::Peak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub minutes: u64,
    pub intensity: Intensity,
}

/// One cell per day for the `days` days ending on `today`, oldest first.
/// Use `.chunks(7)` on the result for week columns.
pub fn activity_heatmap<Tz: TimeZone>(
    tasks: &[TaskRecord],
    today: NaiveDate,
    days: u32,
    tz: &Tz,
) -> Vec<HeatmapCell> {
    let totals = minutes_by_date(tasks, tz);

    (0..i64::from(days))
        .rev()
        .filter_map(|offset| today.checked_sub_signed(Duration::days(offset)))
        .map(|date| {
            let minutes = totals.get(&date).copied().unwrap_or(0);
            HeatmapCell {
                date,
                minutes,
                intensity: Intensity::from_minutes(minutes),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    fn completed_on(date: NaiveDate, minutes: u32, completed: bool) -> TaskRecord {
        let at = date.and_hms_opt(9, 0, 0).unwrap().and_utc();
        TaskRecord {
            id: format!("{date}-{minutes}"),
            name: "work".into(),
            duration_minutes: minutes,
            is_completed: completed,
            date: at.timestamp_millis(),
            owner_id: "u1".into(),
        }
    }

    #[test]
    fn intensity_thresholds() {
        assert_eq!(Intensity::from_minutes(0), Intensity::None);
        assert_eq!(Intensity::from_minutes(29), Intensity::Low);
        assert_eq!(Intensity::from_minutes(30), Intensity::Medium);
        assert_eq!(Intensity::from_minutes(60), Intensity::High);
        assert_eq!(Intensity::from_minutes(119), Intensity::High);
        assert_eq!(Intensity::from_minutes(120), Intensity::Peak);
    }

    #[test]
    fn covers_requested_span_oldest_first() {
        let cells = activity_heatmap(&[], today(), HEATMAP_DAYS, &Utc);

        assert_eq!(cells.len(), HEATMAP_DAYS as usize);
        assert_eq!(cells.last().unwrap().date, today());
        assert_eq!(cells[0].date, today() - Duration::days(104));
        assert_eq!(cells.chunks(7).count(), 15);
    }

    #[test]
    fn sums_completed_minutes_per_day() {
        let yesterday = today() - Duration::days(1);
        let tasks = vec![
            completed_on(yesterday, 20, true),
            completed_on(yesterday, 25, true),
            completed_on(yesterday, 90, false),
            completed_on(today(), 150, true),
        ];
        let cells = activity_heatmap(&tasks, today(), 3, &Utc);

        assert_eq!(cells[0].minutes, 0);
        assert_eq!(cells[1].minutes, 45);
        assert_eq!(cells[1].intensity, Intensity::Medium);
        assert_eq!(cells[2].intensity, Intensity::Peak);
    }
}
