use std::collections::BTreeSet;

use chrono::NaiveDate;

/// Consecutive days with at least one completed task, ending today, or
/// yesterday if nothing has been completed yet today.
pub fn current_streak(completed_on: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if completed_on.contains(&today) {
        Some(today)
    } else {
        today.pred_opt()
    };

    let mut streak = 0;
    let mut cursor = start;
    while let Some(day) = cursor.filter(|day| completed_on.contains(day)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn days_ago(offsets: &[i64]) -> BTreeSet<NaiveDate> {
        offsets.iter().map(|n| today() - Duration::days(*n)).collect()
    }

    #[test]
    fn counts_back_from_today() {
        assert_eq!(current_streak(&days_ago(&[0, 1, 2]), today()), 3);
        assert_eq!(current_streak(&days_ago(&[0, 1, 2, 4, 5]), today()), 3);
    }

    #[test]
    fn yesterday_keeps_streak_alive() {
        assert_eq!(current_streak(&days_ago(&[1, 2]), today()), 2);
    }

    #[test]
    fn gap_before_yesterday_breaks_it() {
        assert_eq!(current_streak(&days_ago(&[2]), today()), 0);
        assert_eq!(current_streak(&BTreeSet::new(), today()), 0);
    }

    #[test]
    fn only_today_counts_one() {
        assert_eq!(current_streak(&days_ago(&[0]), today()), 1);
    }

    #[test]
    fn crosses_month_and_year_boundaries() {
        let new_year = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: BTreeSet<_> = (0..5).map(|n| new_year - Duration::days(n)).collect();
        assert_eq!(current_streak(&dates, new_year), 5);
    }
}
