//! Current workout streak.

use crate::activity::ActivityIndex;
use chrono::NaiveDate;

/// Consecutive days with a workout, walking back from `today`
///
/// Today is allowed to be still in progress: with no workout today the
/// run is counted from yesterday instead. If yesterday has none either,
/// the streak is broken.
pub fn current_streak(today: NaiveDate, index: &ActivityIndex) -> u32 {
    let mut cursor = if index.has_workout(today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if index.has_workout(yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while index.has_workout(cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }

    tracing::debug!("Current streak: {} days", streak);
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn run_ending(end: NaiveDate, days: i64) -> Vec<NaiveDate> {
        (0..days).map(|i| end - Duration::days(i)).collect()
    }

    #[test]
    fn test_run_including_today() {
        let today = ymd(2024, 6, 10);
        let index = ActivityIndex::from_dates(run_ending(today, 10), [], [], today);
        assert_eq!(current_streak(today, &index), 10);
    }

    #[test]
    fn test_grace_day_keeps_yesterdays_run() {
        let today = ymd(2024, 6, 10);
        let yesterday = ymd(2024, 6, 9);
        let index = ActivityIndex::from_dates(run_ending(yesterday, 4), [], [], today);
        assert_eq!(current_streak(today, &index), 4);
    }

    #[test]
    fn test_broken_when_neither_today_nor_yesterday() {
        let today = ymd(2024, 6, 6);
        let index = ActivityIndex::from_dates([ymd(2024, 6, 3), ymd(2024, 6, 4)], [], [], today);
        assert_eq!(current_streak(today, &index), 0);
    }

    #[test]
    fn test_gap_stops_the_walk() {
        let today = ymd(2024, 6, 10);
        let mut dates = run_ending(today, 3);
        dates.push(ymd(2024, 6, 6)); // separated by a gap on the 7th
        let index = ActivityIndex::from_dates(dates, [], [], today);
        assert_eq!(current_streak(today, &index), 3);
    }

    #[test]
    fn test_no_history() {
        let today = ymd(2024, 6, 10);
        let index = ActivityIndex::from_dates([], [], [], today);
        assert_eq!(current_streak(today, &index), 0);
    }
}
