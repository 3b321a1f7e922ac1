//! Fairness-adjusted consistency score.
//!
//! Only weekdays from the user's first workout up to yesterday can count
//! as missed. Weekends and explicitly skipped days never count against
//! the user, and today is still in progress.

use crate::activity::ActivityIndex;
use crate::dates::is_weekday;
use chrono::NaiveDate;
use serde::Serialize;

/// Inputs and result of the consistency calculation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ConsistencyBreakdown {
    /// Distinct workout dates across all time
    pub completed: u32,
    /// Unskipped weekdays without a workout inside the window
    pub missed: u32,
    /// Percentage 0-100
    pub score: u8,
}

/// Count completed and missed days and score them
pub fn consistency_breakdown(today: NaiveDate, index: &ActivityIndex) -> ConsistencyBreakdown {
    let completed = index.workout_day_count() as u32;

    let missed = index
        .earliest()
        .iter_days()
        .take_while(|date| *date < today)
        .filter(|date| is_weekday(*date) && !index.has_workout(*date) && !index.is_skipped(*date))
        .count() as u32;

    let denominator = completed + missed;
    let score = if denominator > 0 {
        (100.0 * completed as f64 / denominator as f64).round() as u8
    } else {
        100
    };

    tracing::debug!(
        "Consistency: {} completed, {} missed since {} -> {}%",
        completed,
        missed,
        index.earliest(),
        score
    );

    ConsistencyBreakdown {
        completed,
        missed,
        score,
    }
}

/// Consistency percentage 0-100
pub fn consistency_score(today: NaiveDate, index: &ActivityIndex) -> u8 {
    consistency_breakdown(today, index).score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Weekdays of two full weeks starting Monday 2024-06-03
    fn two_weeks_of_weekdays() -> Vec<NaiveDate> {
        ymd(2024, 6, 3)
            .iter_days()
            .take(14)
            .filter(|d| is_weekday(*d))
            .collect()
    }

    #[test]
    fn test_perfect_window() {
        let today = ymd(2024, 6, 17);
        let index = ActivityIndex::from_dates(two_weeks_of_weekdays(), [], [], today);
        let b = consistency_breakdown(today, &index);
        assert_eq!(b.completed, 10);
        assert_eq!(b.missed, 0);
        assert_eq!(b.score, 100);
    }

    #[test]
    fn test_eight_of_ten() {
        let today = ymd(2024, 6, 17);
        let mut days = two_weeks_of_weekdays();
        days.retain(|d| *d != ymd(2024, 6, 5) && *d != ymd(2024, 6, 12));
        let index = ActivityIndex::from_dates(days, [], [], today);
        let b = consistency_breakdown(today, &index);
        assert_eq!((b.completed, b.missed, b.score), (8, 2, 80));
    }

    #[test]
    fn test_no_activity_scores_full() {
        let today = ymd(2024, 6, 17);
        let index = ActivityIndex::from_dates([], [], [], today);
        assert_eq!(consistency_score(today, &index), 100);
    }

    #[test]
    fn test_thursday_scenario() {
        let today = ymd(2024, 6, 6);
        let index = ActivityIndex::from_dates([ymd(2024, 6, 3), ymd(2024, 6, 4)], [], [], today);
        let b = consistency_breakdown(today, &index);
        assert_eq!(b.missed, 1);
        assert_eq!(b.score, 67);
    }

    #[test]
    fn test_skips_and_weekends_excluded() {
        // Friday 06-07 workout, skip Monday 06-10, today Wednesday 06-12
        let today = ymd(2024, 6, 12);
        let index = ActivityIndex::from_dates([ymd(2024, 6, 7)], [], [ymd(2024, 6, 10)], today);
        let b = consistency_breakdown(today, &index);
        // only Tuesday 06-11 is missed
        assert_eq!(b.missed, 1);
        assert_eq!(b.score, 50);
    }

    #[test]
    fn test_today_never_counts_as_missed() {
        let today = ymd(2024, 6, 4);
        let index = ActivityIndex::from_dates([ymd(2024, 6, 3)], [], [], today);
        assert_eq!(consistency_breakdown(today, &index).missed, 0);
    }

    #[test]
    fn test_completed_counts_all_time() {
        // weekend workouts count toward completed even though weekends never miss
        let today = ymd(2024, 6, 10);
        let index = ActivityIndex::from_dates([ymd(2024, 6, 8), ymd(2024, 6, 9)], [], [], today);
        let b = consistency_breakdown(today, &index);
        assert_eq!((b.completed, b.missed, b.score), (2, 0, 100));
    }
}
