//! Cycle and body-weight reports.

use crate::types::{CheckIn, HistoryEntry};
use chrono::DateTime;
use serde::Serialize;
use std::cmp::Ordering;

/// Reps assumed when a rep scheme has no leading number ("Failure", "Varied")
pub const FALLBACK_REPS: f64 = 10.0;

/// Summary of the training weeks that make up one cycle
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CycleReport {
    pub first_week: u32,
    pub last_week: u32,
    pub workouts: usize,
    /// Sum of load x sets x reps, in kg
    pub total_volume: f64,
}

/// Whether finishing `week` closes a cycle of `cycle_weeks`
pub fn closes_cycle(week: u32, cycle_weeks: u32) -> bool {
    cycle_weeks > 0 && week > 0 && week % cycle_weeks == 0
}

/// Report on weeks `week - cycle_weeks + 1 ..= week`
///
/// Entries without a week number never count.
pub fn cycle_report(history: &[HistoryEntry], week: u32, cycle_weeks: u32) -> CycleReport {
    let first_week = week.saturating_sub(cycle_weeks.saturating_sub(1)).max(1);
    let in_cycle: Vec<&HistoryEntry> = history
        .iter()
        .filter(|h| matches!(h.week_number, Some(w) if w >= first_week && w <= week))
        .collect();

    let total_volume = in_cycle
        .iter()
        .flat_map(|h| h.exercises.iter())
        .map(|ex| ex.weight * f64::from(ex.sets) * rep_value(&ex.reps))
        .sum();

    CycleReport {
        first_week,
        last_week: week,
        workouts: in_cycle.len(),
        total_volume,
    }
}

/// Numeric rep count for a rep scheme
///
/// Ranges ("8-12", "8–12") average their ends; otherwise the leading digits
/// are used, falling back to [`FALLBACK_REPS`].
pub fn rep_value(reps: &str) -> f64 {
    let reps = reps.trim();
    if let Some((low, high)) = reps.split_once(['-', '–']) {
        if let (Some(low), Some(high)) = (leading_number(low), leading_number(high)) {
            return (low + high) / 2.0;
        }
    }
    leading_number(reps).unwrap_or(FALLBACK_REPS)
}

fn leading_number(text: &str) -> Option<f64> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse::<u32>().ok().map(f64::from)
}

/// Direction of body weight against the previous check-in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn symbol(&self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Flat => "–",
        }
    }
}

/// One row of the body-weight log
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeightLogRow<'a> {
    pub date: &'a str,
    pub mood: &'a str,
    pub body_weight: f64,
    /// Change against the next older row, rounded to 0.1 kg
    pub delta: Option<f64>,
    pub trend: Trend,
}

/// Check-ins newest first, by date key then timestamp
pub fn sorted_check_ins(check_ins: &[CheckIn]) -> Vec<&CheckIn> {
    let mut sorted: Vec<&CheckIn> = check_ins.iter().collect();
    sorted.sort_by(|a, b| match display_date(b).cmp(display_date(a)) {
        Ordering::Equal => stamp_millis(b).cmp(&stamp_millis(a)),
        other => other,
    });
    sorted
}

/// Body-weight log, newest first
pub fn weight_log(check_ins: &[CheckIn]) -> Vec<WeightLogRow<'_>> {
    let sorted = sorted_check_ins(check_ins);
    sorted
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let delta = sorted
                .get(i + 1)
                .map(|prev| ((c.body_weight - prev.body_weight) * 10.0).round() / 10.0);
            let trend = match delta {
                Some(d) if d > 0.0 => Trend::Up,
                Some(d) if d < 0.0 => Trend::Down,
                _ => Trend::Flat,
            };
            WeightLogRow {
                date: display_date(c),
                mood: &c.mood,
                body_weight: c.body_weight,
                delta: delta.filter(|d| *d != 0.0),
                trend,
            }
        })
        .collect()
}

/// Most recent check-in
pub fn latest_check_in(check_ins: &[CheckIn]) -> Option<&CheckIn> {
    sorted_check_ins(check_ins).into_iter().next()
}

fn display_date(c: &CheckIn) -> &str {
    c.local_date.as_deref().unwrap_or(&c.date)
}

fn stamp_millis(c: &CheckIn) -> i64 {
    c.timestamp
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.timestamp_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExerciseResult;

    fn entry(week: Option<u32>, weight: f64, reps: &str) -> HistoryEntry {
        HistoryEntry {
            id: format!("h{:?}", week),
            date: "2024-06-03T10:00:00Z".into(),
            local_date: Some("2024-06-03".into()),
            workout_title: "PUSH 1".into(),
            week_number: week,
            rating: None,
            exercises: vec![ExerciseResult {
                name: "Bench".into(),
                weight,
                sets: 3,
                reps: reps.into(),
            }],
        }
    }

    fn check_in(date: &str, stamp: Option<&str>, kg: f64) -> CheckIn {
        CheckIn {
            date: date.into(),
            local_date: Some(date.into()),
            timestamp: stamp.map(Into::into),
            mood: "🔥".into(),
            body_weight: kg,
        }
    }

    #[test]
    fn test_rep_values() {
        assert_eq!(rep_value("8-12"), 10.0);
        assert_eq!(rep_value("6–10"), 8.0);
        assert_eq!(rep_value("10-12 each"), 11.0);
        assert_eq!(rep_value("15"), 15.0);
        assert_eq!(rep_value("12 steps"), 12.0);
        assert_eq!(rep_value("Failure"), FALLBACK_REPS);
        assert_eq!(rep_value("Varied"), FALLBACK_REPS);
    }

    #[test]
    fn test_cycle_report_window() {
        let history = vec![
            entry(Some(4), 100.0, "8-12"),
            entry(Some(2), 50.0, "10"),
            entry(Some(1), 10.0, "10"),
            entry(Some(5), 999.0, "10"),
            entry(None, 999.0, "10"),
        ];
        let report = cycle_report(&history, 4, 4);
        assert_eq!(report.first_week, 1);
        assert_eq!(report.workouts, 3);
        assert_eq!(report.total_volume, 3000.0 + 1500.0 + 300.0);

        let report = cycle_report(&history, 8, 4);
        assert_eq!(report.first_week, 5);
        assert_eq!(report.workouts, 1);
    }

    #[test]
    fn test_closes_cycle() {
        assert!(closes_cycle(4, 4));
        assert!(closes_cycle(8, 4));
        assert!(!closes_cycle(5, 4));
        assert!(!closes_cycle(0, 4));
        assert!(!closes_cycle(4, 0));
    }

    #[test]
    fn test_weight_log_order_and_trend() {
        let check_ins = vec![
            check_in("2024-06-01", None, 86.0),
            check_in("2024-06-03", Some("2024-06-03T07:00:00Z"), 85.0),
            check_in("2024-06-02", None, 85.0),
        ];
        let log = weight_log(&check_ins);
        let dates: Vec<_> = log.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec!["2024-06-03", "2024-06-02", "2024-06-01"]);

        assert_eq!(log[0].trend, Trend::Flat);
        assert_eq!(log[0].delta, None);
        assert_eq!(log[1].trend, Trend::Down);
        assert_eq!(log[1].delta, Some(-1.0));
        assert_eq!(log[2].trend, Trend::Flat);
    }

    #[test]
    fn test_same_date_sorted_by_timestamp() {
        let check_ins = vec![
            check_in("2024-06-03", Some("2024-06-03T07:00:00Z"), 85.0),
            check_in("2024-06-03", Some("2024-06-03T19:00:00Z"), 85.4),
        ];
        let latest = latest_check_in(&check_ins).unwrap();
        assert_eq!(latest.body_weight, 85.4);
        assert_eq!(weight_log(&check_ins)[0].trend, Trend::Up);
    }

    #[test]
    fn test_empty_log() {
        assert!(weight_log(&[]).is_empty());
        assert!(latest_check_in(&[]).is_none());
    }
}
