//! Month grid construction.
//!
//! Grids are Monday-first, padded with the tail of the previous month and
//! the head of the next one to exactly five or six full weeks.

use crate::activity::{ActivityIndex, DayClass};
use crate::dates::local_date_key;
use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Cell count for a five-row grid
pub const SHORT_GRID: usize = 35;

/// Cell count for a six-row grid
pub const LONG_GRID: usize = 42;

/// One day on the month grid
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub key: String,
    /// Belongs to the requested month (not padding)
    pub in_month: bool,
    pub day_of_month: u32,
    pub is_today: bool,
    pub class: DayClass,
}

/// A month grid, row-major, Monday to Sunday
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    /// Zero-based month
    pub month0: u32,
    pub cells: Vec<DayCell>,
}

impl MonthGrid {
    /// Human label such as "June 2024"
    pub fn label(&self) -> String {
        self.month0
            .checked_add(1)
            .and_then(|month| NaiveDate::from_ymd_opt(self.year, month, 1))
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_default()
    }

    /// Seven-cell rows
    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell]> {
        self.cells.chunks(7)
    }

    /// Cells belonging to the requested month
    pub fn month_cells(&self) -> impl Iterator<Item = &DayCell> {
        self.cells.iter().filter(|c| c.in_month)
    }
}

/// Build the grid for `year` / zero-based `month0`, as seen on `today`
pub fn build_month_grid(
    year: i32,
    month0: u32,
    today: NaiveDate,
    index: &ActivityIndex,
) -> Result<MonthGrid> {
    let first = month0
        .checked_add(1)
        .and_then(|month| NaiveDate::from_ymd_opt(year, month, 1))
        .ok_or_else(|| Error::Calendar(format!("Invalid month {} for year {}", month0, year)))?;
    let days_in_month = days_in_month(first);

    // Monday = 0 padding, Sunday = 6
    let padding = first.weekday().num_days_from_monday() as usize;
    let natural = padding + days_in_month as usize;
    let total = if natural > SHORT_GRID { LONG_GRID } else { SHORT_GRID };

    let start = first - Duration::days(padding as i64);
    let cells = start
        .iter_days()
        .take(total)
        .map(|date| DayCell {
            key: local_date_key(date),
            in_month: date.year() == year && date.month0() == month0,
            day_of_month: date.day(),
            is_today: date == today,
            class: index.classify(date, today),
            date,
        })
        .collect();

    tracing::debug!(
        "Built {} cell grid for {}-{:02} ({} padding days)",
        total,
        year,
        month0 + 1,
        padding
    );

    Ok(MonthGrid {
        year,
        month0,
        cells,
    })
}

fn days_in_month(first: NaiveDate) -> u32 {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.map(|n| (n - first).num_days() as u32).unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn empty_index(today: NaiveDate) -> ActivityIndex {
        ActivityIndex::from_dates([], [], [], today)
    }

    #[test]
    fn test_grid_shape_for_every_month() {
        let today = ymd(2024, 6, 6);
        let index = empty_index(today);
        for year in [2023, 2024, 2025, 2026] {
            for month0 in 0..12 {
                let grid = build_month_grid(year, month0, today, &index).unwrap();
                assert!(
                    grid.cells.len() == SHORT_GRID || grid.cells.len() == LONG_GRID,
                    "{}-{} has {} cells",
                    year,
                    month0,
                    grid.cells.len()
                );
                assert_eq!(grid.cells[0].date.weekday(), Weekday::Mon);
                assert_eq!(grid.cells.last().unwrap().date.weekday(), Weekday::Sun);

                let in_month: Vec<u32> = grid.month_cells().map(|c| c.day_of_month).collect();
                let expected: Vec<u32> = (1..=in_month.len() as u32).collect();
                assert_eq!(in_month, expected);
                assert!(in_month.len() >= 28);
            }
        }
    }

    #[test]
    fn test_june_2024_padding() {
        // June 1st 2024 is a Saturday: five leading May days
        let today = ymd(2024, 6, 6);
        let grid = build_month_grid(2024, 5, today, &empty_index(today)).unwrap();
        assert_eq!(grid.cells.len(), 35);
        assert_eq!(grid.cells[0].key, "2024-05-27");
        assert!(!grid.cells[0].in_month);
        assert_eq!(grid.cells[5].key, "2024-06-01");
        assert!(grid.cells[5].in_month);
        assert_eq!(grid.cells[34].key, "2024-06-30");
        assert_eq!(grid.label(), "June 2024");
    }

    #[test]
    fn test_six_row_month() {
        // September 2024 starts on Sunday: 6 + 30 = 36 cells needed
        let today = ymd(2024, 9, 10);
        let grid = build_month_grid(2024, 8, today, &empty_index(today)).unwrap();
        assert_eq!(grid.cells.len(), 42);
        assert_eq!(grid.weeks().count(), 6);
        assert_eq!(grid.cells[6].key, "2024-09-01");
        assert_eq!(grid.cells[41].key, "2024-10-06");
    }

    #[test]
    fn test_february_starting_monday_fits_five_rows() {
        // February 2027 starts on Monday and has 28 days
        let today = ymd(2027, 2, 10);
        let grid = build_month_grid(2027, 1, today, &empty_index(today)).unwrap();
        assert_eq!(grid.cells.len(), 35);
        assert_eq!(grid.cells[0].key, "2027-02-01");
        assert_eq!(grid.cells[28].key, "2027-03-01");
    }

    #[test]
    fn test_today_flag_and_classes() {
        let today = ymd(2024, 6, 6);
        let index = ActivityIndex::from_dates(
            [ymd(2024, 6, 3), ymd(2024, 6, 4)],
            [],
            [],
            today,
        );
        let grid = build_month_grid(2024, 5, today, &index).unwrap();
        let cell = |key: &str| grid.cells.iter().find(|c| c.key == key).unwrap();

        assert!(cell("2024-06-06").is_today);
        assert_eq!(grid.cells.iter().filter(|c| c.is_today).count(), 1);
        assert_eq!(cell("2024-06-03").class, DayClass::Workout);
        assert_eq!(cell("2024-06-05").class, DayClass::Missed);
        assert_eq!(cell("2024-06-07").class, DayClass::Future);
        assert_eq!(cell("2024-06-08").class, DayClass::Rest);
        assert_eq!(cell("2024-05-31").class, DayClass::Empty);
    }

    #[test]
    fn test_grid_is_deterministic() {
        let today = ymd(2024, 6, 6);
        let index = ActivityIndex::from_dates([ymd(2024, 6, 3)], [ymd(2024, 6, 4)], [], today);
        let a = build_month_grid(2024, 5, today, &index).unwrap();
        let b = build_month_grid(2024, 5, today, &index).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_month_rejected() {
        let today = ymd(2024, 6, 6);
        let result = build_month_grid(2024, 12, today, &empty_index(today));
        assert!(matches!(result, Err(Error::Calendar(_))));

        let result = build_month_grid(2024, u32::MAX, today, &empty_index(today));
        assert!(matches!(result, Err(Error::Calendar(_))));
    }
}
