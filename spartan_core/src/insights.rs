//! Presentation-ready bundle derived from a document snapshot.

use crate::activity::{ActivityIndex, Snapshot};
use crate::calendar::{build_month_grid, MonthGrid};
use crate::consistency::{consistency_breakdown, ConsistencyBreakdown};
use crate::streak::current_streak;
use crate::Result;
use chrono::TimeZone;
use serde::Serialize;

/// Calendar grid plus the two scalar metrics shown beside it
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Insights {
    pub grid: MonthGrid,
    pub streak: u32,
    pub consistency: ConsistencyBreakdown,
}

impl Insights {
    /// Derive everything for the month `year` / zero-based `month0`
    ///
    /// Pure over the snapshot: the same snapshot and month always give the
    /// same result.
    pub fn derive<Tz: TimeZone>(snapshot: &Snapshot<'_, Tz>, year: i32, month0: u32) -> Result<Self> {
        let today = snapshot.today();
        let index = ActivityIndex::build(snapshot);
        Ok(Self {
            grid: build_month_grid(year, month0, today, &index)?,
            streak: current_streak(today, &index),
            consistency: consistency_breakdown(today, &index),
        })
    }

    /// Derive for the month containing today
    pub fn for_current_month<Tz: TimeZone>(snapshot: &Snapshot<'_, Tz>) -> Result<Self> {
        use chrono::Datelike;
        let today = snapshot.today();
        Self::derive(snapshot, today.year(), today.month0())
    }
}
