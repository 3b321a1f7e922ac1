//! CSV export of workout history.

use crate::activity::Dated;
use crate::types::{ExerciseResult, HistoryEntry};
use crate::Result;
use chrono::TimeZone;
use std::fs::File;
use std::path::Path;

/// One exercise result of one workout
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    local_date: String,
    workout_title: &'a str,
    week_number: Option<u32>,
    rating: Option<u8>,
    exercise: &'a str,
    weight: f64,
    sets: u32,
    reps: &'a str,
}

impl<'a> CsvRow<'a> {
    fn new(entry: &'a HistoryEntry, local_date: &str, result: &'a ExerciseResult) -> Self {
        CsvRow {
            id: &entry.id,
            local_date: local_date.to_string(),
            workout_title: &entry.workout_title,
            week_number: entry.week_number,
            rating: entry.rating,
            exercise: &result.name,
            weight: result.weight,
            sets: result.sets,
            reps: &result.reps,
        }
    }
}

/// Write `history` to `path`, replacing any existing file
///
/// Dates are resolved in `tz`; entries with an unusable date are exported
/// with an empty date column. Returns the number of rows written.
pub fn export_history_csv<Tz: TimeZone>(
    history: &[HistoryEntry],
    path: &Path,
    tz: &Tz,
) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    let mut rows = 0;
    for entry in history {
        let local_date = entry
            .date_key(tz)
            .valid()
            .map(crate::dates::local_date_key)
            .unwrap_or_default();
        for result in &entry.exercises {
            writer.serialize(CsvRow::new(entry, &local_date, result))?;
            rows += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} rows from {} workouts to {:?}", rows, history.len(), path);
    Ok(rows)
}
