//! Activity lookup and per-day classification.
//!
//! An [`ActivityIndex`] is built once per derivation from an immutable
//! [`Snapshot`] of the document and answers "what happened on this date"
//! for the calendar, streak and consistency calculations.

use crate::dates::{is_weekend, resolve_key, DateKey};
use crate::types::{CheckIn, Document, HistoryEntry};
use chrono::{DateTime, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::BTreeSet;

/// Anything that can be placed on the calendar
pub trait Dated {
    /// Resolve the record's local calendar date in `tz`
    fn date_key<Tz: TimeZone>(&self, tz: &Tz) -> DateKey;
}

impl Dated for HistoryEntry {
    fn date_key<Tz: TimeZone>(&self, tz: &Tz) -> DateKey {
        self.local_date
            .as_deref()
            .map(|key| resolve_key(key, tz))
            .filter(|key| key.is_valid())
            .unwrap_or_else(|| resolve_key(&self.date, tz))
    }
}

impl Dated for CheckIn {
    fn date_key<Tz: TimeZone>(&self, tz: &Tz) -> DateKey {
        [self.local_date.as_deref(), Some(self.date.as_str()), self.timestamp.as_deref()]
            .into_iter()
            .flatten()
            .map(|value| resolve_key(value, tz))
            .find(|key| key.is_valid())
            .unwrap_or(DateKey::Invalid)
    }
}

/// Immutable view of the document parts the derivations read
#[derive(Clone, Debug)]
pub struct Snapshot<'a, Tz: TimeZone> {
    pub history: &'a [HistoryEntry],
    pub check_ins: &'a [CheckIn],
    pub skipped_dates: &'a BTreeSet<String>,
    pub current_week: u32,
    /// Injected "now"; its timezone is the viewer's timezone
    pub now: DateTime<Tz>,
}

impl<'a, Tz: TimeZone> Snapshot<'a, Tz> {
    pub fn of(document: &'a Document, now: DateTime<Tz>) -> Self {
        Self {
            history: &document.history,
            check_ins: &document.check_ins,
            skipped_dates: &document.skipped_dates,
            current_week: document.current_week,
            now,
        }
    }

    /// Today's local calendar date
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}

/// Classification of a single calendar day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayClass {
    /// Explicitly marked "could not train"
    Skip,
    Workout,
    /// A check-in but no workout
    CheckinOnly,
    /// Weekend with nothing logged
    Rest,
    Future,
    /// Past weekday with nothing logged, on or after the first activity
    Missed,
    Empty,
}

impl DayClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Workout => "workout",
            Self::CheckinOnly => "checkin-only",
            Self::Rest => "rest",
            Self::Future => "future",
            Self::Missed => "missed",
            Self::Empty => "empty",
        }
    }
}

/// Date lookup sets derived from a snapshot
#[derive(Clone, Debug, Default)]
pub struct ActivityIndex {
    workout_dates: BTreeSet<NaiveDate>,
    /// Workouts and check-ins
    active_dates: BTreeSet<NaiveDate>,
    skipped_dates: BTreeSet<NaiveDate>,
    earliest: NaiveDate,
}

impl ActivityIndex {
    /// Index a snapshot; records with unparseable dates are left out
    pub fn build<Tz: TimeZone>(snapshot: &Snapshot<'_, Tz>) -> Self {
        let tz = snapshot.now.timezone();
        let mut invalid = 0usize;

        let mut workout_dates = BTreeSet::new();
        for entry in snapshot.history {
            match entry.date_key(&tz) {
                DateKey::Valid(date) => {
                    workout_dates.insert(date);
                }
                DateKey::Invalid => invalid += 1,
            }
        }

        let mut check_in_dates = Vec::new();
        for check_in in snapshot.check_ins {
            match check_in.date_key(&tz) {
                DateKey::Valid(date) => check_in_dates.push(date),
                DateKey::Invalid => invalid += 1,
            }
        }

        let skipped: Vec<NaiveDate> = snapshot
            .skipped_dates
            .iter()
            .filter_map(|key| resolve_key(key, &tz).valid())
            .collect();

        if invalid > 0 {
            tracing::warn!("Skipped {} records with unparseable dates", invalid);
        }

        Self::from_dates(workout_dates, check_in_dates, skipped, snapshot.today())
    }

    /// Build directly from resolved dates
    ///
    /// The earliest activity date is the first workout date, or `today`
    /// when there are none.
    pub fn from_dates(
        workouts: impl IntoIterator<Item = NaiveDate>,
        check_ins: impl IntoIterator<Item = NaiveDate>,
        skipped: impl IntoIterator<Item = NaiveDate>,
        today: NaiveDate,
    ) -> Self {
        let workout_dates: BTreeSet<NaiveDate> = workouts.into_iter().collect();
        let mut active_dates = workout_dates.clone();
        active_dates.extend(check_ins);

        let earliest = workout_dates
            .first()
            .copied()
            .filter(|first| *first < today)
            .unwrap_or(today);

        Self {
            workout_dates,
            active_dates,
            skipped_dates: skipped.into_iter().collect(),
            earliest,
        }
    }

    pub fn has_workout(&self, date: NaiveDate) -> bool {
        self.workout_dates.contains(&date)
    }

    pub fn has_activity(&self, date: NaiveDate) -> bool {
        self.active_dates.contains(&date)
    }

    pub fn is_skipped(&self, date: NaiveDate) -> bool {
        self.skipped_dates.contains(&date)
    }

    /// First day of the user's active history
    pub fn earliest(&self) -> NaiveDate {
        self.earliest
    }

    /// Distinct dates with at least one workout, across all time
    pub fn workout_day_count(&self) -> usize {
        self.workout_dates.len()
    }

    /// Classify `date` as seen on `today`
    ///
    /// Precedence: skip > workout > checkin-only > rest > future > missed > empty.
    pub fn classify(&self, date: NaiveDate, today: NaiveDate) -> DayClass {
        if self.is_skipped(date) {
            DayClass::Skip
        } else if self.has_workout(date) {
            DayClass::Workout
        } else if self.has_activity(date) {
            DayClass::CheckinOnly
        } else if is_weekend(date) {
            DayClass::Rest
        } else if date > today {
            DayClass::Future
        } else if date >= self.earliest && date < today {
            DayClass::Missed
        } else {
            DayClass::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(id: &str, date: &str, local: Option<&str>) -> HistoryEntry {
        HistoryEntry {
            id: id.into(),
            date: date.into(),
            local_date: local.map(Into::into),
            workout_title: "PUSH 1".into(),
            week_number: Some(1),
            rating: None,
            exercises: vec![],
        }
    }

    fn check_in(date: &str) -> CheckIn {
        CheckIn {
            date: date.into(),
            local_date: None,
            timestamp: None,
            mood: "🔥".into(),
            body_weight: 85.0,
        }
    }

    #[test]
    fn test_history_prefers_local_date() {
        let e = entry("1", "2024-06-03T23:30:00Z", Some("2024-06-03"));
        let plus_two = FixedOffset::east_opt(7200).unwrap();
        assert_eq!(e.date_key(&plus_two), DateKey::Valid(ymd(2024, 6, 3)));
    }

    #[test]
    fn test_history_falls_back_to_timestamp() {
        let e = entry("1", "2024-06-03T23:30:00Z", None);
        let plus_two = FixedOffset::east_opt(7200).unwrap();
        assert_eq!(e.date_key(&plus_two), DateKey::Valid(ymd(2024, 6, 4)));

        let broken = entry("2", "garbage", Some("also garbage"));
        assert_eq!(broken.date_key(&Utc), DateKey::Invalid);
    }

    #[test]
    fn test_timestamp_uses_offset_of_its_own_instant() {
        let berlin = chrono_tz::Europe::Berlin;
        let winter = entry("1", "2024-01-15T23:30:00Z", None);
        let summer = entry("2", "2024-07-15T22:30:00Z", None);
        assert_eq!(winter.date_key(&berlin), DateKey::Valid(ymd(2024, 1, 16)));
        assert_eq!(summer.date_key(&berlin), DateKey::Valid(ymd(2024, 7, 16)));

        let late = entry("3", "2024-01-15T22:30:00Z", None);
        assert_eq!(late.date_key(&berlin), DateKey::Valid(ymd(2024, 1, 15)));
    }

    #[test]
    fn test_check_in_falls_back_to_timestamp() {
        let mut c = check_in("not-a-date");
        c.timestamp = Some("2024-06-05T08:00:00Z".into());
        assert_eq!(c.date_key(&Utc), DateKey::Valid(ymd(2024, 6, 5)));
    }

    #[test]
    fn test_build_skips_invalid_records() {
        crate::logging::init_test();
        let history = vec![entry("1", "2024-06-03", None), entry("2", "???", None)];
        let check_ins = vec![check_in("2024-06-04"), check_in("bad")];
        let skipped: BTreeSet<String> = ["2024-06-05".to_string(), "junk".to_string()].into();
        let snapshot = Snapshot {
            history: &history,
            check_ins: &check_ins,
            skipped_dates: &skipped,
            current_week: 1,
            now: Utc.with_ymd_and_hms(2024, 6, 6, 12, 0, 0).unwrap(),
        };

        let index = ActivityIndex::build(&snapshot);
        assert_eq!(index.workout_day_count(), 1);
        assert!(index.has_activity(ymd(2024, 6, 4)));
        assert!(index.is_skipped(ymd(2024, 6, 5)));
        assert_eq!(index.earliest(), ymd(2024, 6, 3));
    }

    #[test]
    fn test_earliest_defaults_to_today() {
        let today = ymd(2024, 6, 6);
        let index = ActivityIndex::from_dates([], [ymd(2024, 5, 1)], [], today);
        assert_eq!(index.earliest(), today);
    }

    #[test]
    fn test_skip_wins_over_everything() {
        let today = ymd(2024, 6, 12);
        let saturday = ymd(2024, 6, 8);
        let monday = ymd(2024, 6, 10);
        let future_monday = ymd(2024, 6, 17);
        let dates = [saturday, monday, future_monday];
        let index = ActivityIndex::from_dates(dates, dates, dates, today);

        for date in dates {
            assert_eq!(index.classify(date, today), DayClass::Skip);
        }
    }

    #[test]
    fn test_precedence_order() {
        let today = ymd(2024, 6, 12); // Wednesday
        let index = ActivityIndex::from_dates(
            [ymd(2024, 6, 3), ymd(2024, 6, 8)],
            [ymd(2024, 6, 4), ymd(2024, 6, 8)],
            [],
            today,
        );

        assert_eq!(index.classify(ymd(2024, 6, 3), today), DayClass::Workout);
        assert_eq!(index.classify(ymd(2024, 6, 8), today), DayClass::Workout);
        assert_eq!(index.classify(ymd(2024, 6, 4), today), DayClass::CheckinOnly);
        assert_eq!(index.classify(ymd(2024, 6, 9), today), DayClass::Rest);
        assert_eq!(index.classify(ymd(2024, 6, 15), today), DayClass::Rest);
        assert_eq!(index.classify(ymd(2024, 6, 13), today), DayClass::Future);
        assert_eq!(index.classify(ymd(2024, 6, 5), today), DayClass::Missed);
        // before the first workout
        assert_eq!(index.classify(ymd(2024, 5, 31), today), DayClass::Empty);
        // today is still in progress
        assert_eq!(index.classify(today, today), DayClass::Empty);
    }

    #[test]
    fn test_class_codes() {
        assert_eq!(DayClass::CheckinOnly.as_str(), "checkin-only");
        assert_eq!(
            serde_json::to_string(&DayClass::CheckinOnly).unwrap(),
            "\"checkin-only\""
        );
    }
}
