//! Local calendar-date keys.
//!
//! Every event is joined to the calendar through a `YYYY-MM-DD` key taken
//! from the viewer's local calendar fields. Timestamps are converted into
//! the viewer's timezone first, never keyed by their UTC date.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Weekday};

/// Format of the canonical local-date key
pub const KEY_FORMAT: &str = "%Y-%m-%d";

/// Key substituted by migration when a legacy timestamp cannot be parsed
pub const SENTINEL_KEY: &str = "2024-01-01";

/// Outcome of resolving a stored date value to a calendar date
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateKey {
    Valid(NaiveDate),
    /// Input could not be read as a date; callers skip the record
    Invalid,
}

impl DateKey {
    pub fn valid(self) -> Option<NaiveDate> {
        match self {
            DateKey::Valid(date) => Some(date),
            DateKey::Invalid => None,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, DateKey::Valid(_))
    }
}

/// Canonical key for a calendar date
pub fn local_date_key(date: NaiveDate) -> String {
    date.format(KEY_FORMAT).to_string()
}

/// The sentinel date as a calendar value
pub fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// Whether `input` has the exact `NNNN-NN-NN` shape of a canonical key
pub fn is_canonical(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Resolve a stored date value into a local calendar date in `tz`
///
/// Accepts, in order:
/// 1. A canonical `YYYY-MM-DD` key (returned as-is)
/// 2. An RFC 3339 timestamp, converted to `tz` before taking the date
/// 3. A naive `YYYY-MM-DDTHH:MM:SS` timestamp, taken as already local
///
/// Anything else is [`DateKey::Invalid`].
pub fn resolve_key<Tz: TimeZone>(input: &str, tz: &Tz) -> DateKey {
    let trimmed = input.trim();

    if is_canonical(trimmed) {
        return match NaiveDate::parse_from_str(trimmed, KEY_FORMAT) {
            Ok(date) => DateKey::Valid(date),
            Err(_) => DateKey::Invalid,
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return DateKey::Valid(dt.with_timezone(tz).date_naive());
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return DateKey::Valid(ndt.date());
    }

    DateKey::Invalid
}

/// Resolve to a canonical key string, `None` when unparseable
pub fn canonical_key<Tz: TimeZone>(input: &str, tz: &Tz) -> Option<String> {
    resolve_key(input, tz).valid().map(local_date_key)
}

/// Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday through Friday, the days counted as scheduled training days
pub fn is_weekday(date: NaiveDate) -> bool {
    !is_weekend(date)
}
