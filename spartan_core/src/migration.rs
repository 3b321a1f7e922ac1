//! Schema upgrades and self-healing for the persisted document.
//!
//! Documents carry an explicit `schemaVersion`. Loading runs every
//! migration whose source version is at or above the stored version, in
//! order, over the raw JSON value; the typed document is then healed so
//! the runtime invariants hold:
//! - at least one program exists and exactly one is marked active when
//!   none was
//! - history ids are unique (first seen wins, so the newest record of a
//!   newest-first list survives)
//! - at most one check-in per date (first seen wins)
//!
//! Legacy documents without a version field are treated as version 0.

use crate::activity::Dated;
use crate::catalog::{default_program, default_schedule, DEFAULT_THEME};
use crate::dates::{canonical_key, DateKey, SENTINEL_KEY};
use crate::types::{Document, WorkoutDay};
use crate::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Version written by this build
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Themes reset to the default when a legacy document is upgraded
const LEGACY_RESET_THEMES: &[&str] = &["cyberpunk"];

type Object = Map<String, Value>;

/// One version-to-version transform over the raw document
struct Migration<Tz: TimeZone> {
    from: u32,
    description: &'static str,
    apply: fn(&mut Object, &DateTime<Tz>) -> Result<()>,
}

fn migrations<Tz: TimeZone>() -> [Migration<Tz>; 2] {
    [
        Migration {
            from: 0,
            description: "wrap legacy schedule in a program list",
            apply: introduce_programs::<Tz>,
        },
        Migration {
            from: 1,
            description: "backfill local-date keys",
            apply: backfill_local_dates::<Tz>,
        },
    ]
}

/// Result of loading a persisted document
#[derive(Debug)]
pub enum LoadOutcome {
    /// Nothing was stored yet
    Fresh(Document),
    /// Stored document upgraded from `from_version`
    Loaded { document: Document, from_version: u32 },
    /// Stored document was unusable and replaced by a fresh one
    Recovered { document: Document, error: Error },
}

impl LoadOutcome {
    pub fn document(&self) -> &Document {
        match self {
            LoadOutcome::Fresh(document)
            | LoadOutcome::Loaded { document, .. }
            | LoadOutcome::Recovered { document, .. } => document,
        }
    }

    pub fn into_document(self) -> Document {
        match self {
            LoadOutcome::Fresh(document)
            | LoadOutcome::Loaded { document, .. }
            | LoadOutcome::Recovered { document, .. } => document,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, LoadOutcome::Recovered { .. })
    }
}

/// What [`self_heal`] had to correct
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HealReport {
    pub synthesized_program: bool,
    pub activated_program: Option<String>,
    pub duplicate_history: usize,
    pub duplicate_check_ins: usize,
    pub clamped_week: bool,
}

impl HealReport {
    pub fn is_clean(&self) -> bool {
        *self == HealReport::default()
    }
}

/// A new document with one default program and nothing logged
pub fn fresh_document<Tz: TimeZone>(now: &DateTime<Tz>) -> Document {
    Document {
        schema_version: CURRENT_SCHEMA_VERSION,
        current_week: 1,
        weights: BTreeMap::new(),
        week_status: BTreeMap::new(),
        history: Vec::new(),
        check_ins: Vec::new(),
        skipped_dates: BTreeSet::new(),
        programs: vec![default_program("prog_default", default_schedule().to_vec(), now)],
        background_image: None,
        bg_overlay_opacity: 0.5,
        active_theme: DEFAULT_THEME.to_string(),
    }
}

/// Parse and upgrade a stored document, never failing
///
/// Any parse or migration error is logged and replaced by a fresh
/// document; the error is returned inside [`LoadOutcome::Recovered`].
pub fn migrate_str<Tz: TimeZone>(raw: &str, now: &DateTime<Tz>) -> LoadOutcome {
    let result = serde_json::from_str::<Value>(raw)
        .map_err(Error::from)
        .and_then(|value| upgrade(value, now));

    match result {
        Ok((document, from_version)) => LoadOutcome::Loaded {
            document,
            from_version,
        },
        Err(error) => {
            tracing::warn!("Stored document unusable ({}), starting fresh", error);
            LoadOutcome::Recovered {
                document: fresh_document(now),
                error,
            }
        }
    }
}

/// Upgrade a raw document to the current schema and heal it
///
/// Returns the document and the version it was stored with.
pub fn upgrade<Tz: TimeZone>(value: Value, now: &DateTime<Tz>) -> Result<(Document, u32)> {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(Error::Migration(format!(
                "Expected a JSON object, found {}",
                json_kind(&other)
            )))
        }
    };

    let raw_version = object
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let stored = match u32::try_from(raw_version) {
        Ok(version) if version <= CURRENT_SCHEMA_VERSION => version,
        _ => {
            return Err(Error::Migration(format!(
                "Document schema version {} is newer than supported version {}",
                raw_version, CURRENT_SCHEMA_VERSION
            )))
        }
    };

    for migration in migrations::<Tz>().iter().filter(|m| m.from >= stored) {
        tracing::info!(
            "Migrating document v{} -> v{}: {}",
            migration.from,
            migration.from + 1,
            migration.description
        );
        (migration.apply)(&mut object, now)?;
        object.insert("schemaVersion".into(), Value::from(migration.from + 1));
    }

    let mut document: Document = serde_json::from_value(Value::Object(object))?;
    let report = self_heal(&mut document, now);
    if !report.is_clean() {
        tracing::info!("Self-heal applied on load: {:?}", report);
    }

    Ok((document, stored))
}

/// Restore the document invariants in place
///
/// Idempotent: healing an already healthy document changes nothing.
pub fn self_heal<Tz: TimeZone>(document: &mut Document, now: &DateTime<Tz>) -> HealReport {
    let mut report = HealReport::default();

    if document.programs.is_empty() {
        tracing::info!("Self-healing: creating default program");
        document.programs.push(default_program(
            "prog_default_heal",
            default_schedule().to_vec(),
            now,
        ));
        report.synthesized_program = true;
    }

    if !document.programs.iter().any(|p| p.is_active) {
        // Most recently created wins; on equal timestamps the earlier entry
        let newest = document
            .programs
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| {
                created_at(&a.created_at)
                    .cmp(&created_at(&b.created_at))
                    .then(ib.cmp(ia))
            })
            .map(|(idx, _)| idx);
        if let Some(idx) = newest {
            let program = &mut document.programs[idx];
            program.is_active = true;
            tracing::info!("Self-healing: activated program {}", program.id);
            report.activated_program = Some(program.id.clone());
        }
    }

    let mut seen_ids = HashSet::new();
    let before = document.history.len();
    document.history.retain(|entry| seen_ids.insert(entry.id.clone()));
    report.duplicate_history = before - document.history.len();

    let tz = now.timezone();
    let mut seen_dates = HashSet::new();
    let before = document.check_ins.len();
    document.check_ins.retain(|check_in| match check_in.date_key(&tz) {
        DateKey::Valid(date) => seen_dates.insert(date),
        DateKey::Invalid => true,
    });
    report.duplicate_check_ins = before - document.check_ins.len();

    if document.current_week == 0 {
        document.current_week = 1;
        report.clamped_week = true;
    }

    document.schema_version = CURRENT_SCHEMA_VERSION;

    if report.duplicate_history > 0 || report.duplicate_check_ins > 0 {
        tracing::warn!(
            "Removed {} duplicate history entries and {} duplicate check-ins",
            report.duplicate_history,
            report.duplicate_check_ins
        );
    }

    report
}

/// Unparseable creation times sort before every real one
fn created_at(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// v0 -> v1
// ============================================================================

fn introduce_programs<Tz: TimeZone>(object: &mut Object, now: &DateTime<Tz>) -> Result<()> {
    let legacy_plan = object.remove("customPlan");

    let has_programs = object
        .get("programs")
        .and_then(Value::as_array)
        .map_or(false, |programs| !programs.is_empty());

    if !has_programs {
        let schedule = legacy_plan
            .and_then(|plan| match serde_json::from_value::<Vec<WorkoutDay>>(plan) {
                Ok(schedule) if !schedule.is_empty() => Some(schedule),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable legacy schedule: {}", e);
                    None
                }
            })
            .unwrap_or_else(|| default_schedule().to_vec());

        let program = default_program("prog_default", schedule, now);
        object.insert("programs".into(), serde_json::to_value(vec![program])?);
    }

    let retired = match object.get("activeTheme") {
        Some(Value::String(theme)) => LEGACY_RESET_THEMES.contains(&theme.as_str()),
        _ => true,
    };
    if retired {
        object.insert("activeTheme".into(), Value::from(DEFAULT_THEME));
    }

    Ok(())
}

// ============================================================================
// v1 -> v2
// ============================================================================

fn backfill_local_dates<Tz: TimeZone>(object: &mut Object, now: &DateTime<Tz>) -> Result<()> {
    let tz = now.timezone();
    let mut substituted = 0usize;

    if let Some(Value::Array(history)) = object.get_mut("history") {
        for entry in history.iter_mut().filter_map(Value::as_object_mut) {
            if has_key(entry, "localDate") {
                continue;
            }
            let key = entry
                .get("date")
                .and_then(Value::as_str)
                .and_then(|date| canonical_key(date, &tz));
            if key.is_none() {
                substituted += 1;
            }
            entry.insert(
                "localDate".into(),
                Value::from(key.unwrap_or_else(|| SENTINEL_KEY.to_string())),
            );
        }
    }

    if let Some(Value::Array(check_ins)) = object.get_mut("checkIns") {
        for entry in check_ins.iter_mut().filter_map(Value::as_object_mut) {
            if has_key(entry, "localDate") {
                continue;
            }
            let key = ["date", "timestamp"]
                .iter()
                .filter_map(|field| entry.get(*field).and_then(Value::as_str))
                .find_map(|value| canonical_key(value, &tz));
            if key.is_none() {
                substituted += 1;
            }
            entry.insert(
                "localDate".into(),
                Value::from(key.unwrap_or_else(|| SENTINEL_KEY.to_string())),
            );
        }
    }

    if substituted > 0 {
        tracing::warn!(
            "{} records had no readable date; assigned sentinel {}",
            substituted,
            SENTINEL_KEY
        );
    }

    Ok(())
}

fn has_key(entry: &Object, field: &str) -> bool {
    entry
        .get(field)
        .and_then(Value::as_str)
        .map_or(false, |s| !s.is_empty())
}
