//! Core domain types for the Spartan workout tracker.
//!
//! This module defines the persisted document and everything it owns:
//! - Exercises, workout days and user-authored programs
//! - Completed workout history and daily check-ins
//! - The per-week status board and recorded loads

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Schedule Types
// ============================================================================

/// Muscle-group category of an exercise, used to offer swap alternatives
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Push,
    Pull,
    Legs,
    Core,
    Cardio,
}

/// A single exercise prescription within a workout day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub sets: u32,
    /// Rep scheme as written by the user, e.g. "6-10" or "Failure"
    pub reps: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub category: ExerciseCategory,
}

/// One day of a weekly schedule (e.g. "PUSH 1" on Monday)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutDay {
    pub id: String,
    pub day: String,
    pub title: String,
    pub focus: String,
    pub color: String,
    pub exercises: Vec<Exercise>,
}

/// A user-authored training program wrapping a weekly schedule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub name: String,
    /// Canonical `YYYY-MM-DD` key
    #[serde(default)]
    pub start_date: String,
    #[serde(default = "default_duration_weeks")]
    pub duration_weeks: u32,
    #[serde(default)]
    pub schedule: Vec<WorkoutDay>,
    #[serde(default)]
    pub is_active: bool,
    /// RFC 3339 timestamp; kept as text so legacy values never fail a load
    #[serde(default)]
    pub created_at: String,
}

// ============================================================================
// Log Types
// ============================================================================

/// Per-day status on the current week's board
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Pending,
    Completed,
    Skipped,
}

/// Recorded result for one exercise of a finished workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseResult {
    pub name: String,
    pub weight: f64,
    pub sets: u32,
    pub reps: String,
}

/// One completed workout session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    /// Timestamp of when the entry was written (legacy records may hold junk)
    #[serde(default)]
    pub date: String,
    /// Canonical local-date key the workout counts for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_date: Option<String>,
    pub workout_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_number: Option<u32>,
    /// Session intensity, 1-10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub exercises: Vec<ExerciseResult>,
}

/// A daily mood and body-weight log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    /// Logical `YYYY-MM-DD` date; at most one check-in per date
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub mood: String,
    /// Body weight in kg
    pub body_weight: f64,
}

// ============================================================================
// Document
// ============================================================================

/// The whole persisted application state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default = "default_current_week")]
    pub current_week: u32,
    /// Exercise id -> last recorded load in kg
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    /// Workout day id -> status for the current week
    #[serde(default)]
    pub week_status: BTreeMap<String, DayStatus>,
    /// Newest first
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Newest first
    #[serde(default)]
    pub check_ins: Vec<CheckIn>,
    #[serde(default)]
    pub skipped_dates: BTreeSet<String>,
    #[serde(default)]
    pub programs: Vec<Program>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default = "default_overlay_opacity")]
    pub bg_overlay_opacity: f64,
    #[serde(default = "default_theme")]
    pub active_theme: String,
}

fn default_duration_weeks() -> u32 {
    crate::catalog::DEFAULT_PROGRAM_WEEKS
}

fn default_current_week() -> u32 {
    1
}

fn default_overlay_opacity() -> f64 {
    0.5
}

fn default_theme() -> String {
    crate::catalog::DEFAULT_THEME.to_string()
}

impl Document {
    /// The active program, falling back to the first one
    pub fn active_program(&self) -> Option<&Program> {
        self.programs
            .iter()
            .find(|p| p.is_active)
            .or_else(|| self.programs.first())
    }

    /// Mutable access to the active program, with the same fallback
    pub fn active_program_mut(&mut self) -> Option<&mut Program> {
        let idx = self
            .programs
            .iter()
            .position(|p| p.is_active)
            .or(if self.programs.is_empty() { None } else { Some(0) })?;
        self.programs.get_mut(idx)
    }

    /// Schedule of the active program, or the built-in plan when none exists
    pub fn active_schedule(&self) -> &[WorkoutDay] {
        match self.active_program() {
            Some(program) => &program.schedule,
            None => crate::catalog::default_schedule(),
        }
    }

    /// Number of days marked completed on the current week's board
    pub fn completed_this_week(&self) -> usize {
        self.week_status
            .values()
            .filter(|s| **s == DayStatus::Completed)
            .count()
    }

    /// Status of a workout day this week (pending when never touched)
    pub fn day_status(&self, day_id: &str) -> DayStatus {
        self.week_status
            .get(day_id)
            .copied()
            .unwrap_or(DayStatus::Pending)
    }
}
