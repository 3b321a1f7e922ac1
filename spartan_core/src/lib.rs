#![forbid(unsafe_code)]

//! Core domain model and business logic for the Spartan workout tracker.
//!
//! This crate provides:
//! - Domain types (programs, history, check-ins, the persisted document)
//! - Local date keys and day classification
//! - Month grid, streak and consistency score
//! - Document migration and self-heal
//! - State transitions, reports and persistence

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod dates;
pub mod activity;
pub mod calendar;
pub mod streak;
pub mod consistency;
pub mod insights;
pub mod migration;
pub mod commands;
pub mod report;
pub mod store;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use activity::{ActivityIndex, DayClass, Snapshot};
pub use calendar::{build_month_grid, DayCell, MonthGrid};
pub use commands::{apply, draft_program, Command, Notice, Transition};
pub use consistency::{consistency_breakdown, consistency_score, ConsistencyBreakdown};
pub use dates::{local_date_key, resolve_key, DateKey};
pub use insights::Insights;
pub use migration::{migrate_str, self_heal, LoadOutcome, CURRENT_SCHEMA_VERSION};
pub use store::DocumentStore;
pub use streak::current_streak;
