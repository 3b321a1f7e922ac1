//! Error types for the spartan_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for spartan_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted document could not be upgraded to the current schema
    #[error("Migration error: {0}")]
    Migration(String),

    /// Invalid calendar request (e.g. month out of range)
    #[error("Calendar error: {0}")]
    Calendar(String),

    /// A state transition was rejected
    #[error("Command error: {0}")]
    Command(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
