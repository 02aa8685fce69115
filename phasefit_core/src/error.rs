//! Error types for the phasefit_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for phasefit_core operations
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

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Persisted state error
    #[error("State error: {0}")]
    State(String),

    /// Category name that is not one of the five body-part categories
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Day is ahead of the next sequential day
    #[error("Day {day} is locked (next available day is {next})")]
    DayLocked { day: u32, next: u32 },

    /// Generic error
    #[error("{0}")]
    Other(String),
}
