//! Core error types for simmer-core.
//!
//! The timer state machines themselves never fail at run time; every error
//! here is raised at the boundary, while validating durations, phase lists
//! or configuration before they reach a timer.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for simmer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A tick source needs a tokio runtime to spawn its interval task
    #[error("No tokio runtime available for the tick source: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// The data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A countdown would have zero length
    #[error("Duration for '{field}' must be at least one second")]
    ZeroDuration { field: String },

    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    pub(crate) fn zero_duration(field: impl Into<String>) -> Self {
        ValidationError::ZeroDuration {
            field: field.into(),
        }
    }
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        let key = match &err {
            ValidationError::ZeroDuration { field }
            | ValidationError::InvalidValue { field, .. } => field.clone(),
            ValidationError::EmptyCollection(name) => name.clone(),
            ValidationError::OutOfBounds { collection, .. } => collection.clone(),
        };
        ConfigError::InvalidValue {
            key,
            message: err.to_string(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
