//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found at the specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The configuration could not be parsed or extracted.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {message}")]
    ValidationError { message: String },

    /// Missing required field.
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// A declared listener names a category that does not exist.
    #[error("Unknown listener category '{category}' for listener '{listener}'")]
    UnknownCategory { listener: String, category: String },

    /// Two declared listeners share a name.
    #[error("Duplicate listener name: {0}")]
    DuplicateListener(String),

    /// A declared listener's constraint was rejected by its matcher builder.
    #[error("Invalid constraint for listener '{listener}': {reason}")]
    InvalidConstraint { listener: String, reason: String },
}

impl ConfigError {
    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid constraint error.
    pub fn invalid_constraint(listener: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidConstraint {
            listener: listener.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
