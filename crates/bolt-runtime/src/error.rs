//! Runtime error types.

use thiserror::Error;

use bolt_core::BoltError;

use crate::config::ConfigError;

/// Errors that can occur while building or running an [`App`](crate::App).
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A listener could not be registered, or a matcher or handler could not
    /// resolve its arguments.
    #[error(transparent)]
    Bolt(#[from] BoltError),

    /// Configuration loading or validation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No listener matched and the app is configured to fail such requests.
    #[error("unhandled request")]
    Unhandled,

    /// A declared listener has no handler registered under its name.
    #[error("no handler registered for listener '{0}'")]
    HandlerNotFound(String),

    /// The request body is not valid JSON.
    #[error("invalid request payload: {0}")]
    InvalidPayload(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
