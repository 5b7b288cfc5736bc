//! Error types for the Bolt framework.

use thiserror::Error;

use bolt_core::BoltError;

use crate::extractor::ArgKind;

/// Returned by a tower filter predicate when a request does **not** match.
///
/// Callers recognise this error and move on to the next listener without
/// logging anything. All other errors are genuine failures.
#[derive(Debug, Clone, Error)]
#[error("request skipped by listener matcher")]
pub struct ListenerSkipped;

/// Errors that can occur while resolving matcher or handler arguments.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The argument was declared but the live context cannot supply it.
    #[error("argument '{0}' is not available in this context")]
    Unavailable(ArgKind),

    /// The slash command text could not be parsed into the requested type.
    #[error("invalid command arguments: {0}")]
    InvalidCommandArgs(String),

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

impl From<ExtractError> for BoltError {
    fn from(err: ExtractError) -> Self {
        BoltError::Resolution(err.to_string())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_converts_to_resolution() {
        let err: BoltError = ExtractError::Unavailable(ArgKind::Response).into();
        assert_eq!(
            err,
            BoltError::Resolution("argument 'response' is not available in this context".into())
        );
    }
}
