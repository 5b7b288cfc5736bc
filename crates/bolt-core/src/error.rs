//! Error types for the Bolt core.
//!
//! Every variant here is a **configuration** error: it signals that a listener
//! was registered with a constraint the framework cannot interpret. Ordinary
//! "the payload does not match" outcomes are never errors; they are plain
//! `false` results from the matchers.

use thiserror::Error;

/// Errors raised while building or resolving listener matchers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoltError {
    /// A constraint has a shape the category does not understand.
    #[error(
        "{category} ({constraint}) must be any of a literal, a pattern, and a structured constraint"
    )]
    InvalidConstraintShape {
        /// The listener category being built (e.g. `"action"`).
        category: &'static str,
        /// Rendering of the offending constraint.
        constraint: String,
    },

    /// A constraint value is neither a literal string nor a pattern.
    #[error("{value} ({kind}) must be either a literal string or a pattern")]
    InvalidConstraintType {
        /// Rendering of the offending value.
        value: String,
        /// The kind of value that was supplied (e.g. `"number"`).
        kind: &'static str,
    },

    /// A structured constraint names a `type` discriminator the category does not support.
    #[error("{category}: type {type_name} is unsupported")]
    UnsupportedConstraintType {
        /// The listener category being built.
        category: &'static str,
        /// The unsupported discriminator value.
        type_name: String,
    },

    /// A structured constraint lacks a field required by its discriminator.
    #[error("{category}: structured constraint is missing required field '{field}'")]
    MissingField {
        /// The listener category being built.
        category: &'static str,
        /// The missing field name.
        field: &'static str,
    },

    /// A pattern failed to compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// A matcher declared an argument the request context could not supply.
    #[error("failed to resolve matcher arguments: {0}")]
    Resolution(String),
}

impl BoltError {
    /// Creates an [`InvalidConstraintShape`](Self::InvalidConstraintShape) error.
    pub fn invalid_shape(category: &'static str, constraint: impl ToString) -> Self {
        Self::InvalidConstraintShape {
            category,
            constraint: constraint.to_string(),
        }
    }

    /// Creates an [`UnsupportedConstraintType`](Self::UnsupportedConstraintType) error.
    pub fn unsupported_type(category: &'static str, type_name: impl Into<String>) -> Self {
        Self::UnsupportedConstraintType {
            category,
            type_name: type_name.into(),
        }
    }

    /// Creates a [`MissingField`](Self::MissingField) error.
    pub fn missing_field(category: &'static str, field: &'static str) -> Self {
        Self::MissingField { category, field }
    }

    /// Creates an [`InvalidPattern`](Self::InvalidPattern) error from a regex compile failure.
    pub fn invalid_pattern(pattern: impl Into<String>, err: &regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: err.to_string(),
        }
    }
}

/// Result type for matcher construction.
pub type BoltResult<T> = Result<T, BoltError>;
