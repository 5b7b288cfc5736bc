//! # Bolt Core
//!
//! Payload model and constraint language for the Bolt listener matchers.
//!
//! This crate holds everything that can be decided from a decoded payload
//! alone, without any request context:
//!
//! - **Payloads**: field accessors and kind-specific views ([`payload`])
//! - **Classification**: one predicate per payload kind plus [`PayloadKind`] ([`classifier`])
//! - **Constraints**: literal, pattern and structured forms ([`Constraint`])
//! - **Matching**: the shared string-match primitive ([`pattern::matches`])
//!
//! Higher layers (`bolt-framework`) turn a category plus a constraint into a
//! listener matcher built on top of these pieces.
//!
//! ## Example
//!
//! ```rust
//! use bolt_core::{classify, PayloadKind};
//! use serde_json::json;
//!
//! let body = json!({"type": "block_actions", "actions": [{"action_id": "a"}]});
//! assert_eq!(classify(&body), Some(PayloadKind::BlockActions));
//! ```

pub mod classifier;
pub mod constraint;
pub mod error;
pub mod payload;
pub mod pattern;

pub use classifier::{PayloadKind, classify, detect_kinds, exclusive_kind};
pub use constraint::{Constraint, ConstraintFields, StringMatcher};
pub use error::{BoltError, BoltResult};
pub use payload::Body;
