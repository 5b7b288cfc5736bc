//! # Bolt
//!
//! Listener matching and dispatch for Slack-style interaction payloads.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐     ┌────────────┐     ┌──────────────────────────────────┐
//! │   App    │────▶│ Dispatcher │────▶│ Listener "deploy"  [matchers...] │──▶ handler
//! │ (config) │     │            │────▶│ Listener "approve" [matchers...] │──▶ handler
//! └──────────┘     └────────────┘     └──────────────────────────────────┘
//! ```
//!
//! - **Classifier** (`bolt-core`): decides which kinds a payload belongs to
//! - **Matchers**: one builtin builder per listener category, plus custom
//!   predicates with extractor parameters
//! - **Dispatcher**: first listener whose matchers all pass runs its handler
//! - **App** (`bolt-runtime`): registration API, configuration, logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bolt::prelude::*;
//!
//! async fn deploy(body: Arc<Body>, logger: Logger) -> String {
//!     logger.info("deploying");
//!     format!("deploying {}", body["text"])
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::new();
//!     app.command("/deploy", deploy)?
//!         .block_action(Constraint::pattern("^approve_")?, approve)?;
//!
//!     let response = app.dispatch_json(&raw_body).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `command` *(default)*: `CommandArgs<T>` for clap-parsed slash command text
//! - `toml-config` *(default)* / `yaml-config`: configuration file formats
//! - `json-log`: JSON log output

pub use bolt_core as core;
pub use bolt_framework as framework;
pub use bolt_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use bolt::prelude::*;
/// ```
pub mod prelude {
    // Application
    pub use bolt_runtime::{App, AppBuilder, BoltConfig, HandlerMap, RuntimeError};

    // Constraints and payload kinds
    pub use bolt_core::{
        BoltError, Constraint, ConstraintFields, PayloadKind, StringMatcher, classify,
    };

    // Requests, responses and handler parameters
    pub use bolt_framework::{
        BoltRequest, BoltResponse, IntoResponse, Listener, Logger, RequestContext, into_handler,
    };

    // Matchers
    pub use bolt_framework::{
        BoxedMatcher, ListenerCategory, ListenerMatcher, async_matcher, build_matcher,
        sync_matcher,
    };

    // Tower integration
    pub use bolt_framework::{ServiceBuilderExt, on};

    #[cfg(feature = "command")]
    pub use bolt_framework::CommandArgs;

    pub use bolt_core::Body;
    pub use std::sync::Arc;
}
