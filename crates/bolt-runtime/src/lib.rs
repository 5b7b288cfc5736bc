//! Bolt Runtime - application layer for the Bolt listener framework.
//!
//! This crate provides:
//! - [`App`], the registration API over the listener dispatcher
//! - Layered configuration (`bolt.toml`, `BOLT_*` environment variables)
//!   including listeners declared in configuration
//! - Logging setup through `tracing-subscriber`
//!
//! ```ignore
//! use bolt_runtime::App;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::builder().handler("deploy", deploy).build()?;
//!     app.view_submission("settings_modal", save_settings)?;
//!
//!     let response = app.dispatch_json(&raw_body).await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::{App, AppBuilder, HandlerMap};
pub use config::{
    AppConfig, BoltConfig, ConfigError, ConfigLoader, ConfigResult, ListenerConfig, LoggingConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

pub use tracing;
pub use tracing_subscriber;

/// Logging macros for handlers and custom matchers.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
