//! Configuration for Bolt applications.
//!
//! Layered loading through figment (defaults, TOML/YAML files, `BOLT_*`
//! environment variables) plus validation of declared listeners.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    AppConfig, BoltConfig, ListenerConfig, LogFormat, LogLevel, LogOutput, LoggingConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
