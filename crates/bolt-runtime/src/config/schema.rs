//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use bolt_core::{BoltResult, Constraint};
use bolt_framework::ListenerCategory;

use super::error::{ConfigError, ConfigResult};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BoltConfig {
    /// Application settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Application
// =============================================================================

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Name used in logs.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Fail unmatched requests instead of answering them with a 404.
    #[serde(default)]
    pub raise_error_for_unhandled_request: bool,

    /// Build every builtin matcher with the asynchronous scheduling model.
    #[serde(default)]
    pub async_matchers: bool,

    /// Listeners declared in configuration. Handlers are attached by name.
    #[serde(default)]
    pub listeners: Vec<ListenerConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            raise_error_for_unhandled_request: false,
            async_matchers: false,
            listeners: Vec::new(),
        }
    }
}

fn default_app_name() -> String {
    "bolt-app".to_string()
}

/// A listener declared in configuration.
///
/// ```toml
/// [[app.listeners]]
/// name = "approve"
/// category = "block_action"
/// constraint = { regex = "^approve_" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenerConfig {
    /// Listener name; also the key its handler is registered under.
    pub name: String,

    /// Listener category, e.g. `command` or `view_submission`.
    pub category: String,

    /// A string literal, a `{ regex = "..." }` table, or a structured table.
    #[serde(default)]
    pub constraint: Value,
}

impl ListenerConfig {
    /// Parses the category name.
    pub fn parse_category(&self) -> ConfigResult<ListenerCategory> {
        self.category
            .parse()
            .map_err(|_| ConfigError::UnknownCategory {
                listener: self.name.clone(),
                category: self.category.clone(),
            })
    }

    /// Parses the declarative constraint.
    pub fn parse_constraint(&self) -> BoltResult<Constraint> {
        Constraint::from_json(&self.constraint)
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Target file when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module levels, e.g. `bolt_framework = "trace"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = BoltConfig::default();
        assert_eq!(config.app.name, "bolt-app");
        assert!(!config.app.raise_error_for_unhandled_request);
        assert!(config.app.listeners.is_empty());
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.output, LogOutput::Stdout);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: BoltConfig = serde_json::from_value(json!({
            "app": {"raise_error_for_unhandled_request": true},
            "logging": {"level": "debug", "filters": {"bolt_framework": "trace"}}
        }))
        .unwrap();

        assert_eq!(config.app.name, "bolt-app");
        assert!(config.app.raise_error_for_unhandled_request);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.filters["bolt_framework"], LogLevel::Trace);
    }

    #[test]
    fn test_listener_config_parsing() {
        let listener: ListenerConfig = serde_json::from_value(json!({
            "name": "approve",
            "category": "block_action",
            "constraint": {"regex": "^approve_"}
        }))
        .unwrap();

        assert_eq!(
            listener.parse_category().unwrap(),
            ListenerCategory::BlockAction
        );
        assert!(matches!(
            listener.parse_constraint().unwrap(),
            Constraint::Pattern(_)
        ));

        let unknown = ListenerConfig {
            category: "reaction".into(),
            ..listener
        };
        assert!(matches!(
            unknown.parse_category(),
            Err(ConfigError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
        assert_eq!(LogLevel::Trace.to_string(), "trace");
    }
}
