//! Configuration validation utilities.

use std::collections::HashSet;

use bolt_framework::build_matcher;

use super::error::{ConfigError, ConfigResult};
use super::schema::{AppConfig, BoltConfig, ListenerConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &BoltConfig) -> ConfigResult<()> {
    validate_app_config(&config.app)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates application settings and every declared listener.
fn validate_app_config(app: &AppConfig) -> ConfigResult<()> {
    if app.name.trim().is_empty() {
        return Err(ConfigError::missing_field("app.name"));
    }

    let mut seen = HashSet::new();
    for listener in &app.listeners {
        if !seen.insert(listener.name.as_str()) {
            return Err(ConfigError::DuplicateListener(listener.name.clone()));
        }
        validate_listener_config(listener, app.async_matchers)?;
    }

    Ok(())
}

/// Validates a declared listener by building its matcher once.
fn validate_listener_config(listener: &ListenerConfig, is_async: bool) -> ConfigResult<()> {
    if listener.name.is_empty() {
        return Err(ConfigError::missing_field("app.listeners.name"));
    }

    let category = listener.parse_category()?;
    let constraint = listener
        .parse_constraint()
        .map_err(|e| ConfigError::invalid_constraint(&listener.name, e))?;
    build_matcher(category, constraint, is_async)
        .map_err(|e| ConfigError::invalid_constraint(&listener.name, e))?;

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for module in logging.filters.keys() {
        if module.is_empty() || module.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: {module:?}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listener(name: &str, category: &str, constraint: serde_json::Value) -> ListenerConfig {
        ListenerConfig {
            name: name.into(),
            category: category.into(),
            constraint,
        }
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&BoltConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_app_name() {
        let mut config = BoltConfig::default();
        config.app.name = "  ".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_validate_unknown_category() {
        let mut config = BoltConfig::default();
        config
            .app
            .listeners
            .push(listener("reactions", "reaction_added", json!("x")));
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_validate_duplicate_listener() {
        let mut config = BoltConfig::default();
        config.app.listeners = vec![
            listener("deploy", "command", json!("/deploy")),
            listener("deploy", "command", json!("/ship")),
        ];
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::DuplicateListener(name)) if name == "deploy"
        ));
    }

    #[test]
    fn test_validate_constraint_shape() {
        let mut config = BoltConfig::default();
        config.app.listeners = vec![listener(
            "shortcut",
            "shortcut",
            json!({"type": "shortcut"}),
        )];
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConstraint { ref listener, .. } if listener == "shortcut"));

        config.app.listeners = vec![listener("numbers", "action", json!(42))];
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn test_validate_well_formed_listeners() {
        let mut config = BoltConfig::default();
        config.app.listeners = vec![
            listener("deploy", "command", json!("/deploy")),
            listener("approve", "block_action", json!({"regex": "^approve_"})),
            listener(
                "plain-messages",
                "event",
                json!({"type": "message", "subtype": null}),
            ),
        ];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = BoltConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("bolt.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
