//! Configuration loader using figment.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. Main config file (`bolt.toml` / `config.toml`, or an explicit [`ConfigLoader::file`])
//! 3. Profile-specific config file next to it (`bolt.{profile}.toml` / `bolt.{profile}.yaml`)
//! 4. Environment variables (`BOLT_*`)
//! 5. Programmatic merges ([`ConfigLoader::merge`])
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables TOML configuration files
//! - `yaml-config`: enables YAML configuration files (`bolt.yaml`, `bolt.yml`, ...)
//!
//! # Environment Variable Mapping
//!
//! Variables use the `BOLT_` prefix with `__` as the nesting separator:
//!
//! - `BOLT_APP__NAME=billing` → `app.name = "billing"`
//! - `BOLT_APP__RAISE_ERROR_FOR_UNHANDLED_REQUEST=true`
//! - `BOLT_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! # Example
//!
//! ```rust,ignore
//! use bolt_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./deploy/bolt.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::BoltConfig;

const ENV_PREFIX: &str = "BOLT_";
const PROFILE_VAR: &str = "BOLT_PROFILE";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name; `prod` and `dev` are accepted as aliases.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `BOLT_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    merges: Vec<BoltConfig>,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            merges: Vec::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    ///
    /// Without any search path the current directory and the user config
    /// directory (`~/.config/bolt` on Linux) are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a full configuration value over every other source.
    pub fn merge(mut self, config: BoltConfig) -> Self {
        self.merges.push(config);
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<BoltConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: BoltConfig = figment.extract()?;

        debug!(
            profile = %profile,
            app = %config.app.name,
            listeners = config.app.listeners.len(),
            logging_level = %config.logging.level,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(BoltConfig::default()));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["PROFILE"])
                    .split("__"),
            );
        }

        for config in self.merges {
            figment = figment.merge(Serialized::defaults(config));
        }

        Ok(figment)
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("bolt"));
        }
        paths
    }

    /// Tries `search_paths × base_names`; the first location holding a base
    /// file or its profile variant ends the search, and the profile variant
    /// is merged over the base file.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let base_path = search_path.join(base_name);
                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                let has_base = base_path.exists();
                let has_profile = profile_path.exists();

                if has_base {
                    info!(path = %base_path.display(), "Loading configuration file");
                    figment = merge_fn(figment, &base_path);
                }
                if has_profile {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }
                if has_base || has_profile {
                    return (figment, true);
                }
            }
        }
        (figment, false)
    }

    #[allow(unused_mut)]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["bolt.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["bolt.yaml", "bolt.yml", "config.yaml", "config.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!(paths = ?search_paths, "No configuration file found, using defaults");
        }
        figment
    }
}

/// Merges a single config file, dispatching on its extension.
fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::ParseError(format!(
            "Unsupported or disabled configuration file format: .{ext}"
        ))),
    }
}

/// Loads configuration from the default locations and environment.
pub fn load_config() -> ConfigResult<BoltConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path`, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<BoltConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        Jail::expect_with(|_| {
            let config = ConfigLoader::new()
                .search_path(".")
                .without_env()
                .load()
                .unwrap();
            assert_eq!(config, BoltConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("prod"), Profile::Production);
        assert_eq!(Profile::parse("DEV"), Profile::Development);
        assert_eq!(Profile::parse("staging"), Profile::Custom("staging".into()));
    }

    #[test]
    fn test_profile_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env(PROFILE_VAR, "production");
            assert_eq!(Profile::from_env(), Profile::Production);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        Jail::expect_with(|_| {
            let err = ConfigLoader::new().file("absent.toml").load().unwrap_err();
            assert!(matches!(err, ConfigError::FileNotFound(_)));
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "bolt.toml",
                r#"
                [app]
                name = "billing"

                [[app.listeners]]
                name = "deploy"
                category = "command"
                constraint = "/deploy"

                [[app.listeners]]
                name = "approve"
                category = "block_action"
                constraint = { regex = "^approve_" }

                [logging]
                level = "warn"
                "#,
            )?;
            jail.set_env("BOLT_APP__RAISE_ERROR_FOR_UNHANDLED_REQUEST", "true");
            jail.set_env("BOLT_LOGGING__LEVEL", "debug");

            let config = ConfigLoader::new().search_path(".").load().unwrap();
            assert_eq!(config.app.name, "billing");
            assert!(config.app.raise_error_for_unhandled_request);
            assert_eq!(config.logging.level, LogLevel::Debug);
            assert_eq!(config.app.listeners.len(), 2);
            assert_eq!(config.app.listeners[0].constraint, "/deploy");
            assert_eq!(config.app.listeners[1].constraint["regex"], "^approve_");
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_overrides_base() {
        Jail::expect_with(|jail| {
            jail.create_file("bolt.production.toml", "[app]\nname = \"prod\"\nasync_matchers = true")?;
            jail.create_file("bolt.toml", "[app]\nname = \"base\"\n\n[logging]\nlevel = \"warn\"")?;

            let config = ConfigLoader::new()
                .profile("prod")
                .search_path(".")
                .without_env()
                .load()
                .unwrap();
            assert_eq!(config.app.name, "prod");
            assert!(config.app.async_matchers);
            assert_eq!(config.logging.level, LogLevel::Warn);
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_without_base() {
        Jail::expect_with(|jail| {
            jail.create_file("bolt.staging.toml", "[app]\nname = \"staging\"")?;

            let config = ConfigLoader::new()
                .profile("staging")
                .search_path(".")
                .without_env()
                .load()
                .unwrap();
            assert_eq!(config.app.name, "staging");
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_env_overrides_profile_and_base() {
        Jail::expect_with(|jail| {
            jail.create_file("bolt.production.toml", "[app]\nname = \"prod\"")?;
            jail.create_file("bolt.toml", "[app]\nname = \"base\"")?;
            jail.set_env("BOLT_APP__NAME", "from-env");

            let config = ConfigLoader::new()
                .profile("production")
                .search_path(".")
                .load()
                .unwrap();
            assert_eq!(config.app.name, "from-env");
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_merge_overrides_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file("bolt.toml", "[app]\nname = \"from-file\"")?;
            jail.set_env("BOLT_APP__NAME", "from-env");

            let mut merged = BoltConfig::default();
            merged.app.name = "from-merge".into();

            let config = ConfigLoader::new()
                .search_path(".")
                .merge(merged)
                .load()
                .unwrap();
            assert_eq!(config.app.name, "from-merge");
            Ok(())
        });
    }

    #[test]
    fn test_later_merge_wins() {
        Jail::expect_with(|_| {
            let mut first = BoltConfig::default();
            first.app.name = "first".into();
            let mut second = BoltConfig::default();
            second.app.name = "second".into();

            let config = ConfigLoader::new()
                .search_path(".")
                .without_env()
                .merge(first)
                .merge(second)
                .load()
                .unwrap();
            assert_eq!(config.app.name, "second");
            Ok(())
        });
    }
}
