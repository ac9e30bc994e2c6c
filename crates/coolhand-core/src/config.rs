//! Runtime settings.
//!
//! The provider list and streaming content types are compiled in; only the
//! logging behaviour is configurable.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Environment variable for [`Config::silent`].
pub const ENV_SILENT: &str = "COOLHAND_SILENT";
/// Environment variable for [`Config::debug`].
pub const ENV_DEBUG: &str = "COOLHAND_DEBUG";
/// Environment variable for [`Config::log_level`].
pub const ENV_LOG_LEVEL: &str = "COOLHAND_LOG_LEVEL";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Coolhand settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Suppress the per-capture info log line.
    pub silent: bool,
    /// Force debug-level logging.
    pub debug: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            silent: false,
            debug: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from `COOLHAND_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = env_value(ENV_SILENT) {
            config.silent = parse_bool(ENV_SILENT, &value)?;
        }
        if let Some(value) = env_value(ENV_DEBUG) {
            config.debug = parse_bool(ENV_DEBUG, &value)?;
        }
        if let Some(value) = env_value(ENV_LOG_LEVEL) {
            config.log_level = parse_level(&value)?;
        }

        Ok(config)
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets silent mode.
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Sets debug mode.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Returns the level logging should use, honouring `debug`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_level(value: &str) -> Result<String> {
    let level = value.trim().to_ascii_lowercase();
    match level.as_str() {
        "error" | "warn" | "info" | "debug" | "trace" => Ok(level),
        _ => Err(ConfigError::InvalidValue {
            key: ENV_LOG_LEVEL.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var(ENV_SILENT);
        std::env::remove_var(ENV_DEBUG);
        std::env::remove_var(ENV_LOG_LEVEL);
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(!config.silent);
        assert!(!config.debug);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn builder_setters() {
        let config = Config::new()
            .with_silent(true)
            .with_debug(true)
            .with_log_level("warn");
        assert!(config.silent);
        assert!(config.debug);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn debug_overrides_level() {
        let config = Config::new().with_log_level("warn");
        assert_eq!(config.effective_log_level(), "warn");
        assert_eq!(config.with_debug(true).effective_log_level(), "debug");
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = Config::from_json(r#"{"silent": true}"#).unwrap();
        assert!(config.silent);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            Config::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    #[serial]
    fn from_env_defaults_when_unset() {
        clear_env();
        assert_eq!(Config::from_env().unwrap(), Config::default());
    }

    #[test]
    #[serial]
    fn from_env_reads_values() {
        clear_env();
        std::env::set_var(ENV_SILENT, "true");
        std::env::set_var(ENV_DEBUG, "0");
        std::env::set_var(ENV_LOG_LEVEL, "TRACE");

        let config = Config::from_env().unwrap();
        assert!(config.silent);
        assert!(!config.debug);
        assert_eq!(config.log_level, "trace");
        clear_env();
    }

    #[test]
    #[serial]
    fn from_env_rejects_bad_bool() {
        clear_env();
        std::env::set_var(ENV_SILENT, "maybe");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_SILENT));
        clear_env();
    }

    #[test]
    #[serial]
    fn from_env_rejects_bad_level() {
        clear_env();
        std::env::set_var(ENV_LOG_LEVEL, "loud");

        assert!(Config::from_env().is_err());
        clear_env();
    }
}
