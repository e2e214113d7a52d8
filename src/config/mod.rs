/// Unified configuration system
///
/// TOML/JSON configuration files, environment variable overrides and validation
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub mod commands;
pub mod consumer;

pub use commands::CommandConfig;
pub use consumer::ConsumerConfig;

/// Bridge configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File read error
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// Parse error
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// Validation error
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Bridge main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Command serialisation
    #[serde(default)]
    pub commands: CommandConfig,

    /// Native consumer thread
    #[serde(default)]
    pub consumer: ConsumerConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save as a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// Override configuration from environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("BRIDGE_LOG_LEVEL") {
            if let Ok(level) = val.parse() {
                self.logging.level = level;
            }
        }
        if let Ok(val) = env::var("BRIDGE_NUMBER_PRECISION") {
            if let Ok(precision) = val.parse() {
                self.commands.number_precision = precision;
            }
        }
        if let Ok(val) = env::var("BRIDGE_CONSUMER_BATCH_SIZE") {
            if let Ok(batch_size) = val.parse() {
                self.consumer.batch_size = batch_size;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        self.commands.validate()?;
        self.consumer.validate()?;
        Ok(())
    }

    /// Find and load a configuration file
    ///
    /// Lookup order:
    /// 1. ./bridge.toml
    /// 2. ./bridge.json
    /// 3. defaults
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::from_toml_file("bridge.toml") {
            tracing::debug!(target: "bridge::config", "Loaded config from bridge.toml");
            return config;
        }

        if let Ok(config) = Self::from_json_file("bridge.json") {
            tracing::debug!(target: "bridge::config", "Loaded config from bridge.json");
            return config;
        }

        tracing::debug!(target: "bridge::config", "Using default configuration");
        Self::default()
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is not set
    pub level: LogLevel,

    /// Whether to log to the console
    pub log_to_console: bool,
}

use crate::impl_default;

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    log_to_console: true,
});

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::ParseError(format!("unknown log level '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.commands.number_precision, 6);
        assert_eq!(config.consumer.batch_size, 256);
    }

    #[test]
    fn test_toml_serialization() {
        let config = BridgeConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: BridgeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BridgeConfig::from_toml_str(
            r#"
            [consumer]
            batch_size = 8

            [logging]
            level = "Debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.consumer.batch_size, 8);
        assert_eq!(config.consumer.thread_name, "ui-command-consumer");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.commands.number_precision, 6);
    }

    #[test]
    fn test_json_parse_error() {
        let err = BridgeConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validation_rejects_zero_batch() {
        let mut config = BridgeConfig::default();
        config.consumer.batch_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Trace.as_directive(), "trace");
    }
}
