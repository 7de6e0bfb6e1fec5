//! Diagnostic logging.
//!
//! runway logs through `tracing`. Applications call [`init_logging`] once,
//! usually via [`crate::run`], to install a subscriber. Logs always go to
//! stderr: stdout carries the command's own output.
//!
//! Priority for the filter (highest first):
//! 1. `RUNWAY_LOG` environment variable (full `EnvFilter` syntax)
//! 2. `logging.level` from `init.yaml`
//! 3. `warn`

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable overriding the configured filter.
pub const LOG_ENV: &str = "RUNWAY_LOG";

/// Logging section of `init.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive: trace, debug, info, warn, error, off, or per-module.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format: text or json.
    #[serde(default)]
    pub format: LogFormat,

    /// ANSI colors in text output.
    #[serde(default)]
    pub color: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            color: false,
        }
    }
}

/// Builds the filter from `RUNWAY_LOG`, falling back to the configured level.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    match std::env::var(LOG_ENV) {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(&directive)
            .map_err(|e| ConfigError::Logging(format!("invalid {}: {}", LOG_ENV, e))),
        _ => EnvFilter::try_new(&config.level)
            .map_err(|e| ConfigError::Logging(format!("invalid level '{}': {}", config.level, e))),
    }
}

/// Installs the global subscriber.
///
/// Returns `Ok(())` if a subscriber is already installed, so calling this more
/// than once (tests, embedded apps) is harmless.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = build_env_filter(config)?;

    let result = match config.format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init(),
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_ansi(config.color)
            .with_target(false)
            .with_writer(io::stderr)
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("subscriber already installed, keeping it");
    }
    Ok(())
}
