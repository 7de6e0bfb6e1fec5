//! Key-value application configuration.
//!
//! Configuration lives in `<root>/config/init.yaml`. Keys are addressed with
//! dots, so `runway.cli.help` reads:
//!
//! ```yaml
//! runway:
//!   cli:
//!     help: standard
//! ```
//!
//! A literal dotted key at the top level (`runway.cli.help: standard`) is
//! honored as well and wins over the nested form.
//!
//! The lifecycle mostly uses configuration to pick strategies: which parser,
//! which help renderer, which event engine. See [`Config::get_strategy`].

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Strategy key for the command parser.
pub const COMMAND_PARSER_KEY: &str = "runway.cli.command_parser";
/// Strategy key for the help renderer.
pub const HELP_KEY: &str = "runway.cli.help";
/// Strategy key for the event engine.
pub const EVENT_ENGINE_KEY: &str = "runway.events.engine";

/// Errors raised while loading or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for '{key}': {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Returns the directory holding configuration files under `root`.
pub fn config_dir(root: &Path) -> PathBuf {
    root.join("config")
}

/// Reads a YAML file, mapping I/O and parse failures to [`ConfigError`].
pub(crate) fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        origin: path.display().to_string(),
        source,
    })
}

/// Dotted-key configuration store.
#[derive(Debug, Clone, Default)]
pub struct Config {
    root: Mapping,
}

impl Config {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `<root>/config/init.yaml`. A missing file yields an empty config.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = config_dir(root).join("init.yaml");
        if !path.exists() {
            debug!(path = %path.display(), "no init config, using defaults");
            return Ok(Self::new());
        }
        let value: Value = read_yaml(&path)?;
        Ok(Self::from_value(value))
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            origin: "<inline>".to_string(),
            source,
        })?;
        Ok(Self::from_value(value))
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Mapping(root) => Self { root },
            _ => Self::new(),
        }
    }

    /// Looks up a dotted key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.root.get(key) {
            return Some(value);
        }

        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_mapping()?.get(segment)?;
        }
        Some(current)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Returns the strategy identifier configured under `key`, or `default`.
    ///
    /// Empty strings count as unset.
    pub fn get_strategy(&self, key: &str, default: &str) -> String {
        match self.get_str(key) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => default.to_string(),
        }
    }

    /// Sets a dotted key, creating intermediate mappings as needed.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let segments: Vec<&str> = key.split('.').collect();
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return,
        };

        let mut current = &mut self.root;
        for segment in parents {
            let entry = current
                .entry(Value::from(*segment))
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            if !entry.is_mapping() {
                *entry = Value::Mapping(Mapping::new());
            }
            current = match entry {
                Value::Mapping(map) => map,
                _ => return,
            };
        }
        current.insert(Value::from(*last), value.into());
    }

    /// Deserializes the subtree at `key`, or returns `T::default()` if absent.
    pub fn section<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default,
    {
        match self.get(key) {
            Some(value) => {
                serde_yaml::from_value(value.clone()).map_err(|source| ConfigError::InvalidValue {
                    key: key.to_string(),
                    source,
                })
            }
            None => Ok(T::default()),
        }
    }
}
