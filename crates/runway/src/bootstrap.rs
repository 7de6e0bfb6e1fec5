//! Application bootstrap: root path, configuration, logging.

use crate::config::{Config, ConfigError};
use crate::logging::{init_logging, LoggingConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What an application knows before it parses anything.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    root_path: PathBuf,
    config: Config,
}

impl Bootstrap {
    /// Loads configuration from `<root>/config/init.yaml`.
    pub fn new(root_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root_path = root_path.into();
        let config = Config::load(&root_path)?;
        debug!(root = %root_path.display(), "bootstrapped application");
        Ok(Self { root_path, config })
    }

    /// Uses an already-built configuration.
    pub fn with_config(root_path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root_path: root_path.into(),
            config,
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Installs the subscriber described by the `logging` section.
    pub fn init_logging(&self) -> Result<(), ConfigError> {
        let logging: LoggingConfig = self.config.section("logging")?;
        init_logging(&logging)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_new_loads_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config/init.yaml"), "app:\n  name: demo\n").unwrap();

        let bootstrap = Bootstrap::new(dir.path()).unwrap();
        assert_eq!(bootstrap.root_path(), dir.path());
        assert_eq!(bootstrap.config().get_str("app.name"), Some("demo"));
    }

    #[test]
    fn test_invalid_logging_section() {
        let config = Config::from_yaml_str("logging:\n  format: xml\n").unwrap();
        let bootstrap = Bootstrap::with_config(".", config);
        assert!(matches!(
            bootstrap.init_logging(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
