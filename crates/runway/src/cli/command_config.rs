//! Declarative description of the command tree.
//!
//! A [`CommandConfig`] names the program, its version, the handler that runs
//! it, and the options and positional arguments the parser should accept. It
//! is normally loaded from `<root>/config/command.yaml`:
//!
//! ```yaml
//! name: mytool
//! version: 2.1.0
//! handler: main
//! options:
//!   - name: help
//!     short: h
//!     description: Print help
//!   - name: version
//!     description: Print version
//! subcommands:
//!   - name: build
//!     handler: build
//!     options:
//!       - name: help
//!       - name: release
//!     arguments:
//!       - name: target
//!         required: true
//! ```
//!
//! The builder methods produce the same structure in code.

use crate::config::{config_dir, read_yaml, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A named option (`--name`, optionally `-s`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionConfig {
    pub name: String,
    #[serde(default)]
    pub short: Option<char>,
    #[serde(default)]
    pub description: String,
    /// Placeholder for the option's value. Options without one are flags.
    #[serde(default)]
    pub value_name: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl OptionConfig {
    /// A boolean flag.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short: None,
            description: String::new(),
            value_name: None,
            required: false,
        }
    }

    /// An option taking a value.
    pub fn value(name: impl Into<String>, value_name: impl Into<String>) -> Self {
        Self {
            value_name: Some(value_name.into()),
            ..Self::flag(name)
        }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Returns true if the option is a flag (takes no value).
    pub fn is_flag(&self) -> bool {
        self.value_name.is_none()
    }
}

/// A positional argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    /// Accepts one or more values. Only meaningful for the last argument.
    #[serde(default)]
    pub repeatable: bool,
}

impl ArgumentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required: false,
            repeatable: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }
}

/// A subcommand with its own grammar and, optionally, its own handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcommandConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Handler identifier; falls back to the root handler when absent.
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionConfig>,
    #[serde(default)]
    pub arguments: Vec<ArgumentConfig>,
}

impl SubcommandConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            handler: None,
            options: Vec::new(),
            arguments: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn option(mut self, option: OptionConfig) -> Self {
        self.options.push(option);
        self
    }

    pub fn argument(mut self, argument: ArgumentConfig) -> Self {
        self.arguments.push(argument);
        self
    }
}

/// The command tree for one program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub name: String,
    /// Empty means "undefined".
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Handler identifier for the root command.
    pub handler: String,
    #[serde(default)]
    pub options: Vec<OptionConfig>,
    #[serde(default)]
    pub arguments: Vec<ArgumentConfig>,
    #[serde(default)]
    pub subcommands: Vec<SubcommandConfig>,
}

impl CommandConfig {
    pub fn new(name: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            description: String::new(),
            handler: handler.into(),
            options: Vec::new(),
            arguments: Vec::new(),
            subcommands: Vec::new(),
        }
    }

    /// Loads `<root>/config/command.yaml`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        read_yaml(&config_dir(root).join("command.yaml"))
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn option(mut self, option: OptionConfig) -> Self {
        self.options.push(option);
        self
    }

    pub fn argument(mut self, argument: ArgumentConfig) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn subcommand(mut self, subcommand: SubcommandConfig) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// Adds the conventional `-h/--help` and `--version` flags to the root.
    pub fn with_standard_flags(self) -> Self {
        self.option(OptionConfig::flag("help").short('h').description("Print help"))
            .option(OptionConfig::flag("version").description("Print version"))
    }

    /// Finds a subcommand by name.
    pub fn subcommand_config(&self, name: &str) -> Option<&SubcommandConfig> {
        self.subcommands.iter().find(|sub| sub.name == name)
    }

    /// Finds the option `name` on the root (`subcommand == None`) or on the
    /// named subcommand.
    pub fn option_config(&self, name: &str, subcommand: Option<&str>) -> Option<&OptionConfig> {
        let options = match subcommand {
            None => &self.options,
            Some(sub) => &self.subcommand_config(sub)?.options,
        };
        options.iter().find(|option| option.name == name)
    }

    /// Handler identifier for the root or the named subcommand.
    pub fn handler_for(&self, subcommand: Option<&str>) -> &str {
        subcommand
            .and_then(|name| self.subcommand_config(name))
            .and_then(|sub| sub.handler.as_deref())
            .unwrap_or(&self.handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample() -> CommandConfig {
        CommandConfig::new("mytool", "main")
            .with_standard_flags()
            .subcommand(
                SubcommandConfig::new("build")
                    .handler("build")
                    .option(OptionConfig::flag("help")),
            )
            .subcommand(SubcommandConfig::new("clean"))
    }

    #[test]
    fn test_option_config_root_and_subcommand() {
        let config = sample();
        assert!(config.option_config("help", None).is_some());
        assert!(config.option_config("help", Some("build")).is_some());
        assert!(config.option_config("help", Some("clean")).is_none());
        assert!(config.option_config("help", Some("missing")).is_none());
        assert!(config.option_config("verbose", None).is_none());
    }

    #[test]
    fn test_handler_for() {
        let config = sample();
        assert_eq!(config.handler_for(None), "main");
        assert_eq!(config.handler_for(Some("build")), "build");
        assert_eq!(config.handler_for(Some("clean")), "main");
        assert_eq!(config.handler_for(Some("missing")), "main");
    }

    #[test]
    fn test_option_builders() {
        let flag = OptionConfig::flag("verbose").short('v');
        assert!(flag.is_flag());
        assert_eq!(flag.short, Some('v'));

        let value = OptionConfig::value("output", "file").required(true);
        assert!(!value.is_flag());
        assert!(value.required);
    }

    #[test]
    fn test_deserialize_defaults() {
        let yaml = "name: mytool\nhandler: main\noptions:\n  - name: help\n";
        let config: CommandConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.version, "");
        assert!(config.subcommands.is_empty());
        assert!(config.option_config("help", None).unwrap().is_flag());
    }

    #[test]
    fn test_load_from_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(
            dir.path().join("config/command.yaml"),
            "name: mytool\nversion: 2.1.0\nhandler: main\nsubcommands:\n  - name: build\n",
        )
        .unwrap();

        let config = CommandConfig::load(dir.path()).unwrap();
        assert_eq!(config.name, "mytool");
        assert_eq!(config.version, "2.1.0");
        assert!(config.subcommand_config("build").is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CommandConfig::load(dir.path()),
            Err(ConfigError::Io { .. })
        ));
    }
}
