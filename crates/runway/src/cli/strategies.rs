//! Pluggable collaborators, looked up by configured identifier.
//!
//! The lifecycle never names a concrete parser, help renderer or event
//! engine. It asks configuration for an identifier and resolves it here:
//!
//! | Key                         | Default    | Registry             |
//! |-----------------------------|------------|----------------------|
//! | `runway.cli.command_parser` | `clap`     | parsers              |
//! | `runway.cli.help`           | `standard` | help renderers       |
//! | `runway.events.engine`      | `standard` | [`EngineRegistry`]   |
//!
//! An identifier with no registered factory is a configuration error.

use super::error::AppError;
use super::help::{Help, HelpRenderer};
use super::parser::{ClapParser, CommandParser};
use crate::config::{Config, COMMAND_PARSER_KEY, HELP_KEY};
use runway_events::EngineRegistry;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub type ParserFactory = Rc<dyn Fn() -> Box<dyn CommandParser>>;
pub type HelpFactory = Rc<dyn Fn() -> Box<dyn HelpRenderer>>;

/// Factories for every swappable collaborator.
#[derive(Clone)]
pub struct Strategies {
    parsers: HashMap<String, ParserFactory>,
    help: HashMap<String, HelpFactory>,
    engines: EngineRegistry,
}

impl Strategies {
    pub const CLAP_PARSER: &'static str = "clap";
    pub const STANDARD_HELP: &'static str = "standard";

    /// Creates the default set: clap parser, standard help, standard engine.
    pub fn new() -> Self {
        let mut strategies = Self {
            parsers: HashMap::new(),
            help: HashMap::new(),
            engines: EngineRegistry::new(),
        };
        strategies
            .register_parser(Self::CLAP_PARSER, || Box::new(ClapParser::new()))
            .register_help(Self::STANDARD_HELP, || Box::new(Help::new()));
        strategies
    }

    pub fn register_parser<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn CommandParser> + 'static,
    {
        self.parsers.insert(id.into(), Rc::new(factory));
        self
    }

    pub fn register_help<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn HelpRenderer> + 'static,
    {
        self.help.insert(id.into(), Rc::new(factory));
        self
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    pub fn engines_mut(&mut self) -> &mut EngineRegistry {
        &mut self.engines
    }

    /// Builds the parser configured under `runway.cli.command_parser`.
    pub fn parser(&self, config: &Config) -> Result<Box<dyn CommandParser>, AppError> {
        let id = config.get_strategy(COMMAND_PARSER_KEY, Self::CLAP_PARSER);
        match self.parsers.get(&id) {
            Some(factory) => Ok(factory()),
            None => Err(AppError::UnknownStrategy {
                kind: "command parser",
                key: COMMAND_PARSER_KEY.to_string(),
                id,
            }),
        }
    }

    /// Builds the help renderer configured under `runway.cli.help`.
    pub fn help(&self, config: &Config) -> Result<Box<dyn HelpRenderer>, AppError> {
        let id = config.get_strategy(HELP_KEY, Self::STANDARD_HELP);
        match self.help.get(&id) {
            Some(factory) => Ok(factory()),
            None => Err(AppError::UnknownStrategy {
                kind: "help renderer",
                key: HELP_KEY.to_string(),
                id,
            }),
        }
    }
}

impl Default for Strategies {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Strategies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parsers: Vec<&String> = self.parsers.keys().collect();
        parsers.sort();
        let mut help: Vec<&String> = self.help.keys().collect();
        help.sort();
        f.debug_struct("Strategies")
            .field("parsers", &parsers)
            .field("help", &help)
            .field("engines", &self.engines)
            .finish()
    }
}
