//! The command execution lifecycle and its collaborators.
//!
//! - [`App`] / [`AppBuilder`]: one run, from argv to finalization
//! - [`CommandConfig`]: the declared command surface
//! - [`CommandParser`] / [`ClapParser`]: argv to options and arguments
//! - [`HelpRenderer`] / [`Help`]: help output
//! - [`Command`] / [`HandlerRegistry`]: application logic by identifier
//! - [`Strategies`]: configured-identifier lookup for the swappable parts
//! - [`events`]: names of the events a run emits

mod app;
mod builder;
mod command_config;
mod error;
pub mod events;
mod handler;
mod help;
mod output;
mod parser;
mod strategies;

pub use app::{App, LifecycleState, RunOutcome};
pub use builder::AppBuilder;
pub use command_config::{ArgumentConfig, CommandConfig, OptionConfig, SubcommandConfig};
pub use error::AppError;
pub use handler::{Arity, Command, CommandFactory, FnCommand, HandlerRegistry};
pub use help::{Help, HelpRenderer};
pub use output::SharedBuffer;
pub use parser::{ClapParser, CommandParser, ParsedCommand, ParsingError};
pub use strategies::{HelpFactory, ParserFactory, Strategies};
