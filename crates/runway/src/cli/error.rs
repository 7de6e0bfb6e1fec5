//! Errors surfaced by the lifecycle.
//!
//! User-input errors never show up here: a [`ParsingError`](super::ParsingError)
//! is printed and the run ends with [`RunOutcome::ParsingFailed`](super::RunOutcome).
//! Everything in [`AppError`] is either a configuration mistake or a failure
//! from code the lifecycle called into, and reaches the caller unchanged.

use super::handler::Arity;
use crate::config::ConfigError;
use runway_events::EventError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The configured handler identifier has no registered factory.
    #[error("command handler '{0}' does not exist")]
    HandlerNotFound(String),

    /// The handler does not accept the number of positional arguments given.
    #[error("command handler '{handler}' expects {expected} arguments, got {actual}")]
    ArityMismatch {
        handler: String,
        expected: Arity,
        actual: usize,
    },

    /// A configured strategy identifier has no registered factory.
    #[error("no {kind} registered as '{id}' (configured by '{key}')")]
    UnknownStrategy {
        kind: &'static str,
        key: String,
        id: String,
    },

    /// The handler's entry operation failed.
    #[error(transparent)]
    Command(anyhow::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}
