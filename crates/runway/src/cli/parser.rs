//! Command-line parsing.
//!
//! The lifecycle only needs one thing from a parser: turn a [`CommandConfig`]
//! and raw argv into options and positional arguments, or say why it can't.
//! That contract is [`CommandParser`]. [`ClapParser`] is the default
//! implementation and builds a `clap::Command` from the configuration.
//!
//! # Help and Version
//!
//! `help` and `version` are ordinary options as far as the parser is
//! concerned. clap's own `--help`/`--version` handling is disabled so the
//! lifecycle can decide what to do with them.

use super::command_config::{ArgumentConfig, CommandConfig, OptionConfig};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::BTreeMap;
use thiserror::Error;

/// The result of a successful parse.
///
/// Either field may be absent; the lifecycle only installs what is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Resolved options. Flags that were given map to `"true"`.
    pub options: Option<BTreeMap<String, String>>,
    /// Positional arguments in command-line order.
    pub arguments: Option<Vec<String>>,
    /// The subcommand that matched, if any.
    pub subcommand: Option<String>,
}

impl ParsedCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options<I, K, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options = Some(
            options
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = Some(arguments.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_subcommand(mut self, subcommand: impl Into<String>) -> Self {
        self.subcommand = Some(subcommand.into());
        self
    }
}

/// The input did not match the command grammar.
///
/// This is an expected user error: the lifecycle prints it and ends the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParsingError {
    pub message: String,
    /// The subcommand whose grammar rejected the input, `None` for the root.
    pub subcommand: Option<String>,
}

impl ParsingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            subcommand: None,
        }
    }

    pub fn in_subcommand(mut self, subcommand: impl Into<String>) -> Self {
        self.subcommand = Some(subcommand.into());
        self
    }
}

/// Turns argv into a [`ParsedCommand`].
///
/// `argv` includes the program name as its first element, as returned by
/// `std::env::args()`.
pub trait CommandParser {
    fn parse(&self, config: &CommandConfig, argv: &[String]) -> Result<ParsedCommand, ParsingError>;
}

/// The default parser, backed by clap.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClapParser;

impl ClapParser {
    pub fn new() -> Self {
        Self
    }

    /// Builds the clap command tree for `config`.
    pub fn build_command(config: &CommandConfig) -> Command {
        command_tree(config, false)
    }
}

fn command_tree(config: &CommandConfig, lenient: bool) -> Command {
    let mut cmd = grammar(Command::new(config.name.clone()), &config.options, &config.arguments)
        .disable_help_subcommand(true)
        .ignore_errors(lenient);

    for sub in &config.subcommands {
        let mut sub_cmd = grammar(Command::new(sub.name.clone()), &sub.options, &sub.arguments)
            .ignore_errors(lenient);
        if !sub.description.is_empty() {
            sub_cmd = sub_cmd.about(sub.description.clone());
        }
        cmd = cmd.subcommand(sub_cmd);
    }
    if !config.subcommands.is_empty() && !config.arguments.is_empty() {
        cmd = cmd.args_conflicts_with_subcommands(true);
    }
    cmd
}

impl CommandParser for ClapParser {
    fn parse(&self, config: &CommandConfig, argv: &[String]) -> Result<ParsedCommand, ParsingError> {
        // Help wins over missing required arguments, but only when the
        // (sub)command in scope declares it and clap actually matched it.
        if requests_help(config, argv) {
            if let Ok(parsed) = parse_with(config, argv, true) {
                if parsed.options.as_ref().map_or(false, |o| o.contains_key("help")) {
                    return Ok(parsed);
                }
            }
        }
        parse_with(config, argv, false)
    }
}

fn parse_with(
    config: &CommandConfig,
    argv: &[String],
    lenient: bool,
) -> Result<ParsedCommand, ParsingError> {
    let matches = command_tree(config, lenient)
        .try_get_matches_from(argv)
        .map_err(|err| {
            let error = ParsingError::new(clap_message(&err));
            match detect_subcommand(config, argv) {
                Some(sub) => error.in_subcommand(sub),
                None => error,
            }
        })?;

    let mut options = BTreeMap::new();
    let mut arguments = Vec::new();
    collect(&matches, &config.options, &config.arguments, &mut options, &mut arguments);

    let mut parsed = ParsedCommand::new();
    if let Some((name, sub_matches)) = matches.subcommand() {
        if let Some(sub) = config.subcommand_config(name) {
            collect(sub_matches, &sub.options, &sub.arguments, &mut options, &mut arguments);
        }
        parsed = parsed.with_subcommand(name);
    }

    parsed.options = Some(options);
    parsed.arguments = Some(arguments);
    Ok(parsed)
}

fn grammar(mut cmd: Command, options: &[OptionConfig], arguments: &[ArgumentConfig]) -> Command {
    cmd = cmd.disable_help_flag(true).disable_version_flag(true);

    for option in options {
        let mut arg = Arg::new(option.name.clone())
            .long(option.name.clone())
            .required(option.required);
        if let Some(short) = option.short {
            arg = arg.short(short);
        }
        if !option.description.is_empty() {
            arg = arg.help(option.description.clone());
        }
        arg = match &option.value_name {
            Some(value_name) => arg.action(ArgAction::Set).value_name(value_name.clone()),
            None => arg.action(ArgAction::SetTrue),
        };
        cmd = cmd.arg(arg);
    }

    for argument in arguments {
        let mut arg = Arg::new(argument.name.clone()).required(argument.required);
        if !argument.description.is_empty() {
            arg = arg.help(argument.description.clone());
        }
        if argument.repeatable {
            arg = arg.num_args(1..).action(ArgAction::Append);
        }
        cmd = cmd.arg(arg);
    }
    cmd
}

fn collect(
    matches: &ArgMatches,
    options: &[OptionConfig],
    arguments: &[ArgumentConfig],
    out_options: &mut BTreeMap<String, String>,
    out_arguments: &mut Vec<String>,
) {
    for option in options {
        if option.is_flag() {
            if matches.get_flag(&option.name) {
                out_options.insert(option.name.clone(), "true".to_string());
            }
        } else if let Some(value) = matches.get_one::<String>(&option.name) {
            out_options.insert(option.name.clone(), value.clone());
        }
    }

    for argument in arguments {
        if let Some(values) = matches.get_many::<String>(&argument.name) {
            out_arguments.extend(values.cloned());
        }
    }
}

/// First line of clap's rendered error, without the `error: ` prefix.
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default().trim();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

/// True when argv carries a `help` flag declared by the (sub)command it
/// appears under, before any `--`.
fn requests_help(config: &CommandConfig, argv: &[String]) -> bool {
    let mut options = config.options.as_slice();
    let mut at_root = true;
    let mut tokens = argv.iter().skip(1);

    while let Some(token) = tokens.next() {
        if token == "--" {
            return false;
        }
        if let Some(long) = token.strip_prefix("--") {
            let (name, inline_value) = match long.split_once('=') {
                Some((name, _)) => (name, true),
                None => (long, false),
            };
            match options.iter().find(|option| option.name == name) {
                Some(option) if option.is_flag() && option.name == "help" => return true,
                Some(option) if !option.is_flag() && !inline_value => {
                    tokens.next();
                }
                _ => {}
            }
            continue;
        }
        if let Some(cluster) = token.strip_prefix('-').filter(|c| !c.is_empty()) {
            for (at, short) in cluster.char_indices() {
                match options.iter().find(|option| option.short == Some(short)) {
                    Some(option) if option.is_flag() => {
                        if option.name == "help" {
                            return true;
                        }
                    }
                    Some(_) => {
                        // A valued short takes the rest of the token or the next one.
                        if at + short.len_utf8() == cluster.len() {
                            tokens.next();
                        }
                        break;
                    }
                    None => break,
                }
            }
            continue;
        }
        if at_root {
            if let Some(sub) = config.subcommand_config(token) {
                options = &sub.options;
            }
            at_root = false;
        }
    }
    false
}

/// Finds the subcommand named in argv, skipping options and their values.
fn detect_subcommand(config: &CommandConfig, argv: &[String]) -> Option<String> {
    let mut tokens = argv.iter().skip(1);
    while let Some(token) = tokens.next() {
        if token == "--" {
            return None;
        }
        if let Some(long) = token.strip_prefix("--") {
            let takes_value = !long.contains('=')
                && config
                    .option_config(long, None)
                    .map_or(false, |option| !option.is_flag());
            if takes_value {
                tokens.next();
            }
            continue;
        }
        if token.starts_with('-') {
            let takes_value = token.len() == 2
                && config.options.iter().any(|option| {
                    !option.is_flag() && token.chars().nth(1) == option.short
                });
            if takes_value {
                tokens.next();
            }
            continue;
        }
        return config
            .subcommand_config(token)
            .map(|sub| sub.name.clone());
    }
    None
}
