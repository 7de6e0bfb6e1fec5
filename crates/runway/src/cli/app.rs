//! The command execution lifecycle.
//!
//! One [`App`] drives one run:
//!
//! ```text
//! Init ──parse──▶ Parsed ──help──────▶ HelpRequested ────┐
//!   │               ├──version───▶ VersionRequested ───┼──▶ Finalized
//!   │               └──otherwise─▶ Dispatching ────────┘
//!   └──parsing failure──▶ Error
//! ```
//!
//! `Error` is terminal: a parsing failure still finalizes (listeners see
//! `runway.app.finalizing`, output is flushed) but the state stays `Error`.
//!
//! Help and version are answered before any handler is looked up, so they
//! work even when the configured handler is missing. Parsing failures are
//! answered earlier still, with at most one message line and one hint line.
//!
//! # Single-Threaded Design
//!
//! A run is parse → maybe dispatch → finalize, with nothing overlapping. The
//! App shares its event bus through `Rc` and its output through `RefCell`.

use super::builder::AppBuilder;
use super::command_config::CommandConfig;
use super::error::AppError;
use super::events;
use super::output::SharedBuffer;
use super::parser::{ParsedCommand, ParsingError};
use crate::bootstrap::Bootstrap;
use crate::config::Config;
use once_cell::unsync::OnceCell;
use runway_events::EventBus;
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Init,
    Parsed,
    HelpRequested,
    VersionRequested,
    Dispatching,
    Finalized,
    /// The run failed: argv did not parse, or execution returned an error.
    Error,
}

/// How a run ended, when it ended without an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The handler ran to completion.
    Executed,
    /// Help was rendered instead of running a handler.
    HelpRendered,
    /// The version was printed instead of running a handler.
    VersionRendered,
    /// The input did not parse; the error (and maybe a hint) was printed.
    ParsingFailed,
}

impl RunOutcome {
    /// Process exit status for this outcome.
    pub fn exit_status(&self) -> u8 {
        match self {
            RunOutcome::ParsingFailed => 2,
            _ => 0,
        }
    }
}

/// The lifecycle context handed to handlers and renderers.
pub struct App {
    pub(crate) bootstrap: Bootstrap,
    pub(crate) command_config: OnceCell<CommandConfig>,
    pub(crate) argv: Vec<String>,
    pub(crate) options: BTreeMap<String, String>,
    pub(crate) arguments: Vec<String>,
    pub(crate) subcommand: Option<String>,
    pub(crate) handlers: super::HandlerRegistry,
    pub(crate) strategies: super::Strategies,
    pub(crate) bus: Rc<EventBus>,
    pub(crate) output: RefCell<Box<dyn Write>>,
    pub(crate) state: Cell<LifecycleState>,
}

impl App {
    /// Creates a new builder for constructing an App instance.
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn root_path(&self) -> &Path {
        self.bootstrap.root_path()
    }

    pub fn config(&self) -> &Config {
        self.bootstrap.config()
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// The raw argv this run parses, program name first.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    /// The subcommand that matched, if any.
    pub fn subcommand(&self) -> Option<&str> {
        self.subcommand.as_deref()
    }

    /// Returns the command configuration, loading
    /// `<root>/config/command.yaml` on first access if none was supplied.
    pub fn command_config(&self) -> Result<&CommandConfig, AppError> {
        self.command_config.get_or_try_init(|| {
            debug!(root = %self.root_path().display(), "loading command config");
            CommandConfig::load(self.root_path()).map_err(AppError::from)
        })
    }

    /// The output stream for this run (stdout unless replaced).
    ///
    /// Handlers that write through this instead of `println!` can be tested
    /// with [`App::run_to_string`].
    pub fn output(&self) -> RefMut<'_, Box<dyn Write>> {
        self.output.borrow_mut()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Runs the full lifecycle once.
    ///
    /// Help, version and parsing failures end the run early with the matching
    /// [`RunOutcome`]. Configuration errors and handler failures come back as
    /// [`AppError`]; a failing handler skips finalization.
    pub fn execute(&mut self) -> Result<RunOutcome, AppError> {
        let result = self.run_lifecycle();
        if result.is_err() {
            self.transition(LifecycleState::Error);
        }
        result
    }

    fn run_lifecycle(&mut self) -> Result<RunOutcome, AppError> {
        if let Some(outcome) = self.initialize_options_and_arguments()? {
            self.finalize()?;
            return Ok(outcome);
        }
        self.execute_command()?;
        self.finalize()?;
        Ok(RunOutcome::Executed)
    }

    /// Runs the lifecycle with output captured, returning the outcome and
    /// everything written.
    pub fn run_to_string(mut self) -> (Result<RunOutcome, AppError>, String) {
        let buffer = SharedBuffer::new();
        self.output = RefCell::new(Box::new(buffer.clone()));
        let result = self.execute();
        (result, buffer.contents())
    }

    fn transition(&self, next: LifecycleState) {
        debug!(from = ?self.state.get(), to = ?next, "lifecycle transition");
        self.state.set(next);
    }

    fn initialize_options_and_arguments(&mut self) -> Result<Option<RunOutcome>, AppError> {
        let parsed = match self.parse_command()? {
            Ok(parsed) => parsed,
            Err(error) => {
                self.transition(LifecycleState::Error);
                self.bus.emit(
                    events::PARSING_FAILED,
                    &[
                        Value::from(error.message.as_str()),
                        error.subcommand.as_deref().map_or(Value::Null, Value::from),
                    ],
                )?;
                self.render_parsing_error(&error)?;
                return Ok(Some(RunOutcome::ParsingFailed));
            }
        };

        if let Some(options) = parsed.options {
            self.set_options(options);
        }
        if let Some(arguments) = parsed.arguments {
            self.set_arguments(arguments);
        }
        self.subcommand = parsed.subcommand;
        self.transition(LifecycleState::Parsed);
        self.bus
            .emit(events::PARSED, &[self.options_value(), self.arguments_value()])?;

        if self.has_option("help") {
            self.transition(LifecycleState::HelpRequested);
            self.render_help()?;
            return Ok(Some(RunOutcome::HelpRendered));
        }
        if self.has_option("version") {
            self.transition(LifecycleState::VersionRequested);
            self.render_version()?;
            return Ok(Some(RunOutcome::VersionRendered));
        }
        Ok(None)
    }

    fn parse_command(&self) -> Result<Result<ParsedCommand, ParsingError>, AppError> {
        let parser = self.strategies.parser(self.config())?;
        let config = self.command_config()?;
        Ok(parser.parse(config, &self.argv))
    }

    fn set_options(&mut self, options: BTreeMap<String, String>) {
        self.options = options;
    }

    fn set_arguments(&mut self, arguments: Vec<String>) {
        self.arguments = arguments;
    }

    fn execute_command(&self) -> Result<(), AppError> {
        let config = self.command_config()?;
        let id = config.handler_for(self.subcommand()).to_string();
        let factory = self
            .handlers
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::HandlerNotFound(id.clone()))?;

        self.transition(LifecycleState::Dispatching);
        let mut command = factory(self);

        let arity = command.arity();
        if !arity.accepts(self.arguments.len()) {
            return Err(AppError::ArityMismatch {
                handler: id,
                expected: arity,
                actual: self.arguments.len(),
            });
        }

        debug!(handler = %id, arguments = self.arguments.len(), "executing command");
        self.bus.emit(
            events::COMMAND_EXECUTING,
            &[Value::from(id.as_str()), self.arguments_value()],
        )?;
        command.execute(&self.arguments).map_err(AppError::Command)?;
        drop(command);
        self.bus
            .emit(events::COMMAND_EXECUTED, &[Value::from(id.as_str())])?;
        Ok(())
    }

    fn finalize(&self) -> Result<(), AppError> {
        self.bus.emit(events::FINALIZING, &[])?;
        self.output.borrow_mut().flush()?;
        if self.state.get() != LifecycleState::Error {
            self.transition(LifecycleState::Finalized);
        }
        Ok(())
    }

    fn render_help(&self) -> Result<(), AppError> {
        let help = self.strategies.help(self.config())?;
        // Render into a buffer so the renderer may itself use `output()`.
        let mut rendered = Vec::new();
        help.render(self, &mut rendered)?;
        self.output.borrow_mut().write_all(&rendered)?;
        Ok(())
    }

    fn render_version(&self) -> Result<(), AppError> {
        let version = self.command_config()?.version.as_str();
        let mut out = self.output.borrow_mut();
        if version.is_empty() {
            writeln!(out, "undefined")?;
        } else {
            writeln!(out, "{}", version)?;
        }
        Ok(())
    }

    fn render_parsing_error(&self, error: &ParsingError) -> Result<(), AppError> {
        let config = self.command_config()?;
        let mut out = self.output.borrow_mut();
        writeln!(out, "{}", error.message)?;

        let mut name = config.name.clone();
        if let Some(sub) = &error.subcommand {
            name.push(' ');
            name.push_str(sub);
        }
        if config
            .option_config("help", error.subcommand.as_deref())
            .is_some()
        {
            writeln!(out, "See '{} --help'.", name)?;
        }
        Ok(())
    }

    fn options_value(&self) -> Value {
        let map: Map<String, Value> = self
            .options
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();
        Value::Object(map)
    }

    fn arguments_value(&self) -> Value {
        Value::Array(
            self.arguments
                .iter()
                .map(|a| Value::from(a.as_str()))
                .collect(),
        )
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("root_path", &self.root_path())
            .field("state", &self.state.get())
            .field("options", &self.options)
            .field("arguments", &self.arguments)
            .field("subcommand", &self.subcommand)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command_config::SubcommandConfig;
    use crate::cli::{Arity, CommandParser, HelpRenderer, OptionConfig};

    struct Fixed(Result<ParsedCommand, ParsingError>);

    impl CommandParser for Fixed {
        fn parse(&self, _: &CommandConfig, _: &[String]) -> Result<ParsedCommand, ParsingError> {
            self.0.clone()
        }
    }

    fn app_with(parsed: Result<ParsedCommand, ParsingError>, config: CommandConfig) -> App {
        let mut builder = App::builder()
            .command_config(config)
            .args(["mytool"])
            .handler_fn("main", Arity::Any, |_, _| Ok(()));
        builder
            .strategies_mut()
            .register_parser("clap", move || Box::new(Fixed(parsed.clone())));
        builder.build().unwrap()
    }

    #[test]
    fn test_options_only_leaves_arguments_empty() {
        let parsed = ParsedCommand::new().with_options([("verbose", "true")]);
        let mut app = app_with(Ok(parsed), CommandConfig::new("mytool", "main"));

        assert_eq!(app.execute().unwrap(), RunOutcome::Executed);
        assert!(app.arguments().is_empty());
        assert_eq!(app.option("verbose"), Some("true"));
    }

    #[test]
    fn test_arguments_only_leaves_options_empty() {
        let parsed = ParsedCommand::new().with_arguments(["a"]);
        let mut app = app_with(Ok(parsed), CommandConfig::new("mytool", "main"));

        assert_eq!(app.execute().unwrap(), RunOutcome::Executed);
        assert!(app.options().is_empty());
        assert_eq!(app.arguments(), ["a".to_string()]);
    }

    #[test]
    fn test_state_progression() {
        let mut app = app_with(Ok(ParsedCommand::new()), CommandConfig::new("mytool", "main"));
        assert_eq!(app.state(), LifecycleState::Init);
        app.execute().unwrap();
        assert_eq!(app.state(), LifecycleState::Finalized);
    }

    #[test]
    fn test_parsing_failure_without_help_prints_message_only() {
        let error = ParsingError::new("bad input");
        let app = app_with(Err(error), CommandConfig::new("mytool", "main"));
        let (result, output) = app.run_to_string();
        assert_eq!(result.unwrap(), RunOutcome::ParsingFailed);
        assert_eq!(output, "bad input\n");
    }

    #[test]
    fn test_parsing_failure_keeps_error_state_after_finalizing() {
        let finalized = Rc::new(Cell::new(false));
        let seen = finalized.clone();
        let error = ParsingError::new("bad input");
        let mut app = app_with(Err(error), CommandConfig::new("mytool", "main"));
        app.bus().bind(
            events::FINALIZING,
            &runway_events::Callback::new(move |_| {
                seen.set(true);
                Ok(())
            }),
        );

        assert_eq!(app.execute().unwrap(), RunOutcome::ParsingFailed);
        assert!(finalized.get());
        assert_eq!(app.state(), LifecycleState::Error);
    }

    #[test]
    fn test_help_renderer_may_write_through_app_output() {
        struct Chatty;
        impl HelpRenderer for Chatty {
            fn render(&self, app: &App, out: &mut dyn Write) -> std::io::Result<()> {
                writeln!(app.output(), "direct")?;
                writeln!(out, "rendered")
            }
        }

        let parsed = ParsedCommand::new().with_options([("help", "true")]);
        let mut builder = App::builder()
            .command_config(CommandConfig::new("mytool", "main"))
            .args(["mytool", "--help"]);
        builder
            .strategies_mut()
            .register_parser("clap", move || Box::new(Fixed(Ok(parsed.clone()))))
            .register_help("standard", || Box::new(Chatty));

        let (result, output) = builder.build().unwrap().run_to_string();
        assert_eq!(result.unwrap(), RunOutcome::HelpRendered);
        assert_eq!(output, "direct\nrendered\n");
    }

    #[test]
    fn test_handler_failure_leaves_error_state() {
        let mut app = App::builder()
            .command_config(CommandConfig::new("mytool", "main"))
            .args(["mytool"])
            .handler_fn("main", Arity::Any, |_, _| anyhow::bail!("boom"))
            .build()
            .unwrap();
        app.strategies
            .register_parser("clap", || Box::new(Fixed(Ok(ParsedCommand::new()))));

        assert!(matches!(app.execute(), Err(AppError::Command(_))));
        assert_eq!(app.state(), LifecycleState::Error);
    }

    #[test]
    fn test_root_hint_uses_program_name_only() {
        let config = CommandConfig::new("mytool", "main").with_standard_flags();
        let app = app_with(Err(ParsingError::new("unknown flag --xyz")), config);
        let (_, output) = app.run_to_string();
        assert_eq!(output, "unknown flag --xyz\nSee 'mytool --help'.\n");
    }

    #[test]
    fn test_subcommand_handler_override() {
        let config = CommandConfig::new("mytool", "main")
            .subcommand(SubcommandConfig::new("build").handler("build"));
        let parsed = ParsedCommand::new().with_subcommand("build");
        let mut builder = App::builder()
            .command_config(config)
            .args(["mytool", "build"])
            .handler_fn("main", Arity::Any, |_, _| anyhow::bail!("root handler ran"))
            .handler_fn("build", Arity::Any, |app, _| {
                writeln!(app.output(), "building")?;
                Ok(())
            });
        builder
            .strategies_mut()
            .register_parser("clap", move || Box::new(Fixed(Ok(parsed.clone()))));

        let (result, output) = builder.build().unwrap().run_to_string();
        assert_eq!(result.unwrap(), RunOutcome::Executed);
        assert_eq!(output, "building\n");
    }

    #[test]
    fn test_hint_when_help_takes_a_value() {
        let config = CommandConfig::new("mytool", "main").option(OptionConfig::value("help", "topic"));
        let app = app_with(Err(ParsingError::new("nope")), config);
        let (_, output) = app.run_to_string();
        assert_eq!(output, "nope\nSee 'mytool --help'.\n");
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(RunOutcome::Executed.exit_status(), 0);
        assert_eq!(RunOutcome::HelpRendered.exit_status(), 0);
        assert_eq!(RunOutcome::VersionRendered.exit_status(), 0);
        assert_eq!(RunOutcome::ParsingFailed.exit_status(), 2);
    }
}
