//! AppBuilder for constructing App instances.

use super::app::{App, LifecycleState};
use super::command_config::CommandConfig;
use super::error::AppError;
use super::handler::{Arity, Command, HandlerRegistry};
use super::strategies::Strategies;
use crate::bootstrap::Bootstrap;
use crate::config::{Config, EVENT_ENGINE_KEY};
use once_cell::unsync::OnceCell;
use runway_events::{EngineRegistry, EventBus};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

/// Builder for constructing an App instance.
///
/// Everything is optional. Without a root path the current directory is
/// used; without a command config, `<root>/config/command.yaml` is loaded
/// the first time it is needed; without args, the process argv is parsed.
///
/// # Example
///
/// ```rust
/// use runway::cli::{App, Arity, CommandConfig, RunOutcome};
///
/// let app = App::builder()
///     .command_config(CommandConfig::new("mytool", "main").version("2.1.0").with_standard_flags())
///     .args(["mytool", "--version"])
///     .handler_fn("main", Arity::Any, |_, _| Ok(()))
///     .build()
///     .unwrap();
///
/// let (result, output) = app.run_to_string();
/// assert_eq!(result.unwrap(), RunOutcome::VersionRendered);
/// assert_eq!(output, "2.1.0\n");
/// ```
#[derive(Default)]
pub struct AppBuilder {
    root_path: Option<PathBuf>,
    config: Option<Config>,
    bootstrap: Option<Bootstrap>,
    command_config: Option<CommandConfig>,
    args: Option<Vec<String>>,
    handlers: HandlerRegistry,
    strategies: Strategies,
    bus: Option<Rc<EventBus>>,
    output: Option<Box<dyn Write>>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Application root; `config/` is resolved against it.
    pub fn root_path(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_path = Some(root.into());
        self
    }

    /// Uses this configuration instead of reading `config/init.yaml`.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses an existing bootstrap. Takes precedence over `root_path` and
    /// `config`.
    pub fn bootstrap(mut self, bootstrap: Bootstrap) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    pub fn command_config(mut self, config: CommandConfig) -> Self {
        self.command_config = Some(config);
        self
    }

    /// Arguments to parse, program name first.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the whole handler registry.
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Registers a single handler factory.
    pub fn handler<F>(mut self, id: impl Into<String>, factory: F) -> Self
    where
        F: for<'a> Fn(&'a App) -> Box<dyn Command + 'a> + 'static,
    {
        self.handlers.register(id, factory);
        self
    }

    /// Registers a closure handler.
    pub fn handler_fn<F>(mut self, id: impl Into<String>, arity: Arity, f: F) -> Self
    where
        F: Fn(&App, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.handlers.register_fn(id, arity, f);
        self
    }

    pub fn strategies(mut self, strategies: Strategies) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategies_mut(&mut self) -> &mut Strategies {
        &mut self.strategies
    }

    /// Shares an existing bus instead of building one from the configured
    /// engine.
    pub fn bus(mut self, bus: Rc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Where help, version and parse errors are written. Defaults to stdout.
    pub fn output(mut self, output: impl Write + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    /// Builds the App.
    ///
    /// Fails when `config/init.yaml` cannot be read or the configured event
    /// engine is not registered. The command config is not loaded here.
    pub fn build(self) -> Result<App, AppError> {
        let bootstrap = match (self.bootstrap, self.config) {
            (Some(bootstrap), _) => bootstrap,
            (None, Some(config)) => {
                Bootstrap::with_config(self.root_path.unwrap_or_else(|| PathBuf::from(".")), config)
            }
            (None, None) => Bootstrap::new(self.root_path.unwrap_or_else(|| PathBuf::from(".")))?,
        };

        let bus = match self.bus {
            Some(bus) => bus,
            None => {
                let id = bootstrap
                    .config()
                    .get_strategy(EVENT_ENGINE_KEY, EngineRegistry::STANDARD);
                Rc::new(EventBus::from_engine_id(&id, self.strategies.engines())?)
            }
        };

        let command_config = OnceCell::new();
        if let Some(config) = self.command_config {
            let _ = command_config.set(config);
        }

        Ok(App {
            bootstrap,
            command_config,
            argv: self.args.unwrap_or_else(|| std::env::args().collect()),
            options: BTreeMap::new(),
            arguments: Vec::new(),
            subcommand: None,
            handlers: self.handlers,
            strategies: self.strategies,
            bus,
            output: RefCell::new(self.output.unwrap_or_else(|| Box::new(io::stdout()))),
            state: Cell::new(LifecycleState::Init),
        })
    }
}
