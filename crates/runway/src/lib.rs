//! # Runway - a command execution lifecycle for CLI applications
//!
//! Runway owns the part of a CLI that is the same in every tool: read the
//! configuration, parse argv, answer `--help` and `--version`, find the
//! handler the invocation names, run it with the positional arguments, and
//! finalize. The application supplies handlers; everything else is
//! configuration.
//!
//! ## Quick Start
//!
//! ```text
//! myapp/
//! └── config/
//!     ├── init.yaml       # framework settings (optional)
//!     └── command.yaml    # the command surface
//! ```
//!
//! ```yaml
//! # config/command.yaml
//! name: mytool
//! version: 2.1.0
//! handler: main
//! options:
//!   - { name: help, short: h, description: Print help }
//!   - { name: version, description: Print version }
//! arguments:
//!   - { name: file, required: true }
//! ```
//!
//! ```rust,no_run
//! use runway::cli::{Arity, HandlerRegistry};
//!
//! fn main() -> std::process::ExitCode {
//!     let mut handlers = HandlerRegistry::new();
//!     handlers.register_fn("main", Arity::Exact(1), |_app, args| {
//!         println!("processing {}", args[0]);
//!         Ok(())
//!     });
//!     runway::run(env!("CARGO_MANIFEST_DIR"), handlers)
//! }
//! ```
//!
//! ## Building Blocks
//!
//! - [`cli`]: the lifecycle ([`cli::App`]), its configuration and the
//!   swappable parser, help renderer and handler registry
//! - [`events`]: the event bus (re-exported from `runway-events`)
//! - [`global`]: the per-thread shared bus
//! - [`config`] / [`bootstrap`]: `init.yaml` and the application root
//! - [`logging`]: `tracing` subscriber setup
//!
//! Use [`cli::App::builder`] directly when the defaults of [`run`] don't fit,
//! and [`cli::App::run_to_string`] to test a CLI without touching stdout.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod global;
pub mod logging;

pub use runway_events as events;

use bootstrap::Bootstrap;
use cli::{App, AppError, HandlerRegistry, RunOutcome, Strategies};
use std::path::Path;
use std::process::ExitCode;

/// Runs the application rooted at `root_path` against the process argv.
///
/// Loads `config/init.yaml`, installs logging and the shared event bus, then
/// runs one lifecycle. Errors are printed to stderr.
///
/// Exit status: 0 when a handler, help or version ran; 2 when argv did not
/// parse; 1 for any other error.
pub fn run(root_path: impl AsRef<Path>, handlers: HandlerRegistry) -> ExitCode {
    match try_run(root_path.as_ref(), handlers) {
        Ok(outcome) => ExitCode::from(outcome.exit_status()),
        Err(err) => {
            eprintln!("error: {:#}", anyhow::Error::from(err));
            ExitCode::FAILURE
        }
    }
}

fn try_run(root_path: &Path, handlers: HandlerRegistry) -> Result<RunOutcome, AppError> {
    let bootstrap = Bootstrap::new(root_path)?;
    bootstrap.init_logging()?;

    let strategies = Strategies::new();
    let bus = global::install_from_config(bootstrap.config(), strategies.engines())?;

    let mut app = App::builder()
        .bootstrap(bootstrap)
        .handlers(handlers)
        .strategies(strategies)
        .bus(bus)
        .build()?;
    app.execute()
}
