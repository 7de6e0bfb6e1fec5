//! Handlers and listeners for the `mytool` demo.
//!
//! `mytool [FILES]...` prints a line count per file; `mytool build <TARGET>`
//! pretends to build a target. The command surface lives in
//! `config/command.yaml`.

use anyhow::Context;
use runway::cli::{events, App, Arity, Command, HandlerRegistry};
use runway::events::{Callback, EventBinding, Listener};
use std::fs;
use std::io::Write;
use tracing::info;

/// Every handler `config/command.yaml` refers to.
pub fn handlers() -> HandlerRegistry {
    let mut handlers = HandlerRegistry::new();
    handlers
        .register_fn("main", Arity::Any, summarize)
        .register("build", |app| Box::new(Build { app }));
    handlers
}

fn summarize(app: &App, files: &[String]) -> anyhow::Result<()> {
    let quiet = app.has_option("quiet");
    let mut out = app.output();
    if files.is_empty() && !quiet {
        writeln!(out, "nothing to summarize")?;
    }
    for file in files {
        let content =
            fs::read_to_string(file).with_context(|| format!("failed to read {}", file))?;
        let lines = content.lines().count();
        if quiet {
            writeln!(out, "{}", lines)?;
        } else {
            writeln!(out, "{}: {} lines", file, lines)?;
        }
    }
    Ok(())
}

struct Build<'a> {
    app: &'a App,
}

impl Command for Build<'_> {
    fn execute(&mut self, arguments: &[String]) -> anyhow::Result<()> {
        let target = &arguments[0];
        let profile = if self.app.has_option("release") {
            "release"
        } else {
            "debug"
        };
        let out_dir = self.app.option("out-dir").unwrap_or("target");
        writeln!(
            self.app.output(),
            "building {} ({}) into {}/{}",
            target,
            profile,
            out_dir,
            profile
        )?;
        Ok(())
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }
}

/// Logs command start and end at info level.
#[derive(Debug, Clone)]
pub struct CommandLog {
    executing: Callback,
    executed: Callback,
}

impl CommandLog {
    pub fn new() -> Self {
        Self {
            executing: Callback::new(|args| {
                info!(handler = %args[0], arguments = %args[1], "command starting");
                Ok(())
            }),
            executed: Callback::new(|args| {
                info!(handler = %args[0], "command finished");
                Ok(())
            }),
        }
    }
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for CommandLog {
    fn event_bindings(&self) -> Vec<EventBinding> {
        vec![
            EventBinding::new(events::COMMAND_EXECUTING, self.executing.clone()),
            EventBinding::new(events::COMMAND_EXECUTED, self.executed.clone()),
        ]
    }
}
