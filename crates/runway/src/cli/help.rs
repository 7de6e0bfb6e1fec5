//! Help rendering.
//!
//! When a run carries the `help` option the lifecycle hands the [`App`] to a
//! [`HelpRenderer`] and stops. The renderer reads the command configuration
//! and, if a subcommand matched, describes that subcommand instead of the
//! root.

use super::app::App;
use super::command_config::{ArgumentConfig, OptionConfig, SubcommandConfig};
use std::io::{self, Write};

/// Writes help text for the current run.
pub trait HelpRenderer {
    fn render(&self, app: &App, out: &mut dyn Write) -> io::Result<()>;
}

/// Plain-text help: usage line, then arguments, options and commands.
///
/// ```text
/// Usage: mytool build [OPTIONS] [TARGETS]...
///
/// Arguments:
///   [TARGETS]...  Targets to build
///
/// Options:
///   -h, --help     Print help
///   -r, --release  Optimized build
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Help;

impl Help {
    pub fn new() -> Self {
        Self
    }
}

impl HelpRenderer for Help {
    fn render(&self, app: &App, out: &mut dyn Write) -> io::Result<()> {
        let config = app
            .command_config()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

        let sub = app.subcommand().and_then(|name| config.subcommand_config(name));
        let (program, description, options, arguments) = match sub {
            Some(sub) => (
                format!("{} {}", config.name, sub.name),
                sub.description.as_str(),
                sub.options.as_slice(),
                sub.arguments.as_slice(),
            ),
            None => (
                config.name.clone(),
                config.description.as_str(),
                config.options.as_slice(),
                config.arguments.as_slice(),
            ),
        };
        let subcommands: &[SubcommandConfig] = if sub.is_none() {
            config.subcommands.as_slice()
        } else {
            &[]
        };

        if !description.is_empty() {
            writeln!(out, "{}", description)?;
            writeln!(out)?;
        }

        let mut usage = format!("Usage: {}", program);
        if !options.is_empty() {
            usage.push_str(" [OPTIONS]");
        }
        for argument in arguments {
            usage.push(' ');
            usage.push_str(&argument_label(argument));
        }
        if !subcommands.is_empty() {
            usage.push_str(" <COMMAND>");
        }
        writeln!(out, "{}", usage)?;

        if !arguments.is_empty() {
            let rows: Vec<(String, &str)> = arguments
                .iter()
                .map(|a| (argument_label(a), a.description.as_str()))
                .collect();
            write_section(out, "Arguments", &rows)?;
        }
        if !options.is_empty() {
            let rows: Vec<(String, &str)> = options
                .iter()
                .map(|o| (option_label(o), o.description.as_str()))
                .collect();
            write_section(out, "Options", &rows)?;
        }
        if !subcommands.is_empty() {
            let rows: Vec<(String, &str)> = subcommands
                .iter()
                .map(|s| (s.name.clone(), s.description.as_str()))
                .collect();
            write_section(out, "Commands", &rows)?;
        }
        Ok(())
    }
}

fn argument_label(argument: &ArgumentConfig) -> String {
    let name = argument.name.to_uppercase();
    let label = if argument.required {
        format!("<{}>", name)
    } else {
        format!("[{}]", name)
    };
    if argument.repeatable {
        format!("{}...", label)
    } else {
        label
    }
}

fn option_label(option: &OptionConfig) -> String {
    let mut label = match option.short {
        Some(short) => format!("-{}, --{}", short, option.name),
        None => format!("    --{}", option.name),
    };
    if let Some(value_name) = &option.value_name {
        label.push_str(&format!(" <{}>", value_name.to_uppercase()));
    }
    label
}

fn write_section(out: &mut dyn Write, title: &str, rows: &[(String, &str)]) -> io::Result<()> {
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    writeln!(out)?;
    writeln!(out, "{}:", title)?;
    for (label, description) in rows {
        if description.is_empty() {
            writeln!(out, "  {}", label)?;
        } else {
            writeln!(out, "  {:<width$}  {}", label, description, width = width)?;
        }
    }
    Ok(())
}
