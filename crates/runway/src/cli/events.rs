//! Event names emitted by the lifecycle.
//!
//! Arguments are positional `serde_json::Value`s, listed per event.

/// After a successful parse. Args: options object, arguments array.
pub const PARSED: &str = "runway.cli.parsed";

/// After the parser rejected the input, before the message is printed.
/// Args: message, subcommand name or null.
pub const PARSING_FAILED: &str = "runway.cli.parsing_failed";

/// Right before the handler runs. Args: handler id, arguments array.
pub const COMMAND_EXECUTING: &str = "runway.cli.command.executing";

/// After the handler returned successfully. Args: handler id.
pub const COMMAND_EXECUTED: &str = "runway.cli.command.executed";

/// At the start of finalization, on every path that finalizes. No args.
pub const FINALIZING: &str = "runway.app.finalizing";
