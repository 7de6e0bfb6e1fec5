use runway_example::{handlers, CommandLog};
use std::process::ExitCode;

fn main() -> ExitCode {
    runway::global::add_listener(&CommandLog::new());
    runway::run(env!("CARGO_MANIFEST_DIR"), handlers())
}
