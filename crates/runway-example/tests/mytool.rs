use runway::cli::{App, RunOutcome};
use runway::events::{EventBus, EventEngine};
use runway_example::{handlers, CommandLog};
use std::fs;
use std::rc::Rc;

fn run(args: &[&str]) -> (RunOutcome, String) {
    let app = App::builder()
        .root_path(env!("CARGO_MANIFEST_DIR"))
        .handlers(handlers())
        .args(std::iter::once("mytool").chain(args.iter().copied()))
        .build()
        .unwrap();
    let (result, output) = app.run_to_string();
    (result.unwrap(), output)
}

#[test]
fn test_version_from_command_yaml() {
    assert_eq!(run(&["--version"]), (RunOutcome::VersionRendered, "0.1.0\n".into()));
}

#[test]
fn test_build_release() {
    let (outcome, output) = run(&["build", "-r", "--out-dir", "dist", "web"]);
    assert_eq!(outcome, RunOutcome::Executed);
    assert_eq!(output, "building web (release) into dist/release\n");
}

#[test]
fn test_build_help() {
    let (outcome, output) = run(&["build", "--help"]);
    assert_eq!(outcome, RunOutcome::HelpRendered);
    assert!(output.starts_with("Build a target\n"), "output: {output}");
    assert!(output.contains("--out-dir <DIR>"));
}

#[test]
fn test_build_unknown_flag() {
    let (outcome, output) = run(&["build", "web", "--fast"]);
    assert_eq!(outcome, RunOutcome::ParsingFailed);
    assert!(output.ends_with("See 'mytool build --help'.\n"), "output: {output}");
}

#[test]
fn test_summarize_files() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    fs::write(&file, "one\ntwo\nthree\n").unwrap();
    let path = file.to_str().unwrap();

    let (outcome, output) = run(&["-q", path]);
    assert_eq!(outcome, RunOutcome::Executed);
    assert_eq!(output, "3\n");
}

#[test]
fn test_missing_file_fails() {
    let app = App::builder()
        .root_path(env!("CARGO_MANIFEST_DIR"))
        .handlers(handlers())
        .args(["mytool", "/definitely/not/here.txt"])
        .build()
        .unwrap();
    let (result, _) = app.run_to_string();
    let err = result.unwrap_err();
    assert!(format!("{:#}", anyhow::Error::from(err)).contains("failed to read"));
}

#[test]
fn test_command_log_registers_and_removes() {
    let bus = Rc::new(EventBus::new());
    let log = CommandLog::new();
    bus.add_listener(&log);
    bus.remove_listener(&log);
    assert_eq!(
        bus.engine().binding_count(runway::cli::events::COMMAND_EXECUTING),
        0
    );
}
