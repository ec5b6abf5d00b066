//! Integration tests for the warband binary.
//!
//! Spawns the engine on a scenario file and checks the `info` lines it
//! writes to stdout.

use std::io::Write;
use std::process::{Command, Output};

const SKIRMISH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/skirmish.json");

fn run_warband(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_warband"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to start warband")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn scenario_plays_requested_turns() {
    let output = run_warband(&["--scenario", SKIRMISH, "--turns", "3"]);
    assert!(output.status.success());
    let lines = stdout_lines(&output);

    let turns: Vec<&String> = lines.iter().filter(|l| l.starts_with("info turn ")).collect();
    assert!(!turns.is_empty(), "no turn lines in {:?}", lines);
    assert!(turns.len() <= 6, "two factions over three turns at most");
    for line in &turns {
        assert!(line.contains(" moved "), "malformed turn line: {}", line);
        assert!(line.contains(" splits "), "malformed turn line: {}", line);
    }
    assert!(turns[0].starts_with("info turn 1 player Sirians"));

    let last = lines.last().expect("no output");
    assert!(last.starts_with("info result "), "last line was {}", last);
    assert!(last.ends_with(" turns 3") || last.starts_with("info result winner"));
}

#[test]
fn quiet_prints_only_the_result() {
    let output = run_warband(&["--scenario", SKIRMISH, "--turns", "2", "--quiet"]);
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 1, "unexpected output {:?}", lines);
    assert!(lines[0].starts_with("info result "));
}

#[test]
fn same_seed_same_game() {
    let a = run_warband(&["--scenario", SKIRMISH, "--turns", "4", "--seed", "7"]);
    let b = run_warband(&["--scenario", SKIRMISH, "--turns", "4", "--seed", "7"]);
    assert!(a.status.success() && b.status.success());
    assert_eq!(a.stdout, b.stdout);
}

#[test]
fn generated_world_runs_without_scenario() {
    let output = run_warband(&["--turns", "2", "--players", "3", "--seed", "5"]);
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert!(lines.iter().any(|l| l.starts_with("info turn 1 ")));
    assert!(lines.last().map_or(false, |l| l.starts_with("info result ")));
}

#[test]
fn missing_scenario_fails() {
    let output = run_warband(&["--scenario", "/nonexistent/skirmish.json", "--turns", "1"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn malformed_scenario_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"name": "broken", "map": ["..", "..."], "players": []}}"#).unwrap();
    let path = file.path().to_str().unwrap().to_string();
    let output = run_warband(&["--scenario", &path]);
    assert!(!output.status.success());
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let output = run_warband(&["--frobnicate"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn config_file_overrides_turns() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"game": {{"turns": 1}}}}"#).unwrap();
    let path = file.path().to_str().unwrap().to_string();
    let output = run_warband(&["--scenario", SKIRMISH, "--config", &path, "--quiet"]);
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(" turns 1"));
}
