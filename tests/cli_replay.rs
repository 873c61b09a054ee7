//! End-to-end CLI tests.
//!
//! These invoke the compiled `testlens` binary against recorded event streams
//! written into a temp directory.

mod common;

use common::TelemetryHarness;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::process::Command;

struct CliResult {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

fn run_cli(harness: &TelemetryHarness, args: &[&str]) -> CliResult {
    run_cli_with_env(harness, args, &[])
}

fn run_cli_with_env(
    harness: &TelemetryHarness,
    args: &[&str],
    env: &[(&str, String)],
) -> CliResult {
    let mut command = Command::new(PathBuf::from(env!("CARGO_BIN_EXE_testlens")));
    command
        .args(args)
        .env_remove("TESTLENS_LOG_LEVEL")
        .env_remove("TESTLENS_LOG_TO_FILE")
        .env_remove("TESTLENS_LOG_FILE")
        .env_remove("RUST_LOG");
    for (key, value) in env {
        command.env(key, value);
    }
    let output = command
        .current_dir(harness.temp_dir())
        .output()
        .expect("run testlens");

    CliResult {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

fn write_events(harness: &TelemetryHarness, lines: &[&str]) -> String {
    let path = harness.temp_path("events.jsonl");
    std::fs::write(&path, lines.join("\n")).expect("write events");
    path.display().to_string()
}

#[test]
fn replay_passing_run_exits_zero() {
    let harness = TelemetryHarness::new("replay_passing_run_exits_zero");
    let events = write_events(
        &harness,
        &[
            r#"{"event":"suiteBegin","title":"Login"}"#,
            r#"{"event":"testBegin","suite":"Login","test":"A"}"#,
            r#"{"event":"testEnd","suite":"Login","test":"A","status":"passed"}"#,
            r#"{"event":"runEnd","status":"passed"}"#,
        ],
    );

    let result = run_cli(
        &harness,
        &["replay", &events, "--no-color", "--no-timestamps"],
    );

    assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
    assert!(result.stdout.contains("ℹ️ [TestLifecycle] ✅ Test passed: A"));
    assert!(
        result
            .stdout
            .contains("Total: 1 | Passed: 1 | Failed: 0 | Skipped: 0")
    );
}

#[test]
fn replay_failing_run_exits_non_zero_and_writes_summary() {
    let harness = TelemetryHarness::new("replay_failing_run_exits_non_zero_and_writes_summary");
    let events = write_events(
        &harness,
        &[
            r#"{"event":"testBegin","suite":"Cart","test":"checkout"}"#,
            r#"{"event":"testEnd","suite":"Cart","test":"checkout","status":"failed","error":"boom"}"#,
            r#"{"event":"runEnd","status":"failed"}"#,
        ],
    );
    let summary_path = harness.temp_path("summary.json");
    let log_path = harness.temp_path("run.log");

    let result = run_cli(
        &harness,
        &[
            "replay",
            &events,
            "--level",
            "warn",
            "--no-color",
            "--log-file",
            &log_path.display().to_string(),
            "--summary-json",
            &summary_path.display().to_string(),
        ],
    );

    assert_eq!(result.exit_code, 1, "stderr: {}", result.stderr);
    assert!(!result.stdout.contains("Test started"));
    assert!(result.stderr.contains("❌ Test failed: checkout"));
    assert!(result.stderr.contains("1 test(s) failed in Cart"));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(summary["status"], "failed");
    assert_eq!(summary["totals"]["failed"], 1);
    assert_eq!(summary["failures"][0]["error"], "boom");

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains(" ERROR [TestLifecycle] ❌ Test failed: checkout"));
    assert!(!log.contains(" INFO "));
}

#[test]
fn environment_overrides_apply_on_first_use() {
    let harness = TelemetryHarness::new("environment_overrides_apply_on_first_use");
    let title = "x".repeat(300);
    let begin = format!(r#"{{"event":"testBegin","suite":"Cart","test":"{title}"}}"#);
    let end = format!(
        r#"{{"event":"testEnd","suite":"Cart","test":"{title}","status":"failed","error":"boom"}}"#
    );
    let events = write_events(
        &harness,
        &[
            begin.as_str(),
            end.as_str(),
            r#"{"event":"runEnd","status":"failed"}"#,
        ],
    );
    let log_path = harness.temp_path("env.log");

    let result = run_cli_with_env(
        &harness,
        &["replay", &events, "--no-color"],
        &[
            ("TESTLENS_LOG_LEVEL", "ERROR".to_string()),
            ("TESTLENS_LOG_TO_FILE", "1".to_string()),
            ("TESTLENS_LOG_FILE", log_path.display().to_string()),
        ],
    );

    assert_eq!(result.exit_code, 1, "stderr: {}", result.stderr);
    assert!(result.stdout.is_empty(), "stdout: {}", result.stdout);
    assert!(!result.stderr.contains("1 test(s) failed in Cart"));

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(!log.contains(" INFO "));
    assert!(!log.contains(" WARN "));
    assert!(log.contains(" ERROR [TestRunner] 1 failed test attempt(s); exiting with failure"));
    // Longer than the 200-character default, within the runner's 500.
    assert!(log.contains(&format!("❌ Test failed: {title} (")));
}

#[test]
fn replay_rejects_malformed_stream() {
    let harness = TelemetryHarness::new("replay_rejects_malformed_stream");
    let events = write_events(&harness, &[r#"{"event":"suiteBegin","title":"A"}"#, "not json"]);

    let result = run_cli(&harness, &["replay", &events]);

    assert_ne!(result.exit_code, 0);
    assert!(result.stderr.contains("line 2"), "stderr: {}", result.stderr);
}

#[test]
fn levels_lists_every_threshold() {
    let harness = TelemetryHarness::new("levels_lists_every_threshold");
    let result = run_cli(&harness, &["levels"]);

    assert_eq!(result.exit_code, 0);
    let names: Vec<&str> = result.stdout.lines().collect();
    assert_eq!(names, vec!["DEBUG", "INFO", "WARN", "ERROR", "SILENT"]);
}
