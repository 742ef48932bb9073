//! Basic CLI E2E tests.
//!
//! Each test runs the built binary with HOME pointed at a fresh temp dir so
//! configuration never touches the real user directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_priomage"))
        .args(args)
        .current_dir(home)
        .env("HOME", home)
        .env_remove("PRIOMAGE_ENV")
        .env_remove("PRIOMAGE_LOG")
        .env_remove("GITHUB_TOKEN")
        .env_remove("GITHUB_ORG")
        .env_remove("GITHUB_PROJECT_NUMBER")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["--help"]);
    assert_eq!(code, 0);
    for command in ["update", "list", "explain", "project", "config", "auth"] {
        assert!(stdout.contains(command), "missing '{command}' in help");
    }
}

#[test]
fn test_config_path_uses_home() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
    assert!(stdout.contains(".config"));
    assert!(stdout.contains("priomage"));
}

#[test]
fn test_config_set_then_get() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "github.organization", "acme"]);
    assert_eq!(code, 0, "set failed: {stderr}");

    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "github.organization"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "acme");

    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "scoring.urgency.half_life_days"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "14.0");
}

#[test]
fn test_config_list_is_json() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["scoring"]["default_goal_weight"], 0.5);
    assert_eq!(parsed["fields"]["priority"][0], "Priority");
}

#[test]
fn test_config_set_rejects_invalid_weight() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &["config", "set", "scoring.goal_weights.revenue", "1.5"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "scoring.goal_weights.revenue"]);
    assert_eq!(stdout.trim(), "1.0");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "github.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_reset_restores_defaults() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["config", "set", "scoring.update_threshold", "7"]);
    let (_, _, code) = run_cli(home.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "scoring.update_threshold"]);
    assert_eq!(stdout.trim(), "2.0");
}

#[test]
fn test_update_requires_organization() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["update", "--dry-run"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no organization configured"));
}

#[test]
fn test_explain_requires_issue() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["explain"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("--issue"));
}

#[test]
fn test_invalid_today_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["list", "--today", "tomorrow"]);
    assert_eq!(code, 2);
}
