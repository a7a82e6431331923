//! CLI integration tests
//!
//! These tests run the built binary and check:
//! - Help and version output
//! - Usage errors and exit codes
//! - Configuration errors that stop the run before Docker is contacted

use std::path::PathBuf;
use std::process::Command;

fn chartscan_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_chartscan"))
}

#[test]
fn test_cli_help() {
    let output = Command::new(chartscan_bin())
        .arg("--help")
        .output()
        .expect("Failed to execute chartscan");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("chartscan"));
    for flag in [
        "--json",
        "--debug",
        "--no-pull",
        "--scanner-args",
        "--scanner-subcommand",
        "--scan-user",
        "--registry-username",
        "--registry-password",
        "--set",
        "--values",
        "--chart-version",
        "--cache-dir",
    ] {
        assert!(stdout.contains(flag), "help is missing {}", flag);
    }
}

#[test]
fn test_cli_version() {
    let output = Command::new(chartscan_bin())
        .arg("--version")
        .output()
        .expect("Failed to execute chartscan");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("chartscan"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_chart_exits_with_usage() {
    let output = Command::new(chartscan_bin())
        .arg("--json")
        .output()
        .expect("Failed to execute chartscan");

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("<CHART>"));
    assert!(stderr.to_lowercase().contains("usage"));
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let output = Command::new(chartscan_bin())
        .args(["--frobnicate", "stable/mariadb"])
        .output()
        .expect("Failed to execute chartscan");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_password_without_username_fails_fast() {
    let output = Command::new(chartscan_bin())
        .args(["--registry-password", "s3cr3t", "stable/mariadb"])
        .env("DOCKER_HOST", "unix:///nonexistent/docker.sock")
        .output()
        .expect("Failed to execute chartscan");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"));
    assert!(!stderr.contains("s3cr3t"));
}

#[test]
fn test_unreachable_docker_is_fatal() {
    let output = Command::new(chartscan_bin())
        .args(["--no-pull", "stable/mariadb"])
        .env("DOCKER_HOST", "unix:///nonexistent/docker.sock")
        .output()
        .expect("Failed to execute chartscan");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
