//! Integration tests for the `esplink` CLI binary.
//!
//! Argument parsing, help, completions, config handling and error exit
//! codes run without a device. The device-backed tests point the binary
//! at a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `esplink` binary with env isolation.
///
/// Clears all `ESPLINK_*` env vars the binary reads and points config
/// directories at a nonexistent path so tests never touch a real config.
fn esplink_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("esplink");
    cmd.env("HOME", "/tmp/esplink-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/esplink-cli-test-nonexistent")
        .env_remove("ESPLINK_CONFIG")
        .env_remove("ESPLINK_HOST")
        .env_remove("ESPLINK_USERNAME")
        .env_remove("ESPLINK_PASSWORD")
        .env_remove("ESPLINK_LOGIN_PASSWORD")
        .env_remove("ESPLINK_OUTPUT")
        .env_remove("ESPLINK_POLL__INTERVAL_MS")
        .env_remove("ESPLINK_POLL__CONFIRM_DELAY_MS")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn status_body(led_state: bool) -> serde_json::Value {
    json!({
        "temperature": 22.5,
        "humidity": 48,
        "ledState": led_state,
        "buzzerState": false,
        "servoDoorAngle": 0,
        "hangerState": false,
        "servoHangerAngle": 0,
        "pumpState": false
    })
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(cmd: assert_cmd::Command) -> std::process::Output {
    let mut cmd = cmd;
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = esplink_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    esplink_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("ESP32")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("door")),
    );
}

#[test]
fn test_version_flag() {
    esplink_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("esplink"));
}

#[test]
fn test_unknown_switch_state_is_usage_error() {
    let output = esplink_cmd().args(["led", "maybe"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    esplink_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    esplink_cmd()
        .args(["--config", "/tmp/esplink-custom.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/esplink-custom.toml"));
}

#[test]
fn test_config_show_masks_password() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(
        &file,
        "[device]\nhost = \"10.0.0.7\"\n\n[login]\npassword = \"s3cret\"\n",
    )
    .unwrap();

    esplink_cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("10.0.0.7")
                .and(predicate::str::contains("********"))
                .and(predicate::str::contains("s3cret").not()),
        );
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("nested").join("config.toml");

    esplink_cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(file.exists());

    let output = esplink_cmd()
        .arg("--config")
        .arg(&file)
        .args(["config", "init"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--force"));
}

// ── Login and validation (no device needed) ─────────────────────────

#[test]
fn test_wrong_password_exits_with_auth_code() {
    let output = esplink_cmd()
        .args(["--host", "127.0.0.1:9", "--password", "nope", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Invalid username or password"));
}

#[test]
fn test_missing_password_without_terminal_exits_with_auth_code() {
    let output = esplink_cmd()
        .args(["--host", "127.0.0.1:9", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_configured_account_is_the_one_accepted() {
    let output = esplink_cmd()
        .env("ESPLINK_PASSWORD", "changed")
        .args(["--host", "127.0.0.1:9", "--password", "admin123", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_invalid_door_angle_is_rejected_before_sending() {
    let output = esplink_cmd()
        .args(["--host", "127.0.0.1:9", "--password", "admin123", "door", "set", "45"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Invalid command"));
}

// ── Against a device ────────────────────────────────────────────────

#[tokio::test]
async fn test_status_prints_device_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(true)))
        .mount(&server)
        .await;

    let uri = server.uri();
    let mut cmd = esplink_cmd();
    cmd.args(["--host", uri.as_str(), "--password", "admin123", "-o", "json", "status"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["ledOn"], true);
    assert_eq!(doc["temperatureC"], 22.5);
    assert_eq!(doc["door"], "closed");
    assert_eq!(doc["connectivity"], "connected");
}

#[tokio::test]
async fn test_status_against_failing_device_is_a_device_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let uri = server.uri();
    let mut cmd = esplink_cmd();
    cmd.args(["--host", uri.as_str(), "--password", "admin123", "status"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1), "{}", combined_output(&output));
}

#[tokio::test]
async fn test_config_defaults_pick_output_format() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(true)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(&file, "[defaults]\noutput = \"plain\"\ncolor = \"never\"\n").unwrap();

    let uri = server.uri();
    let mut plain = esplink_cmd();
    plain.arg("--config").arg(&file).args([
        "--host",
        uri.as_str(),
        "--password",
        "admin123",
        "status",
    ]);
    let output = run(plain).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|l| l == "led=on"), "{stdout}");

    // An explicit flag still wins.
    let mut json = esplink_cmd();
    json.arg("--config").arg(&file).args([
        "--host",
        uri.as_str(),
        "--password",
        "admin123",
        "-o",
        "json",
        "status",
    ]);
    let output = run(json).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["ledOn"], true);
}

#[test]
fn test_invalid_config_default_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(&file, "[defaults]\noutput = \"xml\"\n").unwrap();

    let output = esplink_cmd()
        .arg("--config")
        .arg(&file)
        .args(["--host", "127.0.0.1:9", "--password", "admin123", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("defaults.output"));
}

#[tokio::test]
async fn test_led_on_posts_and_prints_confirmed_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(true)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/led"))
        .and(body_string(r#"{"state":true}"#))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let mut cmd = esplink_cmd();
    cmd.env("ESPLINK_POLL__CONFIRM_DELAY_MS", "20").args([
        "--host",
        uri.as_str(),
        "--password",
        "admin123",
        "-o",
        "plain",
        "led",
        "on",
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|l| l == "led=on"), "{stdout}");
}

#[tokio::test]
async fn test_watch_stops_after_count_and_summarizes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(false)))
        .mount(&server)
        .await;

    let uri = server.uri();
    let mut cmd = esplink_cmd();
    cmd.args([
        "--host",
        uri.as_str(),
        "--password",
        "admin123",
        "-o",
        "plain",
        "watch",
        "--interval-ms",
        "50",
        "--count",
        "3",
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    // Identical reads print one change line.
    assert_eq!(stdout.matches("led:off").count(), 1, "{stdout}");
    assert!(stdout.contains("reads=3"), "{stdout}");
}
