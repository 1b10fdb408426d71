//! Integration tests for the `llmstack` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without a server; the few networked cases talk to a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const MISSING_CONFIG: &str = "/tmp/llmstack-cli-test-nonexistent/config.toml";

/// Build a [`Command`] for the `llmstack` binary with env isolation.
///
/// Clears all `LLMSTACK_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn llmstack_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("llmstack");
    cmd.env("HOME", "/tmp/llmstack-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/llmstack-cli-test-nonexistent")
        .env("LLMSTACK_CONFIG", MISSING_CONFIG)
        .env_remove("LLMSTACK_PROFILE")
        .env_remove("LLMSTACK_SERVER")
        .env_remove("LLMSTACK_TOKEN")
        .env_remove("LLMSTACK_SESSION")
        .env_remove("LLMSTACK_OUTPUT")
        .env_remove("LLMSTACK_INSECURE")
        .env_remove("LLMSTACK_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = llmstack_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    llmstack_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("LLMStack")
            .and(predicate::str::contains("apps"))
            .and(predicate::str::contains("connections"))
            .and(predicate::str::contains("datasources")),
    );
}

#[test]
fn test_version_flag() {
    llmstack_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("llmstack"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    llmstack_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    llmstack_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    llmstack_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = llmstack_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success(), "Expected failure for invalid subcommand");
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_apps_list_without_config() {
    llmstack_cmd()
        .args(["apps", "list"])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("config")
                .or(predicate::str::contains("Configuration"))
                .or(predicate::str::contains("server")),
        );
}

#[test]
fn test_invalid_output_format() {
    let output = llmstack_cmd()
        .args(["--output", "invalid", "apps", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success(), "Expected failure for invalid output format");
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_store_run_requires_input() {
    let output = llmstack_cmd().args(["store", "run", "my-app"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--input"));
}

#[test]
fn test_bad_uuid_is_rejected_before_any_request() {
    // The server is unreachable, so a network attempt would fail differently.
    llmstack_cmd()
        .args(["--server", "http://127.0.0.1:9", "apps", "show", "not-a-uuid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("uuid"));
}

#[test]
fn test_blank_store_slug_is_rejected_before_any_request() {
    llmstack_cmd()
        .args(["--server", "http://127.0.0.1:9", "store", "app", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("slug"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    llmstack_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_path_honors_env() {
    llmstack_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(MISSING_CONFIG));
}

#[test]
fn test_config_show_masks_plaintext_token() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(
        &file,
        "default_profile = \"work\"\n\n[profiles.work]\nserver = \"https://llm.example.com\"\ntoken = \"sk-very-secret\"\n",
    )
    .unwrap();

    llmstack_cmd()
        .env("LLMSTACK_CONFIG", &file)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://llm.example.com")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("sk-very-secret").not()),
        );
}

#[test]
fn test_config_subcommands_exist() {
    llmstack_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("path")),
        );
}

// ── Against a server ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_connections_list_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/connections"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 7, "name": "Web login"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let output = llmstack_cmd()
        .args(["--server", &server.uri(), "-o", "json", "connections", "list"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[0]["id"], 7);
    assert_eq!(listed[0]["name"], "Web login");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthorized_maps_to_auth_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/apps"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "no"})))
        .mount(&server)
        .await;

    let output = llmstack_cmd()
        .args(["--server", &server.uri(), "apps", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}
