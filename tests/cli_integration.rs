//! End-to-end tests for the tessera CLI using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the tessera binary for testing
fn tessera_cmd() -> Command {
    Command::cargo_bin("tessera").unwrap()
}

/// Write a config pointing all state into the temp dir, with plaintext
/// secrets so no master key is needed.
fn write_test_config(dir: &TempDir) -> String {
    let config_path = dir.path().join("tessera.toml");
    let data_dir = dir.path().join("data");
    let content = format!(
        "[storage]\ndata_dir = \"{}\"\n\n[secrets]\nmode = \"plain\"\n",
        data_dir.display()
    );
    std::fs::write(&config_path, content).unwrap();
    config_path.to_str().unwrap().to_string()
}

#[test]
fn test_version_output() {
    tessera_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tessera"));
}

#[test]
fn test_help_shows_all_commands() {
    tessera_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("widgets"))
        .stdout(predicate::str::contains("secrets"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_serve_help() {
    tessera_cmd()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--host"))
        .stdout(predicate::str::contains("--plain-secrets"));
}

#[test]
fn test_secrets_help() {
    tessera_cmd()
        .args(["secrets", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn test_widgets_lists_builtin_types() {
    let dir = TempDir::new().unwrap();
    let config = write_test_config(&dir);

    tessera_cmd()
        .args(["widgets", "--config", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("clock-widget"))
        .stdout(predicate::str::contains("weather-widget"))
        .stdout(predicate::str::contains("stocks-widget"))
        .stdout(predicate::str::contains("sitemon-widget"));
}

#[test]
fn test_widgets_json_output_parses() {
    let dir = TempDir::new().unwrap();
    let config = write_test_config(&dir);

    let output = tessera_cmd()
        .args(["widgets", "--json", "--config", &config])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let widgets = parsed["widgets"].as_array().unwrap();
    assert_eq!(widgets.len(), 4);
    assert!(widgets.iter().any(|w| w["id"] == "stocks-widget"));
}

#[test]
fn test_secrets_set_show_roundtrip_is_masked() {
    let dir = TempDir::new().unwrap();
    let config = write_test_config(&dir);

    tessera_cmd()
        .args([
            "secrets",
            "set",
            "stocks-widget",
            "api_key=sk-live-0123456789abcdef",
            "--config",
            &config,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored 1 secret field(s)"))
        .stdout(predicate::str::contains("sk-live-0123456789abcdef").not());

    tessera_cmd()
        .args(["secrets", "show", "stocks-widget", "--config", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("***"))
        .stdout(predicate::str::contains("sk-live-0123456789abcdef").not());

    tessera_cmd()
        .args(["secrets", "list", "--config", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("stocks-widget"));
}

#[test]
fn test_secrets_set_warns_on_missing_schema_fields() {
    let dir = TempDir::new().unwrap();
    let config = write_test_config(&dir);

    // stocks-widget declares api_key as required; storing something else
    // succeeds but warns
    tessera_cmd()
        .args([
            "secrets",
            "set",
            "stocks-widget",
            "region=us-east",
            "--config",
            &config,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning"))
        .stdout(predicate::str::contains("api_key"));
}

#[test]
fn test_secrets_delete_then_show_reports_absence() {
    let dir = TempDir::new().unwrap();
    let config = write_test_config(&dir);

    tessera_cmd()
        .args([
            "secrets",
            "set",
            "stocks-widget",
            "api_key=sk-0123456789",
            "--config",
            &config,
        ])
        .assert()
        .success();

    tessera_cmd()
        .args(["secrets", "delete", "stocks-widget", "--config", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted secrets for 'stocks-widget'"));

    tessera_cmd()
        .args(["secrets", "show", "stocks-widget", "--config", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("No secrets stored"));
}

#[test]
fn test_secrets_commands_fail_without_master_key() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("tessera.toml");
    // Encrypted mode (the default) requires the master key env var
    std::fs::write(&config_path, "[secrets]\nmode = \"encrypted\"\n").unwrap();

    tessera_cmd()
        .env_remove("TESSERA_MASTER_KEY")
        .args(["secrets", "list", "--config", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TESSERA_MASTER_KEY"));
}

#[test]
fn test_config_init_creates_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("tessera.toml");

    tessera_cmd()
        .args(["config", "init", "-o", config_path.to_str().unwrap()])
        .assert()
        .success();

    assert!(config_path.exists());
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[server]"));
}

#[test]
fn test_config_init_no_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("tessera.toml");

    // Create file first
    std::fs::write(&config_path, "existing content").unwrap();

    // Try to overwrite without --force
    tessera_cmd()
        .args(["config", "init", "-o", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exists"));
}

#[test]
fn test_config_init_force_overwrites() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("tessera.toml");

    // Create file first
    std::fs::write(&config_path, "existing content").unwrap();

    // Force overwrite
    tessera_cmd()
        .args([
            "config",
            "init",
            "-o",
            config_path.to_str().unwrap(),
            "--force",
        ])
        .assert()
        .success();

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[server]"));
}

#[test]
fn test_invalid_command() {
    tessera_cmd()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_completions_bash() {
    tessera_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete"));
}

#[test]
fn test_completions_zsh() {
    tessera_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("compdef"));
}
