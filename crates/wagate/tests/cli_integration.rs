//! CLI integration tests for the wagate command-line interface.
//!
//! These tests do not need a running gateway: they cover argument parsing,
//! help output and the config commands against a temporary config dir.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the wagate binary, isolated in a temp directory.
fn wagate(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wagate").unwrap();
    cmd.current_dir(dir.path())
        .env("WAGATE_CONFIG_DIR", dir.path().join("config"));
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    wagate(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("session-state cache"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("probe"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    wagate(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wagate"));
}

#[test]
fn test_probe_requires_session() {
    let dir = TempDir::new().unwrap();
    wagate(&dir)
        .arg("probe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<SESSION>"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    wagate(&dir).arg("frobnicate").assert().failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Command Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_defaults() {
    let dir = TempDir::new().unwrap();
    wagate(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_ttl_ms = 300000"))
        .stdout(predicate::str::contains("ttl_ms = 900000"))
        .stdout(predicate::str::contains("http://localhost:5000"));
}

#[test]
fn test_config_show_json_merges_project_layer() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("wagate.toml"),
        "[session]\nttl_ms = 60000\n",
    )
    .unwrap();

    let output = wagate(&dir)
        .args(["--json", "config", "show"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["session"]["ttl_ms"], 60000);
    assert_eq!(value["credential"]["ttl_ms"], 900000);
}

#[test]
fn test_config_check_rejects_negative_ttl() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("wagate.toml"),
        "[cache]\ndefault_ttl_ms = -5\n",
    )
    .unwrap();

    wagate(&dir)
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cache.default_ttl_ms"));
}

#[test]
fn test_config_init_writes_user_config() {
    let dir = TempDir::new().unwrap();

    wagate(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let written = fs::read_to_string(dir.path().join("config").join("config.toml")).unwrap();
    assert!(written.contains("[cache]"));

    wagate(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_path_uses_override() {
    let dir = TempDir::new().unwrap();
    wagate(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_which_traces_sections() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("config")).unwrap();
    fs::write(
        dir.path().join("config").join("config.toml"),
        "[cache]\nsweep_batch_size = 64\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("wagate.toml"),
        "[session]\n\n[gateway]\nbase_url = \"http://10.0.0.2:5000\"\n",
    )
    .unwrap();

    let output = wagate(&dir)
        .args(["--json", "config", "which"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["sections"]["cache"], "user");
    assert_eq!(value["sections"]["session"], "project");
    assert_eq!(value["sections"]["gateway"], "project");
    assert_eq!(value["sections"]["credential"], "default");
    assert_eq!(value["layers"][1]["status"], "loaded");
}

#[test]
fn test_config_check_accepts_bare_session_header() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("wagate.toml"),
        "[session]\n\n[gateway]\nbase_url = \"http://10.0.0.2:5000\"\n",
    )
    .unwrap();

    wagate(&dir)
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("session TTL       300s"))
        .stdout(predicate::str::contains("http://10.0.0.2:5000"));
}
