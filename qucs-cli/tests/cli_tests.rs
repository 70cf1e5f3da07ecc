//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

/// Build command for the qucs-cli binary (finds it in target/debug when run via cargo test).
fn qucs_cli() -> Command {
    cargo_bin_cmd!("qucs-cli")
}

/// Path to qucs-core test fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("qucs-core")
        .join("tests")
        .join("fixtures")
}

/// Copy the loadable schematics into a fresh project directory.
fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in ["amp.sch", "top.sch", "filter.sch", "amp.dat"] {
        std::fs::copy(fixtures_dir().join(name), dir.path().join(name)).unwrap();
    }
    dir
}

#[test]
fn test_cli_help() {
    let mut cmd = qucs_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Qucs"));
}

#[test]
fn test_cli_version() {
    let mut cmd = qucs_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_info_human() {
    let mut cmd = qucs_cli();

    cmd.arg("info").arg(fixtures_dir().join("amp.sch"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Components: 3"))
        .stdout(predicate::str::contains("Ports:      2"));
}

#[test]
fn test_cli_info_json() {
    let mut cmd = qucs_cli();

    cmd.arg("info")
        .arg(fixtures_dir().join("top.sch"))
        .arg("--format")
        .arg("json");
    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["version"], "0.0.19");
    assert_eq!(json["subcircuits"][0]["file"], "amp.sch");
    assert_eq!(json["subcircuits"][0]["ports"], 2);
}

#[test]
fn test_cli_info_missing_file() {
    let mut cmd = qucs_cli();

    cmd.arg("info").arg(fixtures_dir().join("missing.sch"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load"));
}

#[test]
fn test_cli_check_reports_failures() {
    let mut cmd = qucs_cli();

    cmd.arg("check")
        .arg(fixtures_dir().join("amp.sch"))
        .arg(fixtures_dir().join("future.sch"));
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("OK"))
        .stdout(predicate::str::contains("FAIL"))
        .stdout(predicate::str::contains("1 of 2 files loaded"));
}

#[test]
fn test_cli_check_all_good() {
    let mut cmd = qucs_cli();

    cmd.arg("check")
        .arg(fixtures_dir().join("amp.sch"))
        .arg(fixtures_dir().join("old.sch"))
        .arg("--format")
        .arg("json");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"failed\": 0"));
}

#[test]
fn test_cli_project_lists_schematics() {
    let dir = project();
    let mut cmd = qucs_cli();

    cmd.arg("project").arg(dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("amp.sch (2 ports)"))
        .stdout(predicate::str::contains("top.sch"))
        .stdout(predicate::str::contains("amp.dat"));
}

#[test]
fn test_cli_ports() {
    let mut cmd = qucs_cli();

    cmd.arg("ports").arg(fixtures_dir().join("amp.sch"));
    cmd.assert().success().stdout("2\n");
}

#[test]
fn test_cli_sync_rebuilds_placements() {
    let dir = project();
    let mut cmd = qucs_cli();

    cmd.arg("sync").arg(dir.path().join("amp.sch"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("SUB2 in filter.sch (2 ports)"))
        .stdout(predicate::str::contains("3 placements, 3 rebuilt for 2 ports"));
}

#[test]
fn test_cli_sync_json() {
    let dir = project();
    let mut cmd = qucs_cli();

    cmd.arg("sync")
        .arg(dir.path().join("amp.sch"))
        .arg("--format")
        .arg("json");
    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["rebuilt"], 3);
    assert_eq!(json["placements"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_cli_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("settings.json");
    std::fs::write(&config, "not json").unwrap();
    let mut cmd = qucs_cli();

    cmd.arg("--config")
        .arg(&config)
        .arg("info")
        .arg(fixtures_dir().join("amp.sch"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read settings"));
}

#[test]
fn test_cli_config_version_refuses_newer_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("settings.json");
    std::fs::write(&config, r#"{ "version": "0.0.1" }"#).unwrap();
    let mut cmd = qucs_cli();

    cmd.arg("--config")
        .arg(&config)
        .arg("check")
        .arg(fixtures_dir().join("amp.sch"));
    cmd.assert().failure().stdout(predicate::str::contains("FAIL"));
}
