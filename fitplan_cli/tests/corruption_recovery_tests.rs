//! Corruption recovery tests for the fitplan binary.
//!
//! These tests verify the system can handle:
//! - Corrupted catalog and user files
//! - Corrupted or partially written WAL files
//! - An invalid config file

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fitplan"));
    cmd.arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--config")
        .arg(dir.join("config.toml"));
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_catalog_falls_back_to_builtin() {
    let temp_dir = setup_test_dir();
    fs::create_dir_all(temp_dir.path().join("data")).unwrap();
    fs::write(temp_dir.path().join("data/catalog.json"), "{ invalid json }}}}").unwrap();

    cli(temp_dir.path())
        .args(["consult", "--weight", "60", "--height", "170", "--sex", "male", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P5: Balanced Fitness"));
}

#[test]
fn test_catalog_missing_rule_program_refused() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    // A stored catalog with no programs cannot serve the built-in rules
    fs::create_dir_all(dir.join("data")).unwrap();
    let catalog = r#"{"programs": {}, "exercises": {}}"#;
    fs::write(dir.join("data/catalog.json"), catalog).unwrap();

    cli(dir)
        .args(["consult", "--weight", "60", "--height", "170", "--sex", "male"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing from catalog"));
}

#[test]
fn test_corrupted_users_file() {
    let temp_dir = setup_test_dir();
    fs::create_dir_all(temp_dir.path().join("data")).unwrap();
    fs::write(temp_dir.path().join("data/users.json"), "not json").unwrap();

    cli(temp_dir.path())
        .args(["users", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No users registered"));
}

#[test]
fn test_partial_wal_line() {
    let temp_dir = setup_test_dir();
    let wal_dir = temp_dir.path().join("data/wal");
    fs::create_dir_all(&wal_dir).unwrap();

    // Simulate a crash mid-write: garbage then a partial last line
    let mut file = fs::File::create(wal_dir.join("consultations.wal")).unwrap();
    writeln!(file, "{{ invalid json }}").unwrap();
    write!(file, r#"{{"id":"partial"#).unwrap();
    drop(file);

    cli(temp_dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No consultations"));

    // New consultations still append
    cli(temp_dir.path())
        .args(["consult", "--weight", "60", "--height", "170", "--sex", "male"])
        .assert()
        .success();

    cli(temp_dir.path())
        .arg("rollup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 1 consultations"));
}

#[test]
fn test_invalid_config_reports_error() {
    let temp_dir = setup_test_dir();
    fs::write(temp_dir.path().join("config.toml"), "[rules]\nfallback = \"P77\"\n").unwrap();

    cli(temp_dir.path())
        .args(["rules", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Toml"));
}
