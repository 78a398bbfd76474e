//! Concurrency tests for the fitplan binary.
//!
//! Several processes recording consultations at once must not lose or
//! interleave WAL lines.

use assert_cmd::Command;
use std::path::Path;
use std::thread;
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
fn test_parallel_consultations() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let dir = dir.clone();
            thread::spawn(move || {
                let weight = (55 + i * 10).to_string();
                cli(&dir)
                    .args(["consult", "--weight", &weight, "--height", "172"])
                    .args(["--body-fat", "18", "--sex", "male"])
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("consult thread panicked");
    }

    let wal = std::fs::read_to_string(dir.join("data/wal/consultations.wal"))
        .expect("Failed to read WAL");
    let lines: Vec<&str> = wal.lines().collect();
    assert_eq!(lines.len(), 6, "Expected 6 consultations, got {}", lines.len());
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).expect("WAL line is valid JSON");
        assert!(value.get("program").is_some());
    }
}

#[test]
fn test_parallel_user_registration() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path().to_path_buf();

    // Every registration must survive with its own id
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let dir = dir.clone();
            thread::spawn(move || {
                cli(&dir)
                    .args(["users", "add", &format!("user{}", i), "--sex", "female"])
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("users thread panicked");
    }

    let contents = std::fs::read_to_string(dir.join("data/users.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&contents).expect("users.json is valid");
    let users = value["users"].as_array().expect("users array");
    let mut ids: Vec<u64> = users.iter().filter_map(|u| u["id"].as_u64()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}
