//! Concurrency tests for the spartan binary.
//!
//! Several processes writing the same document must never leave a torn or
//! unparseable file behind, and no update may be lost.

use assert_cmd::Command;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::thread;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("spartan"));
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .arg("--data-dir")
        .arg(dir)
        .arg("--today")
        .arg("2024-06-06");
    cmd
}

#[test]
fn test_concurrent_writers_keep_every_update() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir: PathBuf = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (1..=5)
        .map(|day| {
            let dir = data_dir.clone();
            thread::spawn(move || {
                cli(&dir)
                    .args(["checkin", "--mood", "🔥", "--weight", "85"])
                    .arg("--date")
                    .arg(format!("2024-06-0{}", day))
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer thread panicked");
    }

    let raw = std::fs::read_to_string(data_dir.join("spartan.json")).unwrap();
    let doc: Value = serde_json::from_str(&raw).expect("document stays valid JSON");
    let check_ins = doc["checkIns"].as_array().unwrap();
    assert_eq!(check_ins.len(), 5);

    let leftovers: Vec<_> = std::fs::read_dir(&data_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() != "spartan.json")
        .filter(|e| e.file_name() != "spartan.json.lock")
        .filter(|e| e.file_name() != "config")
        .collect();
    assert!(leftovers.is_empty(), "stray files: {:?}", leftovers);
}

#[test]
fn test_sequential_writers_all_persist() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let dir = temp_dir.path();

    for day in ["mon", "tue", "wed", "thu", "fri"] {
        cli(dir).args(["done", day]).assert().success();
    }

    let raw = std::fs::read_to_string(dir.join("spartan.json")).unwrap();
    let doc: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["history"].as_array().unwrap().len(), 5);
    assert_eq!(doc["weekStatus"].as_object().unwrap().len(), 5);

    cli(dir)
        .arg("week")
        .assert()
        .success()
        .stdout(predicates::str::contains("Week complete!"));
}
