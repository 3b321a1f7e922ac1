//! Corruption recovery tests for the spartan binary.
//!
//! These tests verify the system can handle:
//! - Unparseable document files
//! - Legacy documents from before programs and local dates existed
//! - Documents written by a newer version

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("spartan"));
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .arg("--data-dir")
        .arg(dir)
        .arg("--today")
        .arg("2024-06-06");
    cmd
}

fn read_document(dir: &Path) -> Value {
    let raw = fs::read_to_string(dir.join("spartan.json")).expect("read document");
    serde_json::from_str(&raw).expect("document is valid JSON")
}

#[test]
fn test_corrupted_document_file() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    fs::write(dir.join("spartan.json"), "{ invalid json }}}}").unwrap();

    cli(dir)
        .arg("week")
        .assert()
        .success()
        .stderr(predicate::str::contains("unreadable"))
        .stdout(predicate::str::contains("Week 1"));

    let backup = fs::read_to_string(dir.join("spartan.json.bak")).unwrap();
    assert_eq!(backup, "{ invalid json }}}}");

    // The next write replaces the broken file with a healthy document
    cli(dir).args(["done", "mon"]).assert().success();
    let doc = read_document(dir);
    assert_eq!(doc["history"].as_array().unwrap().len(), 1);
    assert_eq!(doc["programs"].as_array().unwrap().len(), 1);
}

#[test]
fn test_non_object_document() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    fs::write(dir.join("spartan.json"), "[1, 2, 3]").unwrap();

    cli(dir)
        .arg("stats")
        .assert()
        .success()
        .stderr(predicate::str::contains("unreadable"))
        .stdout(predicate::str::contains("Streak: 0 days"));
}

#[test]
fn test_empty_document_file() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    fs::write(dir.join("spartan.json"), "").unwrap();

    cli(dir)
        .arg("programs")
        .assert()
        .success()
        .stdout(predicate::str::contains("prog_default"));
}

#[test]
fn test_newer_schema_is_not_loaded() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    fs::write(
        dir.join("spartan.json"),
        r#"{"schemaVersion": 99, "currentWeek": 12}"#,
    )
    .unwrap();

    cli(dir)
        .arg("week")
        .assert()
        .success()
        .stderr(predicate::str::contains("unreadable"))
        .stdout(predicate::str::contains("Week 1"));

    assert!(dir.join("spartan.json.bak").exists());
}

#[test]
fn test_legacy_document_upgraded() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let legacy = r#"{
        "currentWeek": 3,
        "weights": {"m1": 60},
        "weekStatus": {"mon": "completed"},
        "history": [
            {"id": "h2", "date": "2024-06-05T17:30:00.000Z", "workoutTitle": "LEGS 1 (Heavy)", "weekNumber": 3, "exercises": []},
            {"id": "h1", "date": "2024-06-03T17:30:00.000Z", "workoutTitle": "PUSH 1", "weekNumber": 3, "exercises": []},
            {"id": "h1", "date": "2024-06-03T17:30:00.000Z", "workoutTitle": "PUSH 1", "weekNumber": 3, "exercises": []}
        ],
        "checkIns": [],
        "skippedDates": [],
        "activeTheme": "cyberpunk"
    }"#;
    fs::write(dir.join("spartan.json"), legacy).unwrap();

    cli(dir)
        .arg("week")
        .assert()
        .success()
        .stderr(predicate::str::contains("unreadable").not())
        .stdout(predicate::str::contains("Week 3"))
        .stdout(predicate::str::contains("1/5 days done"));

    cli(dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workouts logged: 2"))
        .stdout(predicate::str::contains("Consistency: 67% (2 completed, 1 missed)"));

    // A write persists the upgraded shape
    cli(dir).args(["theme", "spartan"]).assert().success();
    let doc = read_document(dir);
    assert_eq!(doc["schemaVersion"], 2);
    assert_eq!(doc["history"][0]["localDate"], "2024-06-05");
    assert_eq!(doc["history"][1]["localDate"], "2024-06-03");
    assert_eq!(doc["programs"][0]["id"], "prog_default");
    assert_eq!(doc["programs"][0]["isActive"], true);
    assert!(doc.get("customPlan").is_none());
}

#[test]
fn test_legacy_custom_plan_becomes_program() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let legacy = r#"{
        "currentWeek": 1,
        "history": [],
        "customPlan": [
            {"id": "sat", "day": "Saturday", "title": "FULL BODY", "focus": "Everything", "color": "red",
             "exercises": [{"id": "s1", "name": "Deadlift", "sets": 5, "reps": "5", "category": "legs"}]}
        ]
    }"#;
    fs::write(dir.join("spartan.json"), legacy).unwrap();

    cli(dir)
        .arg("week")
        .assert()
        .success()
        .stdout(predicate::str::contains("FULL BODY"));

    cli(dir)
        .args(["done", "sat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ FULL BODY complete"));
}
