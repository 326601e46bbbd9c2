//! Black-box tests of the `hardgate` binary, driven with `assert_cmd` the
//! way `valknut`'s CLI test suite does.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn scan_prints_a_json_report_for_a_small_python_repo() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("app.py"),
        "import structlog\nlogger = structlog.get_logger()\nlogger.info(\"ready\")\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("hardgate").unwrap();
    let assert = cmd
        .args(["scan", "--format", "json"])
        .arg(dir.path())
        .assert()
        .success();

    let output = assert.get_output();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["gate_scores"].as_array().unwrap().len(), 15);
}

#[test]
fn scan_rejects_a_path_that_is_not_a_directory() {
    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("not_a_dir.txt");
    fs::write(&file_path, "x").unwrap();

    Command::cargo_bin("hardgate")
        .unwrap()
        .args(["scan"])
        .arg(&file_path)
        .assert()
        .failure();
}

#[test]
fn scan_stats_flag_prints_extension_inventory() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
    fs::write(dir.path().join("b.py"), "y = 2\n").unwrap();

    Command::cargo_bin("hardgate")
        .unwrap()
        .args(["scan", "--stats"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("extension inventory"));
}

#[test]
fn print_config_emits_yaml_with_known_defaults() {
    Command::cargo_bin("hardgate")
        .unwrap()
        .arg("print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_concurrent_scans"))
        .stdout(predicate::str::contains("scan_deadline_secs"));
}

#[test]
fn missing_subcommand_prints_usage_and_fails() {
    Command::cargo_bin("hardgate").unwrap().assert().failure();
}
