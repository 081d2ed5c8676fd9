//! Integration test harness
//!
//! End-to-end workflows through the `urna` binary against private copies of
//! the fixture snapshot.

mod common;

use std::fs;

use common::{isolated_cmd, TestEnvironment};
use predicates::prelude::*;
use tempfile::TempDir;

fn json(output: &std::process::Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// ─────────────────────────────────────────────────────────────────
// Configuration Workflows
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_init_then_validate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf").join("urna.toml");

    isolated_cmd(&dir)
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));

    assert!(path.exists());
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[hierarchy]"));
    assert!(content.contains("[session]"));

    isolated_cmd(&dir)
        .args(["config", "validate", "--config"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("urna.toml");
    fs::write(&path, "# mine\n").unwrap();

    isolated_cmd(&dir)
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .code(10)
        .stderr(predicate::str::contains("--force"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");

    isolated_cmd(&dir)
        .args(["config", "init", "--force", "--path"])
        .arg(&path)
        .assert()
        .success();
    assert!(fs::read_to_string(&path).unwrap().contains("[store]"));
}

#[test]
fn test_default_config_points_into_home() {
    let dir = TempDir::new().unwrap();

    isolated_cmd(&dir).args(["config", "init"]).assert().success();
    assert!(dir.path().join(".urna").join("urna.toml").exists());

    // no snapshot at ~/.urna/network.json yet
    isolated_cmd(&dir)
        .arg("check")
        .assert()
        .code(20)
        .stderr(predicate::str::contains("network.json"));
}

// ─────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_log_file_created() {
    let env = TestEnvironment::new();
    let log_file = env.log_dir.join("urna.log");
    env.with_config(&format!(
        r#"
[store]
snapshot = "{}"

[logging]
level = "info"
file = "{}"
"#,
        env.snapshot_path.display(),
        log_file.display()
    ));

    env.urna_cmd().arg("check").assert().success();

    let entries: Vec<_> = fs::read_dir(&env.log_dir)
        .expect("log directory created")
        .filter_map(|e| e.ok())
        .collect();
    assert!(!entries.is_empty());

    let logged: String = entries
        .iter()
        .map(|e| fs::read_to_string(e.path()).unwrap_or_default())
        .collect();
    assert!(logged.contains("Snapshot loaded"));
}

#[test]
fn test_stdout_stays_json_with_verbose_logging() {
    let env = TestEnvironment::new();
    let output = env
        .urna_cmd()
        .args(["-vv", "metrics", "--as", "1000000003"])
        .output()
        .unwrap();

    let metrics = json(&output);
    assert_eq!(metrics["total"], 6);
}

// ─────────────────────────────────────────────────────────────────
// Hierarchy Workflows
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_enroll_then_roster_and_metrics() {
    let env = TestEnvironment::new();

    env.urna_cmd()
        .args([
            "enroll",
            "--as",
            "1000000004",
            "--id",
            "52345678",
            "--first-names",
            "Julián",
            "--last-names",
            "Cárdenas",
            "--voting-place",
            "Colegio Santa Librada",
            "--quality-score",
            "80",
        ])
        .assert()
        .success();

    let roster = json(&env.urna_cmd().args(["roster", "--as", "1000000004"]).output().unwrap());
    assert_eq!(roster[0]["id"], "52345678");
    assert_eq!(roster[0]["level"], 1);

    // visible from the top of the branch, not from the other one
    let metrics = json(
        &env.urna_cmd()
            .args(["metrics", "--as", "1000000001"])
            .output()
            .unwrap(),
    );
    assert_eq!(metrics["total"], 9);
    assert_eq!(metrics["by_rank"]["voter"], 4);

    env.urna_cmd()
        .args(["can-view", "--as", "2000000001", "52345678"])
        .assert()
        .success()
        .stdout(predicate::str::diff("denied\n"));
}

#[test]
fn test_enroll_duplicate_id() {
    let env = TestEnvironment::new();
    env.urna_cmd()
        .args([
            "enroll",
            "--as",
            "1000000004",
            "--id",
            "2000000002",
            "--first-names",
            "Otra",
            "--last-names",
            "Persona",
        ])
        .assert()
        .code(30)
        .stderr(predicate::str::contains("E302"));

    assert_eq!(env.snapshot_rows().len(), 11);
}

#[test]
fn test_enroll_bad_phone() {
    let env = TestEnvironment::new();
    env.urna_cmd()
        .args([
            "enroll",
            "--as",
            "1000000004",
            "--id",
            "52345678",
            "--first-names",
            "Julián",
            "--last-names",
            "Cárdenas",
            "--phone",
            "12345",
        ])
        .assert()
        .code(50);

    assert_eq!(env.snapshot_rows().len(), 11);
}

#[test]
fn test_reassign_then_reports() {
    let env = TestEnvironment::new();

    env.urna_cmd()
        .args(["reassign", "--as", "1000000002", "1000000009", "--to", "1000000004"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1000000009 now reports to 1000000004"));

    let rows = env.snapshot_rows();
    let moved = rows.iter().find(|p| p.id.as_str() == "1000000009").unwrap();
    assert_eq!(moved.parent_id.as_ref().map(|p| p.as_str()), Some("1000000004"));

    let reports = json(&env.urna_cmd().args(["reports", "--as", "1000000005"]).output().unwrap());
    assert!(reports.as_object().unwrap().is_empty());
}

#[test]
fn test_reassign_outside_branch_denied() {
    let env = TestEnvironment::new();
    env.urna_cmd()
        .args(["reassign", "--as", "2000000001", "2000000002", "--to", "1000000004"])
        .assert()
        .code(40);

    let rows = env.snapshot_rows();
    let untouched = rows.iter().find(|p| p.id.as_str() == "2000000002").unwrap();
    assert_eq!(untouched.parent_id.as_ref().map(|p| p.as_str()), Some("2000000001"));
}

#[test]
fn test_malformed_snapshot() {
    let env = TestEnvironment::new();
    fs::write(&env.snapshot_path, "{ not an array").unwrap();

    env.urna_cmd()
        .arg("check")
        .assert()
        .code(20)
        .stderr(predicate::str::contains("E204"));
}
