//! Common test utilities and fixtures
//!
//! Shared by the engine, CLI and config test suites.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;
use urna_core::{MemoryPersonStore, Person, PersonId, Rank};

// ─────────────────────────────────────────────────────────────────
// Fixture Files
// ─────────────────────────────────────────────────────────────────

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Two branches: a six-level campaign under 1000000001 and a small one under 2000000001
pub fn network_fixture() -> PathBuf {
    fixture_path("network.json")
}

/// A two-person cycle plus a row pointing at a missing parent
pub fn broken_network_fixture() -> PathBuf {
    fixture_path("broken_network.json")
}

pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

// ─────────────────────────────────────────────────────────────────
// In-memory Builders
// ─────────────────────────────────────────────────────────────────

pub fn pid(s: &str) -> PersonId {
    PersonId::new_unchecked(s)
}

pub fn at(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day)
}

pub fn person(id: &str, rank: Rank, parent: Option<&str>, day: i64) -> Person {
    Person::new(pid(id), "Test", id, rank, parent.map(pid), at(day))
}

pub fn store_of(people: Vec<Person>) -> Arc<MemoryPersonStore> {
    Arc::new(MemoryPersonStore::from_people(people))
}

// ─────────────────────────────────────────────────────────────────
// CLI Environment
// ─────────────────────────────────────────────────────────────────

/// Temp directory holding a private copy of a snapshot and a config that
/// points at it, so write commands never touch the fixtures.
pub struct TestEnvironment {
    pub root: TempDir,
    pub config_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub log_dir: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::from_snapshot(&network_fixture())
    }

    pub fn from_snapshot(source: &std::path::Path) -> Self {
        let root = TempDir::new().expect("Failed to create temp directory");
        let snapshot_path = root.path().join("network.json");
        let log_dir = root.path().join("logs");
        let config_path = root.path().join("urna.toml");

        fs::copy(source, &snapshot_path).expect("Failed to copy snapshot");

        let config = format!(
            r#"
[hierarchy]
frontier_batch_size = 3

[store]
snapshot = "{}"

[logging]
level = "warn"
"#,
            snapshot_path.display()
        );
        fs::write(&config_path, config).expect("Failed to write config");

        Self {
            root,
            config_path,
            snapshot_path,
            log_dir,
        }
    }

    pub fn with_config(&self, content: &str) -> &Self {
        fs::write(&self.config_path, content).expect("Failed to write custom config");
        self
    }

    pub fn config(&self) -> &str {
        self.config_path.to_str().unwrap()
    }

    /// `urna` isolated from the caller's home, env and working directory
    pub fn urna_cmd(&self) -> assert_cmd::Command {
        let mut cmd = isolated_cmd(&self.root);
        cmd.arg("--config").arg(self.config());
        cmd
    }

    pub fn snapshot_rows(&self) -> Vec<Person> {
        let content = fs::read_to_string(&self.snapshot_path).expect("Failed to read snapshot");
        serde_json::from_str(&content).expect("Snapshot is not valid JSON")
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// `urna` with HOME, XDG dirs and cwd pointed into `dir`, and URNA_* cleared
pub fn isolated_cmd(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("urna").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env_remove("URNA_CONFIG")
        .env_remove("URNA_SNAPSHOT")
        .env_remove("URNA_LOG_LEVEL")
        .env_remove("URNA_LOG_FILE")
        .env_remove("URNA_LOG_JSON")
        .env_remove("URNA_FRONTIER_BATCH_SIZE")
        .env_remove("URNA_SESSION_IDLE_MINUTES")
        .env_remove("RUST_LOG");
    cmd
}
