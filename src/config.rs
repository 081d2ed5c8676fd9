//! Configuration for the URNA hierarchy engine
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (URNA_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::hierarchy::DEFAULT_FRONTIER_BATCH_SIZE;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Traversal tuning
    pub hierarchy: HierarchySettings,

    /// Session lifetime
    pub session: SessionSettings,

    /// Where the person store lives
    pub store: StoreSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Traversal settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchySettings {
    /// Maximum number of ids sent to the store in one children query
    pub frontier_batch_size: usize,
}

/// Session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Minutes of inactivity before a session is dropped
    pub idle_timeout_minutes: u32,
}

/// Store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// JSON snapshot of the hierarchy
    pub snapshot: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

impl Default for HierarchySettings {
    fn default() -> Self {
        Self {
            frontier_batch_size: DEFAULT_FRONTIER_BATCH_SIZE,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 30,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            snapshot: "~/.urna/network.json".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            config = Self::from_file(&path)?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        config.apply_env_overrides();
        config.expand_paths();
        config.validate()?;

        Ok(config)
    }

    /// Parse one TOML file, without env overrides or validation
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::IoRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            message: format!("{}: {}", path.display(), e.message()),
            source: Some(e),
        })
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // An explicit path must exist
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::ConfigNotFound { path });
        }

        let search_paths = [
            PathBuf::from("urna.toml"),
            dirs::config_dir()
                .map(|p| p.join("urna").join("urna.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".urna").join("urna.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/urna/urna.toml"),
        ];

        for path in &search_paths {
            if path.is_file() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("URNA_FRONTIER_BATCH_SIZE") {
            if let Ok(n) = val.parse() {
                self.hierarchy.frontier_batch_size = n;
            }
        }
        if let Ok(val) = std::env::var("URNA_SESSION_IDLE_MINUTES") {
            if let Ok(n) = val.parse() {
                self.session.idle_timeout_minutes = n;
            }
        }
        if let Ok(val) = std::env::var("URNA_SNAPSHOT") {
            self.store.snapshot = val;
        }

        if let Ok(val) = std::env::var("URNA_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("URNA_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("URNA_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and environment variables in paths
    fn expand_paths(&mut self) {
        self.store.snapshot = expand_path(&self.store.snapshot);

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.hierarchy.frontier_batch_size == 0 {
            return Err(Error::Config(
                "hierarchy.frontier_batch_size must be at least 1".to_string(),
            ));
        }

        if self.session.idle_timeout_minutes == 0 {
            return Err(Error::Config(
                "session.idle_timeout_minutes must be at least 1".to_string(),
            ));
        }

        if self.store.snapshot.trim().is_empty() {
            return Err(Error::Config("store.snapshot cannot be empty".to_string()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Snapshot location as a PathBuf
    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(&self.store.snapshot)
    }
}

fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Write a commented default configuration file; returns where it went
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path.map(|p| PathBuf::from(expand_path(p))).unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".urna")
            .join("urna.toml")
    });

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::IoWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&config_path, generate_default_config()).map_err(|source| Error::IoWrite {
        path: config_path.clone(),
        source,
    })?;

    Ok(config_path)
}

fn generate_default_config() -> String {
    r#"# URNA hierarchy engine configuration

[hierarchy]
# Maximum number of ids sent to the store in one children query.
# A subtree level wider than this takes several round trips.
frontier_batch_size = 500

[session]
# Minutes of inactivity before a session is dropped
idle_timeout_minutes = 30

[store]
# JSON snapshot of the recruitment hierarchy
snapshot = "~/.urna/network.json"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.urna/logs/urna.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
