//! Runtime configuration for the roster store.
//!
//! # Responsibility
//! - Describe where the database lives and how connections/logging behave.
//! - Apply environment overrides on top of build-mode defaults.
//!
//! # Invariants
//! - `default_page_size` is always >= 1.
//! - Environment parsing never panics; malformed values are reported.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_PAGE_SIZE: i64 = 5;
const DEFAULT_LOG_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_LOG_MAX_FILES: usize = 5;

pub const ENV_DB_PATH: &str = "ROSTERDB_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "ROSTERDB_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "ROSTERDB_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ROSTERDB_LOG_DIR";
pub const ENV_PAGE_SIZE: &str = "ROSTERDB_PAGE_SIZE";

/// Where the SQLite database is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum DatabaseTarget {
    /// Private in-memory database, discarded when the connection closes.
    Memory,
    /// Database file on disk.
    File(PathBuf),
}

/// Store configuration assembled from defaults and environment overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub database: DatabaseTarget,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub log_max_file_bytes: u64,
    pub log_max_files: usize,
    /// Page size used when a caller does not request one.
    pub default_page_size: i64,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            database: DatabaseTarget::Memory,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            log_level: default_log_level().to_string(),
            log_dir: None,
            log_max_file_bytes: DEFAULT_LOG_MAX_FILE_BYTES,
            log_max_files: DEFAULT_LOG_MAX_FILES,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

impl RosterConfig {
    /// Builds configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.database = if path == ":memory:" {
                DatabaseTarget::Memory
            } else {
                DatabaseTarget::File(PathBuf::from(path))
            };
        }

        if let Some(value) = read(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_BUSY_TIMEOUT_MS,
                value: value.clone(),
                reason: "expected milliseconds as a non-negative integer",
            })?;
        }

        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }

        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }

        if let Some(value) = read(ENV_PAGE_SIZE) {
            let size: i64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_PAGE_SIZE,
                value: value.clone(),
                reason: "expected an integer",
            })?;
            if size < 1 {
                return Err(ConfigError::InvalidValue {
                    key: ENV_PAGE_SIZE,
                    value,
                    reason: "page size must be at least 1",
                });
            }
            config.default_page_size = size;
        }

        Ok(config)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
