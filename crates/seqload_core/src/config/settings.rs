//! Process-level loader settings.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! `SEQLOAD_*` environment variables.

use crate::config::{read_toml, ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_TRACKING_FILE: &str = "node_id_tracking.csv";
const DEFAULT_STORE_PATH: &str = "seqload.sqlite3";

pub const ENV_TRACKING_FILE: &str = "SEQLOAD_TRACKING_FILE";
pub const ENV_STORE_PATH: &str = "SEQLOAD_STORE_PATH";
pub const ENV_OUTPUT_DIR: &str = "SEQLOAD_OUTPUT_DIR";
pub const ENV_LOG_LEVEL: &str = "SEQLOAD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SEQLOAD_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// ID-tracking file shared by every node type's batch.
    pub tracking_file: PathBuf,
    /// SQLite database backing the entity store.
    pub store_path: PathBuf,
    /// Directory for categorized output files; `None` writes next to the
    /// data file.
    pub output_dir: Option<PathBuf>,
    /// `None` uses the build-mode default.
    pub log_level: Option<String>,
    /// Absolute directory for rotating log files; `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            tracking_file: PathBuf::from(DEFAULT_TRACKING_FILE),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            output_dir: None,
            log_level: None,
            log_dir: None,
        }
    }
}

impl LoaderSettings {
    /// Loads settings from an optional TOML file plus process environment.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut settings = match path {
            Some(path) => read_toml(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Applies `SEQLOAD_*` overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get(ENV_TRACKING_FILE) {
            self.tracking_file = PathBuf::from(value);
        }
        if let Some(value) = get(ENV_STORE_PATH) {
            self.store_path = PathBuf::from(value);
        }
        if let Some(value) = get(ENV_OUTPUT_DIR) {
            self.output_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get(ENV_LOG_LEVEL) {
            self.log_level = Some(value);
        }
        if let Some(value) = get(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value));
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.tracking_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "`tracking_file` cannot be empty".to_string(),
            ));
        }
        if self.store_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("`store_path` cannot be empty".to_string()));
        }
        Ok(())
    }
}
