//! Loader configuration.
//!
//! # Responsibility
//! - Describe one node type's mapping as an immutable value
//!   (`NodeTypeConfig`) instead of per-type scripts.
//! - Load process-level settings (paths, log level) from TOML + environment.
//!
//! # Invariants
//! - Configuration is validated before a batch starts; a malformed
//!   configuration is a hard error.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod node_type;
pub mod presets;
pub mod settings;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loading and validation error.
#[derive(Debug)]
pub enum ConfigError {
    /// Structurally valid configuration with unusable values.
    Invalid(String),
    /// Requested preset name is not registered.
    UnknownPreset(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
            Self::UnknownPreset(name) => write!(f, "unknown node type preset: `{name}`"),
            Self::Io { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) | Self::UnknownPreset(_) => None,
        }
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> ConfigResult<T> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
