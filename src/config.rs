//! Engine and CLI configuration.
//!
//! Loaded from a TOML file with serde defaults; every field falls back to
//! the permissive behavior when absent. Precedence for the file location:
//! explicit path, `CANOPY_CONFIG` environment variable, platform config
//! directory.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options governing tree operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Reject duplicate names among siblings. Off by default: duplicate
    /// sibling names are structurally legal, and stricter semantics are
    /// opt-in only.
    #[serde(default)]
    pub unique_sibling_names: bool,

    /// Match search queries case-sensitively. Off by default; the engine's
    /// contract minimum is case-insensitive substring matching.
    #[serde(default)]
    pub case_sensitive_search: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanopyConfig {
    #[serde(default)]
    pub tree: TreeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Default tree file for the CLI; `None` means the platform data
    /// directory.
    #[serde(default)]
    pub tree_file: Option<PathBuf>,
}

impl CanopyConfig {
    /// Load configuration. A missing file is not an error: defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => match std::env::var("CANOPY_CONFIG") {
                Ok(p) if !p.is_empty() => Some(PathBuf::from(p)),
                _ => default_config_path().ok().filter(|p| p.exists()),
            },
        };
        match path {
            Some(path) => Self::load_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Platform config file location: `<config dir>/canopy/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dirs = directories::ProjectDirs::from("", "canopy", "canopy")
        .ok_or(ConfigError::NoProjectDirs)?;
    Ok(dirs.config_dir().join("config.toml"))
}

/// Platform default tree file location: `<data dir>/canopy/tree.json`.
pub fn default_tree_path() -> Result<PathBuf, ConfigError> {
    let dirs = directories::ProjectDirs::from("", "canopy", "canopy")
        .ok_or(ConfigError::NoProjectDirs)?;
    Ok(dirs.data_dir().join("tree.json"))
}
