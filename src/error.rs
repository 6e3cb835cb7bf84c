//! Error types for tree operations, the sync boundary, and the CLI.
//!
//! Every business-rule violation a caller can trigger is a typed, recoverable
//! error; the engine never panics for stale ids or invalid input.

use crate::types::NodeId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by tree operations and selection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0} not found")]
    NotFound(NodeId),

    #[error("parent {0} is missing or not a folder")]
    InvalidParent(NodeId),

    #[error("node name must be non-empty")]
    InvalidName,

    #[error("node {0} is not a file")]
    NotAFile(NodeId),

    #[error("the root folder cannot be deleted or moved")]
    ForbiddenRoot,

    #[error("folder {parent} already contains a child named {name:?}")]
    DuplicateName { parent: NodeId, name: String },

    #[error("cannot move {id} under {new_parent}: target is inside the moved subtree")]
    ForbiddenMove { id: NodeId, new_parent: NodeId },

    #[error("snapshot is corrupt: {0}")]
    CorruptSnapshot(String),
}

pub type TreeResult<T> = Result<T, TreeError>;

/// Errors surfaced by `ExternalSync` implementations.
///
/// These belong to the environment; the engine stays internally consistent
/// whether or not a sync call completes.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("metadata persistence failed: {0}")]
    Metadata(String),

    #[error("content storage failed: {0}")]
    Content(String),

    #[error("sync backend unavailable: {0}")]
    Unavailable(String),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("could not determine platform config directory")]
    NoProjectDirs,

    #[error("invalid logging configuration: {0}")]
    Logging(String),
}

/// CLI-level errors: tree errors plus file and serialization failures.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tree file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no tree file at {0}; run `canopy init` first")]
    MissingTree(PathBuf),

    #[error("tree file already exists at {0}; refusing to overwrite")]
    TreeExists(PathBuf),
}
