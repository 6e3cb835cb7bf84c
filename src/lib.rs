//! Canopy: In-Memory Virtual Filesystem Engine
//!
//! A small, reusable virtual filesystem (VFS) engine: a tree of folders and
//! files held in an id-addressed arena, with atomic create/rename/delete/
//! update operations, selection reconciliation, and a pluggable persistence
//! boundary for metadata and content blobs.

pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod selection;
pub mod sync;
pub mod tooling;
pub mod tree;
pub mod types;

pub use error::{TreeError, TreeResult};
pub use selection::SelectionController;
pub use tree::{Node, NodePayload, NodeStore, ProjectTree, RemovedSet};
pub use types::{NodeId, NodeKind};
