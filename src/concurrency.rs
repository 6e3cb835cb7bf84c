//! Concurrent access safety for server-side embedding.
//!
//! The engine is single-writer: operations assume one logical writer at a
//! time and are not safe for unguarded concurrent mutation. `SharedTree`
//! is the required discipline when a tree is held by more than one caller
//! (e.g. one tree per project in a request-handling server): a single
//! read-write lock guarding the whole tree.

use crate::tree::ops::ProjectTree;
use parking_lot::RwLock;
use std::sync::Arc;

/// A project tree behind a whole-tree read-write lock.
///
/// Reads run concurrently; writes are mutually exclusive. Operations run
/// to completion without suspension, so guards are never held across
/// await points.
#[derive(Clone)]
pub struct SharedTree {
    inner: Arc<RwLock<ProjectTree>>,
}

impl SharedTree {
    pub fn new(tree: ProjectTree) -> Self {
        SharedTree {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Run a read-only closure under the shared lock.
    pub fn read<R>(&self, f: impl FnOnce(&ProjectTree) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run a mutating closure under the exclusive lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut ProjectTree) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Take the tree back out, if this is the last handle.
    pub fn try_unwrap(self) -> Result<ProjectTree, SharedTree> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| SharedTree { inner })
    }
}
