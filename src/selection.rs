//! Selection tracking: the "currently open" file.
//!
//! A two-state machine reconciled against tree mutations. Selection is by
//! id, so renames and content writes never disturb it; deletes clear it
//! whenever the open file is anywhere inside the removed subtree.

use crate::error::{TreeError, TreeResult};
use crate::tree::ops::RemovedSet;
use crate::tree::store::NodeStore;
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
enum SelectionState {
    #[default]
    NoSelection,
    Selected(NodeId),
}

/// Tracks at most one open file id, always either absent or a file
/// currently present in the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionController {
    state: SelectionState,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a previously saved selection, dropping it if the id no
    /// longer resolves to a file in `store`.
    pub fn restore(store: &NodeStore, open_id: Option<NodeId>) -> Self {
        let mut controller = Self::new();
        if let Some(id) = open_id {
            let _ = controller.select(store, id);
        }
        controller
    }

    /// The currently open file id, if any.
    pub fn open_id(&self) -> Option<NodeId> {
        match self.state {
            SelectionState::NoSelection => None,
            SelectionState::Selected(id) => Some(id),
        }
    }

    /// Open a file. Reports `NotAFile` when `id` names a folder or is
    /// absent from the tree; only present files are selectable.
    pub fn select(&mut self, store: &NodeStore, id: NodeId) -> TreeResult<()> {
        match store.get(id) {
            Ok(node) if node.is_file() => {
                self.state = SelectionState::Selected(id);
                debug!(%id, "selected file");
                Ok(())
            }
            _ => Err(TreeError::NotAFile(id)),
        }
    }

    /// Close whatever is open.
    pub fn clear(&mut self) {
        self.state = SelectionState::NoSelection;
    }

    /// Reconcile against a delete. Because `RemovedSet` is
    /// subtree-complete, deleting any ancestor of the open file clears the
    /// selection, not just deleting the file itself.
    pub fn on_delete(&mut self, removed: &RemovedSet) {
        if let SelectionState::Selected(id) = self.state {
            if removed.contains(id) {
                debug!(%id, "open file removed, clearing selection");
                self.state = SelectionState::NoSelection;
            }
        }
    }
}
