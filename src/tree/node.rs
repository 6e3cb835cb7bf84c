//! Tree node types: folders with ordered child ids, files with content.

use crate::types::{NodeId, NodeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in the tree.
///
/// `updated_at` is refreshed on every mutation of this node (rename, content
/// write, move) but never on mutation of descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub payload: NodePayload,
}

/// Kind-specific payload.
///
/// The tagged union makes "write content to a folder" unrepresentable
/// outside the checked `NotAFile` path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodePayload {
    Folder {
        /// Child ids in insertion order. Order is significant and preserved
        /// across all operations.
        children: Vec<NodeId>,
    },
    File {
        /// Current content blob; empty on creation.
        #[serde(default)]
        content: Vec<u8>,
        /// MIME type for the sync boundary; metadata records never embed it.
        #[serde(default)]
        mime_type: Option<String>,
    },
}

impl Node {
    /// Create an empty folder with a fresh id, stamped now.
    pub fn new_folder(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Node {
            id: NodeId::fresh(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            payload: NodePayload::Folder {
                children: Vec::new(),
            },
        }
    }

    /// Create an empty file with a fresh id, stamped now.
    pub fn new_file(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Node {
            id: NodeId::fresh(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            payload: NodePayload::File {
                content: Vec::new(),
                mime_type: None,
            },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.payload {
            NodePayload::Folder { .. } => NodeKind::Folder,
            NodePayload::File { .. } => NodeKind::File,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.payload, NodePayload::Folder { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.payload, NodePayload::File { .. })
    }

    /// Child ids for folders, `None` for files.
    pub fn children(&self) -> Option<&[NodeId]> {
        match &self.payload {
            NodePayload::Folder { children } => Some(children),
            NodePayload::File { .. } => None,
        }
    }

    /// Content bytes for files, `None` for folders.
    pub fn content(&self) -> Option<&[u8]> {
        match &self.payload {
            NodePayload::File { content, .. } => Some(content),
            NodePayload::Folder { .. } => None,
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        match &self.payload {
            NodePayload::File { mime_type, .. } => mime_type.as_deref(),
            NodePayload::Folder { .. } => None,
        }
    }

    /// Refresh `updated_at`. Called by the store on every mutation of this
    /// node; descendants are never touched.
    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
