//! External sync boundary: persistence of node metadata and content blobs.
//!
//! The engine does not implement persistence. It defines what it needs from
//! the environment (metadata rows in some relational store, blobs in some
//! object store) and hands the environment enough to cascade: the
//! `RemovedSet` from every delete, the affected node from every
//! create/rename/update.
//!
//! Ordering contract: the in-memory tree is the source of truth. The engine
//! mutates first; a sync call that fails or is never awaited leaves the tree
//! consistent. Callers wanting persist-confirmed-then-mutate take a
//! [`snapshot`] first, persist it, and apply the mutation on confirmation.

use crate::error::{SyncError, TreeError, TreeResult};
use crate::tree::node::{Node, NodePayload};
use crate::tree::store::NodeStore;
use crate::types::{NodeId, NodeKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One node's metadata record, as exchanged with the backing store.
///
/// Content is never embedded here; it travels separately as bytes plus a
/// MIME type through [`ExternalSync::put_content`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub name: String,
    pub kind: NodeKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NodeMetadata {
    pub fn from_node(node: &Node, parent_id: Option<NodeId>) -> Self {
        NodeMetadata {
            id: node.id,
            parent_id,
            name: node.name.clone(),
            kind: node.kind(),
            created_at: node.created_at,
            updated_at: node.updated_at,
        }
    }
}

/// What the engine requires from its persistence environment.
///
/// Calls are asynchronous and fallible; cancellation and timeouts are the
/// environment's responsibility. Fire-and-forget is acceptable only if the
/// environment separately surfaces failures or guarantees eventual
/// consistency.
#[async_trait]
pub trait ExternalSync: Send + Sync {
    /// Upsert a node's metadata row.
    async fn persist_metadata(&self, record: &NodeMetadata) -> Result<(), SyncError>;

    /// Delete a node's metadata row.
    async fn delete_metadata(&self, id: &NodeId) -> Result<(), SyncError>;

    /// Store a file's current content blob.
    async fn put_content(&self, id: &NodeId, bytes: &[u8], mime_type: &str)
        -> Result<(), SyncError>;

    /// An addressable (possibly time-limited, signed) URL for a file's
    /// content.
    async fn content_url(&self, id: &NodeId) -> Result<String, SyncError>;
}

/// Sync implementation that accepts everything and stores nothing. Useful
/// for purely in-memory sessions and as a test double baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSync;

#[async_trait]
impl ExternalSync for NullSync {
    async fn persist_metadata(&self, _record: &NodeMetadata) -> Result<(), SyncError> {
        Ok(())
    }

    async fn delete_metadata(&self, _id: &NodeId) -> Result<(), SyncError> {
        Ok(())
    }

    async fn put_content(
        &self,
        _id: &NodeId,
        _bytes: &[u8],
        _mime_type: &str,
    ) -> Result<(), SyncError> {
        Ok(())
    }

    async fn content_url(&self, id: &NodeId) -> Result<String, SyncError> {
        Ok(format!("null://{id}"))
    }
}

/// Serialize every reachable node to its metadata record, pre-order, root
/// first, children in stored order.
pub fn snapshot(store: &NodeStore) -> Vec<NodeMetadata> {
    let mut records = Vec::with_capacity(store.len());
    let mut stack = vec![store.root_id()];
    while let Some(id) = stack.pop() {
        let Ok(node) = store.get(id) else { continue };
        records.push(NodeMetadata::from_node(node, store.parent_of(id)));
        if let Some(children) = node.children() {
            stack.extend(children.iter().rev().copied());
        }
    }
    records
}

/// Reconstruct a store from metadata records.
///
/// The result is structurally identical to the snapshotted tree: same ids,
/// same parent/child edges, same names, same child order, same timestamps.
/// File content is not part of metadata and comes back empty; it is
/// restored separately through the content side of the boundary.
pub fn restore(records: &[NodeMetadata]) -> TreeResult<NodeStore> {
    let mut root_id = None;
    for record in records {
        if record.parent_id.is_none() {
            if root_id.replace(record.id).is_some() {
                return Err(TreeError::CorruptSnapshot(
                    "more than one parentless record".into(),
                ));
            }
        }
    }
    let root_id = root_id
        .ok_or_else(|| TreeError::CorruptSnapshot("no parentless (root) record".into()))?;

    let mut nodes: HashMap<NodeId, Node> = HashMap::with_capacity(records.len());
    for record in records {
        let payload = match record.kind {
            NodeKind::Folder => NodePayload::Folder {
                children: Vec::new(),
            },
            NodeKind::File => NodePayload::File {
                content: Vec::new(),
                mime_type: None,
            },
        };
        let node = Node {
            id: record.id,
            name: record.name.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            payload,
        };
        if nodes.insert(record.id, node).is_some() {
            return Err(TreeError::CorruptSnapshot(format!(
                "duplicate record for {}",
                record.id
            )));
        }
    }

    // Children lists follow record order, which snapshot emits in stored
    // child order; a pre-order snapshot therefore round-trips exactly.
    for record in records {
        let Some(parent_id) = record.parent_id else {
            continue;
        };
        match nodes.get_mut(&parent_id).map(|n| &mut n.payload) {
            Some(NodePayload::Folder { children }) => children.push(record.id),
            Some(NodePayload::File { .. }) => {
                return Err(TreeError::CorruptSnapshot(format!(
                    "record {} claims file {parent_id} as parent",
                    record.id
                )))
            }
            None => {
                return Err(TreeError::CorruptSnapshot(format!(
                    "record {} references missing parent {parent_id}",
                    record.id
                )))
            }
        }
    }

    NodeStore::from_parts(root_id, nodes)
}
