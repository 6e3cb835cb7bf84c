//! NodeStore: the id-addressed node arena.
//!
//! Holds the root id, the id -> node map, and a child -> parent index.
//! Only the invariant-preserving primitives in this module may mutate
//! structure; the operations layer validates and composes them.

use crate::error::{TreeError, TreeResult};
use crate::tree::node::{Node, NodePayload};
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The canonical tree: one distinguished root folder plus a flat map of
/// nodes. The root's id and existence never change; only its children do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoreRepr", into = "StoreRepr")]
pub struct NodeStore {
    root_id: NodeId,
    nodes: HashMap<NodeId, Node>,
    /// Child id -> owning folder id. Rebuilt on deserialization, never
    /// serialized. The root has no entry.
    parents: HashMap<NodeId, NodeId>,
}

/// Serialized form: the parent index is derivable from children lists.
#[derive(Serialize, Deserialize)]
struct StoreRepr {
    root_id: NodeId,
    nodes: HashMap<NodeId, Node>,
}

impl From<NodeStore> for StoreRepr {
    fn from(store: NodeStore) -> Self {
        StoreRepr {
            root_id: store.root_id,
            nodes: store.nodes,
        }
    }
}

impl TryFrom<StoreRepr> for NodeStore {
    type Error = TreeError;

    fn try_from(repr: StoreRepr) -> TreeResult<Self> {
        NodeStore::from_parts(repr.root_id, repr.nodes)
    }
}

impl NodeStore {
    /// Create a store containing only a root folder with the given name.
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = Node::new_folder(root_name);
        let root_id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        NodeStore {
            root_id,
            nodes,
            parents: HashMap::new(),
        }
    }

    /// Rebuild a store from a root id and node map, deriving the parent
    /// index from children lists and verifying every invariant.
    pub(crate) fn from_parts(root_id: NodeId, nodes: HashMap<NodeId, Node>) -> TreeResult<Self> {
        let mut parents = HashMap::new();
        for node in nodes.values() {
            if let Some(children) = node.children() {
                for child in children {
                    if parents.insert(*child, node.id).is_some() {
                        return Err(TreeError::CorruptSnapshot(format!(
                            "node {child} is owned by more than one folder"
                        )));
                    }
                }
            }
        }
        let store = NodeStore {
            root_id,
            nodes,
            parents,
        };
        store.verify()?;
        Ok(store)
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn root(&self) -> &Node {
        // Root presence is a structural invariant.
        &self.nodes[&self.root_id]
    }

    /// Number of nodes in the store, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn exists(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> TreeResult<&Node> {
        self.nodes.get(&id).ok_or(TreeError::NotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> TreeResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(TreeError::NotFound(id))
    }

    /// Child ids of a folder, in insertion order.
    pub fn children_of(&self, id: NodeId) -> TreeResult<&[NodeId]> {
        self.get(id)?.children().ok_or(TreeError::NotAFile(id))
    }

    /// Owning folder of a node; `None` for the root and for absent ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    /// True when `id` lies strictly inside the subtree rooted at
    /// `ancestor_id`. A node is not its own descendant. Walks the parent
    /// index upward, so cost is bounded by tree depth with no recursion.
    pub fn is_descendant(&self, ancestor_id: NodeId, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            if parent == ancestor_id {
                return true;
            }
            current = parent;
        }
        false
    }

    /// All ids in the subtree rooted at `id`, pre-order, `id` first.
    /// Iterative work stack; never recurses on tree depth.
    pub(crate) fn collect_subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut collected = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                collected.push(current);
                if let Some(children) = node.children() {
                    // Reverse so the first child is popped first.
                    stack.extend(children.iter().rev().copied());
                }
            }
        }
        collected
    }

    /// Insert `node` as the last child of `parent_id`.
    ///
    /// The parent's `updated_at` is deliberately left alone: descendant
    /// mutations never touch ancestors.
    pub(crate) fn attach(&mut self, parent_id: NodeId, node: Node) -> TreeResult<NodeId> {
        let id = node.id;
        let parent = self
            .nodes
            .get_mut(&parent_id)
            .ok_or(TreeError::InvalidParent(parent_id))?;
        match &mut parent.payload {
            NodePayload::Folder { children } => children.push(id),
            NodePayload::File { .. } => return Err(TreeError::InvalidParent(parent_id)),
        }
        self.nodes.insert(id, node);
        self.parents.insert(id, parent_id);
        Ok(id)
    }

    /// Remove the whole subtree rooted at `id` from the store and detach
    /// `id` from its parent's children list. Returns the removed ids in
    /// pre-order. Caller guarantees `id` exists and is not the root.
    pub(crate) fn detach_subtree(&mut self, id: NodeId) -> Vec<NodeId> {
        if let Some(parent_id) = self.parents.get(&id).copied() {
            if let Some(NodePayload::Folder { children }) =
                self.nodes.get_mut(&parent_id).map(|n| &mut n.payload)
            {
                children.retain(|child| *child != id);
            }
        }
        let removed = self.collect_subtree(id);
        for removed_id in &removed {
            self.nodes.remove(removed_id);
            self.parents.remove(removed_id);
        }
        removed
    }

    /// Detach `id` from its current parent and append it to `new_parent`'s
    /// children. Caller guarantees both exist, `new_parent` is a folder,
    /// `id` is not the root, and the move creates no cycle.
    pub(crate) fn reattach(&mut self, id: NodeId, new_parent: NodeId) {
        if let Some(old_parent) = self.parents.get(&id).copied() {
            if let Some(NodePayload::Folder { children }) =
                self.nodes.get_mut(&old_parent).map(|n| &mut n.payload)
            {
                children.retain(|child| *child != id);
            }
        }
        if let Some(NodePayload::Folder { children }) =
            self.nodes.get_mut(&new_parent).map(|n| &mut n.payload)
        {
            children.push(id);
        }
        self.parents.insert(id, new_parent);
    }

    /// Audit every structural invariant:
    /// root presence and kind, referential integrity of children lists,
    /// unique ownership of every non-root id, parent-index consistency,
    /// and full reachability from the root (no orphaned entries).
    pub fn verify(&self) -> TreeResult<()> {
        let root = self
            .nodes
            .get(&self.root_id)
            .ok_or_else(|| TreeError::CorruptSnapshot("root node is missing".into()))?;
        if !root.is_folder() {
            return Err(TreeError::CorruptSnapshot("root node is not a folder".into()));
        }
        if self.parents.contains_key(&self.root_id) {
            return Err(TreeError::CorruptSnapshot("root node has a parent".into()));
        }

        let mut owned: HashSet<NodeId> = HashSet::new();
        for node in self.nodes.values() {
            if let Some(children) = node.children() {
                for child in children {
                    if !self.nodes.contains_key(child) {
                        return Err(TreeError::CorruptSnapshot(format!(
                            "folder {} references missing child {child}",
                            node.id
                        )));
                    }
                    if !owned.insert(*child) {
                        return Err(TreeError::CorruptSnapshot(format!(
                            "node {child} appears in more than one children list"
                        )));
                    }
                    if self.parents.get(child) != Some(&node.id) {
                        return Err(TreeError::CorruptSnapshot(format!(
                            "parent index disagrees with children list for {child}"
                        )));
                    }
                }
            }
        }
        if owned.len() != self.nodes.len() - 1 {
            return Err(TreeError::CorruptSnapshot(
                "some nodes are not owned by any folder".into(),
            ));
        }

        let reachable = self.collect_subtree(self.root_id);
        if reachable.len() != self.nodes.len() {
            return Err(TreeError::CorruptSnapshot(
                "some nodes are unreachable from the root".into(),
            ));
        }
        Ok(())
    }
}
