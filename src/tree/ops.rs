//! Tree operations: atomic create/rename/delete/update/move plus search.
//!
//! Every operation either fully applies or leaves the tree bit-identical;
//! validation always precedes the first mutation.

use crate::config::TreeConfig;
use crate::error::{TreeError, TreeResult};
use crate::tree::node::{Node, NodePayload};
use crate::tree::store::NodeStore;
use crate::types::{NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The complete set of ids eliminated by a single delete call.
///
/// Serializes as an ordered id list; parent-before-children order is not
/// guaranteed, since the whole set is removed atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemovedSet {
    ids: Vec<NodeId>,
}

impl RemovedSet {
    fn new(ids: Vec<NodeId>) -> Self {
        RemovedSet { ids }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<'a> IntoIterator for &'a RemovedSet {
    type Item = &'a NodeId;
    type IntoIter = std::slice::Iter<'a, NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

/// A project's file tree: the node store plus the engine options that
/// govern its operations. Constructed per project, torn down on close.
///
/// Single-writer by contract: wrap in [`crate::concurrency::SharedTree`]
/// when more than one caller holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTree {
    store: NodeStore,
    #[serde(default)]
    config: TreeConfig,
}

impl ProjectTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self::with_config(root_name, TreeConfig::default())
    }

    pub fn with_config(root_name: impl Into<String>, config: TreeConfig) -> Self {
        ProjectTree {
            store: NodeStore::new(root_name),
            config,
        }
    }

    pub fn from_store(store: NodeStore, config: TreeConfig) -> Self {
        ProjectTree { store, config }
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn root_id(&self) -> NodeId {
        self.store.root_id()
    }

    /// Create a node as the last child of `parent_id` and return its fresh
    /// id. The new node's `created_at` and `updated_at` are both stamped
    /// now; the parent's timestamps are untouched.
    pub fn create(
        &mut self,
        parent_id: NodeId,
        name: &str,
        kind: NodeKind,
    ) -> TreeResult<NodeId> {
        match self.store.get(parent_id) {
            Ok(node) if node.is_folder() => {}
            _ => return Err(TreeError::InvalidParent(parent_id)),
        }
        if name.is_empty() {
            return Err(TreeError::InvalidName);
        }
        self.reject_duplicate(parent_id, name, None)?;

        let node = match kind {
            NodeKind::Folder => Node::new_folder(name),
            NodeKind::File => Node::new_file(name),
        };
        let id = self.store.attach(parent_id, node)?;
        debug!(%id, %parent_id, name, %kind, "created node");
        Ok(id)
    }

    /// Rename a node. Touches only the target's `name` and `updated_at`:
    /// no structure changes, no other node changes, selection unaffected.
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> TreeResult<()> {
        self.store.get(id)?;
        if new_name.is_empty() {
            return Err(TreeError::InvalidName);
        }
        if let Some(parent_id) = self.store.parent_of(id) {
            self.reject_duplicate(parent_id, new_name, Some(id))?;
        }
        let node = self.store.get_mut(id)?;
        node.name = new_name.to_string();
        node.touch();
        debug!(%id, new_name, "renamed node");
        Ok(())
    }

    /// Delete the whole subtree rooted at `id` and return every removed
    /// id, so callers can reconcile selection and cascade-delete persisted
    /// metadata and blobs.
    pub fn delete(&mut self, id: NodeId) -> TreeResult<RemovedSet> {
        if !self.store.exists(id) {
            return Err(TreeError::NotFound(id));
        }
        if id == self.store.root_id() {
            return Err(TreeError::ForbiddenRoot);
        }
        let removed = RemovedSet::new(self.store.detach_subtree(id));
        debug!(%id, removed = removed.len(), "deleted subtree");
        Ok(removed)
    }

    /// Replace a file's content blob and stamp its `updated_at`.
    pub fn update_content(&mut self, id: NodeId, content: impl Into<Vec<u8>>) -> TreeResult<()> {
        self.write_content(id, content.into(), None)
    }

    /// Replace a file's content blob along with its MIME type.
    pub fn update_content_with_mime(
        &mut self,
        id: NodeId,
        content: impl Into<Vec<u8>>,
        mime: impl Into<String>,
    ) -> TreeResult<()> {
        self.write_content(id, content.into(), Some(mime.into()))
    }

    fn write_content(
        &mut self,
        id: NodeId,
        new_content: Vec<u8>,
        new_mime: Option<String>,
    ) -> TreeResult<()> {
        let node = self.store.get_mut(id)?;
        match &mut node.payload {
            NodePayload::File { content, mime_type } => {
                *content = new_content;
                if new_mime.is_some() {
                    *mime_type = new_mime;
                }
            }
            NodePayload::Folder { .. } => return Err(TreeError::NotAFile(id)),
        }
        node.touch();
        debug!(%id, "updated content");
        Ok(())
    }

    /// Reparent `id` as the last child of `new_parent_id`.
    ///
    /// Rejects moving the root, moving under a file, and any move that
    /// would place a node inside its own subtree. Bumps only the moved
    /// node's `updated_at`; selection is id-stable and unaffected.
    pub fn move_node(&mut self, id: NodeId, new_parent_id: NodeId) -> TreeResult<()> {
        if !self.store.exists(id) {
            return Err(TreeError::NotFound(id));
        }
        if id == self.store.root_id() {
            return Err(TreeError::ForbiddenRoot);
        }
        match self.store.get(new_parent_id) {
            Ok(node) if node.is_folder() => {}
            _ => return Err(TreeError::InvalidParent(new_parent_id)),
        }
        if new_parent_id == id || self.store.is_descendant(id, new_parent_id) {
            return Err(TreeError::ForbiddenMove {
                id,
                new_parent: new_parent_id,
            });
        }
        let name = self.store.get(id)?.name.clone();
        self.reject_duplicate(new_parent_id, &name, Some(id))?;

        self.store.reattach(id, new_parent_id);
        self.store.get_mut(id)?.touch();
        debug!(%id, %new_parent_id, "moved node");
        Ok(())
    }

    /// Search node names for a substring. Returns a restartable, lazy
    /// pre-order iterator (root first, children in stored order) with no
    /// side effects. Matching is case-insensitive unless
    /// [`TreeConfig::case_sensitive_search`] is set.
    pub fn search<'a>(&'a self, query: &str) -> Search<'a> {
        let needle = if self.config.case_sensitive_search {
            query.to_string()
        } else {
            query.to_lowercase()
        };
        Search {
            store: &self.store,
            needle,
            case_sensitive: self.config.case_sensitive_search,
            stack: vec![self.store.root_id()],
        }
    }

    /// Duplicate sibling names are legal unless the config opts in to
    /// uniqueness; stricter semantics are never added silently.
    fn reject_duplicate(
        &self,
        parent_id: NodeId,
        name: &str,
        exclude: Option<NodeId>,
    ) -> TreeResult<()> {
        if !self.config.unique_sibling_names {
            return Ok(());
        }
        for child_id in self.store.children_of(parent_id)? {
            if Some(*child_id) == exclude {
                continue;
            }
            if self.store.get(*child_id)?.name == name {
                return Err(TreeError::DuplicateName {
                    parent: parent_id,
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Lazy pre-order name search over the tree.
///
/// Holds an explicit work stack instead of recursing, so arbitrarily deep
/// folder structures cannot overflow the call stack.
pub struct Search<'a> {
    store: &'a NodeStore,
    needle: String,
    case_sensitive: bool,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Search<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let node = self.store.get(id).ok()?;
            if let Some(children) = node.children() {
                // Reverse so the first child is visited next.
                self.stack.extend(children.iter().rev().copied());
            }
            let matched = if self.case_sensitive {
                node.name.contains(&self.needle)
            } else {
                node.name.to_lowercase().contains(&self.needle)
            };
            if matched {
                return Some(node);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_returns_fresh_ids() {
        let mut tree = ProjectTree::new("project");
        let root = tree.root_id();
        let a = tree.create(root, "a", NodeKind::Folder).unwrap();
        let b = tree.create(root, "b", NodeKind::File).unwrap();
        assert_ne!(a, b);
        assert_eq!(tree.store().children_of(root).unwrap(), &[a, b]);
    }

    #[test]
    fn test_create_under_file_is_invalid_parent() {
        let mut tree = ProjectTree::new("project");
        let root = tree.root_id();
        let file = tree.create(root, "a.txt", NodeKind::File).unwrap();
        assert_eq!(
            tree.create(file, "b", NodeKind::Folder),
            Err(TreeError::InvalidParent(file))
        );
    }

    #[test]
    fn test_create_under_absent_parent_is_invalid_parent() {
        let mut tree = ProjectTree::new("project");
        let ghost = NodeId::fresh();
        assert_eq!(
            tree.create(ghost, "a", NodeKind::Folder),
            Err(TreeError::InvalidParent(ghost))
        );
    }

    #[test]
    fn test_duplicate_names_allowed_by_default() {
        let mut tree = ProjectTree::new("project");
        let root = tree.root_id();
        tree.create(root, "notes", NodeKind::File).unwrap();
        tree.create(root, "notes", NodeKind::File).unwrap();
        assert_eq!(tree.store().children_of(root).unwrap().len(), 2);
    }

    #[test]
    fn test_unique_names_when_configured() {
        let config = TreeConfig {
            unique_sibling_names: true,
            ..TreeConfig::default()
        };
        let mut tree = ProjectTree::with_config("project", config);
        let root = tree.root_id();
        tree.create(root, "notes", NodeKind::File).unwrap();
        assert_eq!(
            tree.create(root, "notes", NodeKind::File),
            Err(TreeError::DuplicateName {
                parent: root,
                name: "notes".to_string(),
            })
        );
        // Renaming a node to its own name is not a conflict with itself.
        let other = tree.create(root, "other", NodeKind::File).unwrap();
        tree.rename(other, "other").unwrap();
    }

    #[test]
    fn test_rename_touches_only_the_target() {
        let mut tree = ProjectTree::new("project");
        let root = tree.root_id();
        let docs = tree.create(root, "Docs", NodeKind::Folder).unwrap();
        let file = tree.create(docs, "a.txt", NodeKind::File).unwrap();
        let root_before = tree.store().get(root).unwrap().clone();
        let file_before = tree.store().get(file).unwrap().clone();

        tree.rename(docs, "Documents").unwrap();

        let docs_node = tree.store().get(docs).unwrap();
        assert_eq!(docs_node.name, "Documents");
        assert!(docs_node.updated_at >= docs_node.created_at);
        assert_eq!(tree.store().get(root).unwrap(), &root_before);
        assert_eq!(tree.store().get(file).unwrap(), &file_before);
    }

    #[test]
    fn test_rename_empty_is_invalid_name() {
        let mut tree = ProjectTree::new("project");
        let root = tree.root_id();
        let file = tree.create(root, "a.txt", NodeKind::File).unwrap();
        assert_eq!(tree.rename(file, ""), Err(TreeError::InvalidName));
        assert_eq!(tree.store().get(file).unwrap().name, "a.txt");
    }

    #[test]
    fn test_delete_returns_full_subtree() {
        let mut tree = ProjectTree::new("project");
        let root = tree.root_id();
        let docs = tree.create(root, "Docs", NodeKind::Folder).unwrap();
        let inner = tree.create(docs, "Inner", NodeKind::Folder).unwrap();
        let file = tree.create(inner, "a.txt", NodeKind::File).unwrap();
        let sibling = tree.create(root, "keep.txt", NodeKind::File).unwrap();

        let removed = tree.delete(docs).unwrap();
        assert_eq!(removed.len(), 3);
        for id in [docs, inner, file] {
            assert!(removed.contains(id));
            assert!(!tree.store().exists(id));
        }
        assert!(tree.store().exists(sibling));
        tree.store().verify().unwrap();
    }

    #[test]
    fn test_delete_absent_is_not_found() {
        let mut tree = ProjectTree::new("project");
        let ghost = NodeId::fresh();
        assert_eq!(tree.delete(ghost), Err(TreeError::NotFound(ghost)));
    }

    #[test]
    fn test_update_content_on_folder_is_not_a_file() {
        let mut tree = ProjectTree::new("project");
        let root = tree.root_id();
        let docs = tree.create(root, "Docs", NodeKind::Folder).unwrap();
        assert_eq!(
            tree.update_content(docs, b"data".to_vec()),
            Err(TreeError::NotAFile(docs))
        );
    }

    #[test]
    fn test_update_content_replaces_blob() {
        let mut tree = ProjectTree::new("project");
        let root = tree.root_id();
        let file = tree.create(root, "a.md", NodeKind::File).unwrap();
        tree.update_content_with_mime(file, b"# Hi".to_vec(), "text/markdown")
            .unwrap();
        let node = tree.store().get(file).unwrap();
        assert_eq!(node.content(), Some(&b"# Hi"[..]));
        assert_eq!(node.mime_type(), Some("text/markdown"));

        // Plain update keeps the established mime type.
        tree.update_content(file, b"# Bye".to_vec()).unwrap();
        let node = tree.store().get(file).unwrap();
        assert_eq!(node.content(), Some(&b"# Bye"[..]));
        assert_eq!(node.mime_type(), Some("text/markdown"));
    }

    #[test]
    fn test_move_rejects_cycles() {
        let mut tree = ProjectTree::new("project");
        let root = tree.root_id();
        let outer = tree.create(root, "Outer", NodeKind::Folder).unwrap();
        let inner = tree.create(outer, "Inner", NodeKind::Folder).unwrap();

        assert_eq!(
            tree.move_node(outer, inner),
            Err(TreeError::ForbiddenMove {
                id: outer,
                new_parent: inner,
            })
        );
        assert_eq!(
            tree.move_node(outer, outer),
            Err(TreeError::ForbiddenMove {
                id: outer,
                new_parent: outer,
            })
        );
        tree.store().verify().unwrap();
    }

    #[test]
    fn test_move_appends_to_new_parent() {
        let mut tree = ProjectTree::new("project");
        let root = tree.root_id();
        let docs = tree.create(root, "Docs", NodeKind::Folder).unwrap();
        let misc = tree.create(root, "Misc", NodeKind::Folder).unwrap();
        let existing = tree.create(misc, "old.txt", NodeKind::File).unwrap();
        let file = tree.create(docs, "a.txt", NodeKind::File).unwrap();

        tree.move_node(file, misc).unwrap();
        assert_eq!(tree.store().children_of(misc).unwrap(), &[existing, file]);
        assert_eq!(
            tree.store().children_of(docs).unwrap(),
            &[] as &[NodeId]
        );
        assert_eq!(tree.store().parent_of(file), Some(misc));
        tree.store().verify().unwrap();
    }

    #[test]
    fn test_move_root_is_forbidden() {
        let mut tree = ProjectTree::new("project");
        let root = tree.root_id();
        let docs = tree.create(root, "Docs", NodeKind::Folder).unwrap();
        assert_eq!(tree.move_node(root, docs), Err(TreeError::ForbiddenRoot));
    }

    #[test]
    fn test_search_is_preorder_and_case_insensitive() {
        let mut tree = ProjectTree::new("Project");
        let root = tree.root_id();
        let docs = tree.create(root, "Docs", NodeKind::Folder).unwrap();
        let readme = tree.create(docs, "README.md", NodeKind::File).unwrap();
        let misc = tree.create(root, "misc-docs", NodeKind::Folder).unwrap();

        let hits: Vec<NodeId> = tree.search("doc").map(|n| n.id).collect();
        assert_eq!(hits, vec![docs, misc]);

        let hits: Vec<NodeId> = tree.search("readme").map(|n| n.id).collect();
        assert_eq!(hits, vec![readme]);
    }

    #[test]
    fn test_search_is_restartable() {
        let mut tree = ProjectTree::new("project");
        let root = tree.root_id();
        tree.create(root, "a.txt", NodeKind::File).unwrap();

        let first: Vec<NodeId> = tree.search("a.txt").map(|n| n.id).collect();
        let second: Vec<NodeId> = tree.search("a.txt").map(|n| n.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_search_case_sensitive_when_configured() {
        let config = TreeConfig {
            case_sensitive_search: true,
            ..TreeConfig::default()
        };
        let mut tree = ProjectTree::with_config("project", config);
        let root = tree.root_id();
        let upper = tree.create(root, "README", NodeKind::File).unwrap();
        tree.create(root, "readme", NodeKind::File).unwrap();

        let hits: Vec<NodeId> = tree.search("READ").map(|n| n.id).collect();
        assert_eq!(hits, vec![upper]);
    }

    #[test]
    fn test_search_survives_deep_nesting() {
        let mut tree = ProjectTree::new("project");
        let mut parent = tree.root_id();
        for i in 0..10_000 {
            parent = tree
                .create(parent, &format!("level-{i}"), NodeKind::Folder)
                .unwrap();
        }
        let leaf = tree.create(parent, "needle.txt", NodeKind::File).unwrap();

        let hits: Vec<NodeId> = tree.search("needle").map(|n| n.id).collect();
        assert_eq!(hits, vec![leaf]);

        // Deleting the whole chain must not recurse either.
        let top = tree.store().children_of(tree.root_id()).unwrap()[0];
        let removed = tree.delete(top).unwrap();
        assert_eq!(removed.len(), 10_001);
    }
}
