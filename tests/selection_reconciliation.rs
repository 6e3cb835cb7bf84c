//! Selection reconciliation against deletes: removing any ancestor of the
//! open file clears the selection; removing anything else never does.

use canopy::{NodeKind, ProjectTree, SelectionController};

/// Build root -> a -> b -> c -> open.txt, with a sibling branch off root.
fn deep_tree() -> (ProjectTree, Vec<canopy::NodeId>, canopy::NodeId, canopy::NodeId) {
    let mut tree = ProjectTree::new("project");
    let root = tree.root_id();
    let a = tree.create(root, "a", NodeKind::Folder).unwrap();
    let b = tree.create(a, "b", NodeKind::Folder).unwrap();
    let c = tree.create(b, "c", NodeKind::Folder).unwrap();
    let open = tree.create(c, "open.txt", NodeKind::File).unwrap();
    let bystander = tree.create(root, "bystander", NodeKind::Folder).unwrap();
    tree.create(bystander, "other.txt", NodeKind::File).unwrap();
    (tree, vec![a, b, c], open, bystander)
}

#[test]
fn deleting_each_ancestor_clears_selection() {
    let (template, ancestors, open, _) = deep_tree();
    let mut targets = ancestors.clone();
    targets.push(open);

    for target in targets {
        let mut tree = template.clone();
        let mut selection = SelectionController::new();
        selection.select(tree.store(), open).unwrap();

        let removed = tree.delete(target).unwrap();
        selection.on_delete(&removed);
        assert_eq!(
            selection.open_id(),
            None,
            "deleting {target} should clear the open file"
        );
    }
}

#[test]
fn deleting_non_ancestors_preserves_selection() {
    let (mut tree, _, open, bystander) = deep_tree();
    let mut selection = SelectionController::new();
    selection.select(tree.store(), open).unwrap();

    let removed = tree.delete(bystander).unwrap();
    assert_eq!(removed.len(), 2);
    selection.on_delete(&removed);
    assert_eq!(selection.open_id(), Some(open));
}

#[test]
fn rename_and_content_updates_keep_selection() {
    let (mut tree, ancestors, open, _) = deep_tree();
    let mut selection = SelectionController::new();
    selection.select(tree.store(), open).unwrap();

    tree.rename(open, "renamed.txt").unwrap();
    tree.rename(ancestors[0], "renamed-folder").unwrap();
    tree.update_content(open, b"new content".to_vec()).unwrap();

    // Selection is by id, stable across renames and content writes.
    assert_eq!(selection.open_id(), Some(open));
    assert!(selection.select(tree.store(), open).is_ok());
}
