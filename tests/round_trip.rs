//! Metadata round trip: serializing every node to its record and
//! reconstructing yields a structurally identical tree, including through
//! a JSON wire hop.

use canopy::sync::{restore, snapshot, NodeMetadata};
use canopy::{NodeKind, ProjectTree};

fn busy_tree() -> ProjectTree {
    let mut tree = ProjectTree::new("workspace");
    let root = tree.root_id();
    let docs = tree.create(root, "Docs", NodeKind::Folder).unwrap();
    let assets = tree.create(root, "Assets", NodeKind::Folder).unwrap();
    let spec = tree.create(docs, "spec.md", NodeKind::File).unwrap();
    tree.create(docs, "spec.md", NodeKind::File).unwrap(); // duplicate names are legal
    tree.create(assets, "logo.png", NodeKind::File).unwrap();
    let nested = tree.create(assets, "icons", NodeKind::Folder).unwrap();
    tree.create(nested, "small.svg", NodeKind::File).unwrap();
    tree.update_content_with_mime(spec, b"# Spec".to_vec(), "text/markdown")
        .unwrap();
    tree
}

#[test]
fn structure_survives_snapshot_restore() {
    let tree = busy_tree();
    let records = snapshot(tree.store());
    let restored = restore(&records).unwrap();

    assert_eq!(restored.root_id(), tree.root_id());
    assert_eq!(restored.len(), tree.store().len());
    for record in &records {
        let original = tree.store().get(record.id).unwrap();
        let rebuilt = restored.get(record.id).unwrap();
        assert_eq!(rebuilt.name, original.name);
        assert_eq!(rebuilt.kind(), original.kind());
        assert_eq!(rebuilt.children(), original.children());
        assert_eq!(rebuilt.created_at, original.created_at);
        assert_eq!(rebuilt.updated_at, original.updated_at);
        assert_eq!(restored.parent_of(record.id), tree.store().parent_of(record.id));
    }
    restored.verify().unwrap();
}

#[test]
fn structure_survives_a_json_wire_hop() {
    let tree = busy_tree();
    let records = snapshot(tree.store());

    let wire = serde_json::to_string(&records).unwrap();
    let decoded: Vec<NodeMetadata> = serde_json::from_str(&wire).unwrap();
    assert_eq!(decoded, records);

    let restored = restore(&decoded).unwrap();
    restored.verify().unwrap();
    assert_eq!(restored.len(), tree.store().len());
}

#[test]
fn records_use_the_documented_wire_shape() {
    let tree = busy_tree();
    let records = snapshot(tree.store());
    let json = serde_json::to_value(&records).unwrap();

    let root = &json[0];
    assert!(root["parentId"].is_null());
    assert_eq!(root["kind"], "folder");

    for record in json.as_array().unwrap() {
        assert!(record["id"].is_string());
        assert!(record["name"].is_string());
        assert!(record["createdAt"].is_string());
        assert!(record["updatedAt"].is_string());
        let kind = record["kind"].as_str().unwrap();
        assert!(kind == "folder" || kind == "file");
        // Content never rides in the metadata record.
        assert!(record.get("content").is_none());
        assert!(record.get("mimeType").is_none());
    }
}

#[test]
fn restore_order_is_insensitive_to_record_shuffling_within_parents() {
    // Records for different parents may interleave arbitrarily; only the
    // relative order of same-parent records carries child order.
    let tree = busy_tree();
    let mut records = snapshot(tree.store());
    records.reverse();

    let restored = restore(&records).unwrap();
    restored.verify().unwrap();
    for record in &records {
        let original_children: Vec<_> = tree
            .store()
            .get(record.id)
            .unwrap()
            .children()
            .map(|c| {
                let mut v = c.to_vec();
                v.sort();
                v
            })
            .unwrap_or_default();
        let restored_children: Vec<_> = restored
            .get(record.id)
            .unwrap()
            .children()
            .map(|c| {
                let mut v = c.to_vec();
                v.sort();
                v
            })
            .unwrap_or_default();
        assert_eq!(restored_children, original_children);
    }
}
