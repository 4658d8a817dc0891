//! Import/export round trip and the saved-workspace format.

use serde_json::{json, Value};

use cbm::domain::{
    export_json, import_tree, persisted_json, restore_persisted, DomainError, Node,
};

fn sample_payload() -> Value {
    json!({
        "title": "root",
        "children": [
            {
                "title": "Work",
                "dateAdded": "13285932710000000",
                "children": [
                    {"title": "Tools", "children": [
                        {"title": "Grafana", "url": "https://grafana.example", "id": "42"}
                    ]},
                    {"title": "", "url": "https://untitled.example"}
                ]
            },
            {"title": "Empty", "children": []}
        ]
    })
}

#[test]
fn given_well_formed_tree_when_exporting_after_import_then_structurally_equal() {
    // Arrange
    let payload = sample_payload();

    // Act
    let tree = import_tree(&payload.to_string()).unwrap();
    let exported: Value = serde_json::from_str(&export_json(tree.root()).unwrap()).unwrap();

    // Assert
    assert_eq!(exported, payload);
}

#[test]
fn given_single_element_array_when_importing_then_root_is_element() {
    let payload = json!([sample_payload()]);
    let tree = import_tree(&payload.to_string()).unwrap();
    assert_eq!(tree.count_bookmarks(), 2);
    assert_eq!(tree.root().title(), Some("root"));
}

#[test]
fn given_root_without_children_when_importing_then_invalid_format() {
    let err = import_tree(r#"{"title": "root"}"#).unwrap_err();
    assert!(matches!(err, DomainError::InvalidFormat(_)));
}

#[test]
fn given_malformed_json_when_importing_then_parse_failure() {
    let err = import_tree("{ not json").unwrap_err();
    assert!(matches!(err, DomainError::ParseFailure(_)));
}

#[test]
fn given_edited_tree_when_persisting_and_restoring_then_ids_and_collapse_survive() {
    // Arrange
    let mut tree = import_tree(&sample_payload().to_string()).unwrap();
    let work = tree
        .iter()
        .find(|n| n.title() == Some("Work"))
        .and_then(Node::id)
        .cloned()
        .unwrap();
    let empty = tree
        .iter()
        .find(|n| n.title() == Some("Empty"))
        .and_then(Node::id)
        .cloned()
        .unwrap();
    tree.set_collapsed(&work, true);
    assert!(tree.move_node(&empty, &work, 0));

    // Act
    let blob = persisted_json(&tree).unwrap();
    let restored = restore_persisted(&blob).unwrap();

    // Assert
    assert!(!blob.contains("justMoved"));
    assert!(restored.iter().all(|n| !n.just_moved()));
    let work_node = restored.get(&work).unwrap();
    assert!(work_node.as_folder().unwrap().collapsed);
    assert_eq!(work_node.children()[0].id(), Some(&empty));
    let ids: Vec<_> = tree.iter().map(|n| n.id().cloned()).collect();
    let restored_ids: Vec<_> = restored.iter().map(|n| n.id().cloned()).collect();
    assert_eq!(ids, restored_ids);
}

#[test]
fn given_restored_tree_when_adding_folder_then_new_id_not_reused() {
    // Arrange
    let tree = import_tree(&sample_payload().to_string()).unwrap();
    let mut restored = restore_persisted(&persisted_json(&tree).unwrap()).unwrap();
    let root = restored.root_id().cloned().unwrap();

    // Act
    let created = restored.add_folder(&root, "New").unwrap();

    // Assert
    assert!(tree.get(&created).is_none());
}

#[test]
fn given_export_when_serialized_then_no_internal_fields() {
    let tree = import_tree(&sample_payload().to_string()).unwrap();
    let json = export_json(tree.root()).unwrap();
    assert!(!json.contains("_id"));
    assert!(!json.contains("_collapsed"));
    assert!(!json.contains("node-"));
}

#[test]
fn given_payload_with_internal_keys_when_saving_and_restoring_then_workspace_survives() {
    // Arrange
    let payload = json!({
        "_id": "node-1",
        "children": [
            {"_id": "node-7", "_collapsed": true, "title": "f", "children": [
                {"_id": "node-1", "_justMoved": true, "url": "https://a.test"}
            ]}
        ]
    });

    // Act
    let tree = import_tree(&payload.to_string()).unwrap();
    let exported = export_json(tree.root()).unwrap();
    let restored = restore_persisted(&persisted_json(&tree).unwrap());

    // Assert
    assert!(!exported.contains("_id"));
    assert!(!exported.contains("_collapsed"));
    assert!(!exported.contains("_justMoved"));
    let restored = restored.unwrap();
    assert_eq!(restored, tree);
    assert!(!restored.root().children()[0].as_folder().unwrap().collapsed);
}

#[test]
fn given_empty_url_and_missing_children_when_round_tripping_then_payload_unchanged() {
    // Arrange
    let payload = json!({
        "children": [
            {"title": "a", "url": ""},
            {"title": "sep"},
            {"title": "kept", "children": []}
        ]
    });

    // Act
    let tree = import_tree(&payload.to_string()).unwrap();
    let exported: Value = serde_json::from_str(&export_json(tree.root()).unwrap()).unwrap();
    let restored = restore_persisted(&persisted_json(&tree).unwrap()).unwrap();
    let re_exported: Value =
        serde_json::from_str(&export_json(restored.root()).unwrap()).unwrap();

    // Assert
    assert_eq!(exported, payload);
    assert_eq!(re_exported, payload);
    assert!(tree.root().children()[0].is_folder());
}

#[test]
fn given_folder_without_children_key_when_adding_into_it_then_children_written() {
    let mut tree = import_tree(r#"{"children": [{"title": "sep"}]}"#).unwrap();
    let sep = tree.root().children()[0].id().cloned().unwrap();

    tree.add_folder(&sep, "inner").unwrap();

    let exported: Value = serde_json::from_str(&export_json(tree.root()).unwrap()).unwrap();
    assert_eq!(
        exported,
        json!({"children": [{"title": "sep", "children": [{"title": "inner", "children": []}]}]})
    );
}
