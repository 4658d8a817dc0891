//! Tests for WorkspaceService

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use cbm::application::services::{
    WorkspaceService, CONFIRM_CLEAR_WORKSPACE, CONFIRM_DELETE_FOLDER, CONFIRM_REPLACE_WORKSPACE,
};
use cbm::application::{ApplicationError, Outcome};
use cbm::config::Settings;
use cbm::domain::{BookmarkTree, DomainError, Node, NodeId};
use cbm::infrastructure::traits::RealFileSystem;
use cbm::util::testing::{init_test_setup, MemoryStateStore, ScriptedConfirmer};

const BOOKMARKS: &str = r#"{
  "title": "root",
  "children": [
    {"title": "Work", "children": [
      {"title": "Tools", "children": [
        {"title": "Grafana", "url": "https://grafana.example"}
      ]},
      {"title": "Jira", "url": "https://jira.example"}
    ]},
    {"title": "Reading", "children": [
      {"title": "Blog", "url": "https://blog.example"}
    ]}
  ]
}"#;

struct Fixture {
    _temp: TempDir,
    dir: PathBuf,
    state: Arc<MemoryStateStore>,
    confirmer: Arc<ScriptedConfirmer>,
    service: WorkspaceService,
}

fn fixture_with(state: MemoryStateStore, answer: bool) -> Fixture {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let dir = temp.path().to_path_buf();
    let settings = Settings {
        data_dir: dir.join("data"),
        ..Settings::default()
    };
    let state = Arc::new(state);
    let confirmer = Arc::new(ScriptedConfirmer::answering(answer));
    let service = WorkspaceService::new(
        Arc::new(RealFileSystem),
        state.clone(),
        confirmer.clone(),
        Arc::new(settings),
    );
    Fixture {
        _temp: temp,
        dir,
        state,
        confirmer,
        service,
    }
}

fn fixture(answer: bool) -> Fixture {
    fixture_with(MemoryStateStore::default(), answer)
}

fn write_import(f: &Fixture, content: &str) -> PathBuf {
    let path = f.dir.join("import.json");
    fs::write(&path, content).unwrap();
    path
}

fn id_of(tree: &BookmarkTree, title: &str) -> NodeId {
    tree.iter()
        .find(|n| n.title() == Some(title))
        .and_then(Node::id)
        .cloned()
        .unwrap()
}

#[test]
fn given_empty_workspace_when_importing_then_saved_without_prompt() {
    // Arrange
    let f = fixture(false);
    let path = write_import(&f, BOOKMARKS);
    let mut state = f.service.load().unwrap();

    // Act
    let outcome = f.service.import_file(&mut state, &path).unwrap();

    // Assert
    assert_eq!(outcome, Outcome::Applied);
    assert!(f.confirmer.prompts().is_empty());
    assert!(f.state.raw("cbm_data").is_some());
    let reloaded = f.service.load().unwrap();
    assert_eq!(reloaded.tree().unwrap().count_bookmarks(), 3);
}

#[test]
fn given_loaded_workspace_when_import_declined_then_workspace_unchanged() {
    // Arrange
    let f = fixture(false);
    let path = write_import(&f, BOOKMARKS);
    let mut state = f.service.load().unwrap();
    f.service.import_file(&mut state, &path).unwrap();
    let saved = f.state.raw("cbm_data");
    let other = f.dir.join("other.json");
    fs::write(&other, r#"{"title": "other", "children": []}"#).unwrap();

    // Act
    let outcome = f.service.import_file(&mut state, &other).unwrap();

    // Assert
    assert_eq!(outcome, Outcome::Declined);
    assert_eq!(f.confirmer.prompts(), vec![CONFIRM_REPLACE_WORKSPACE.to_string()]);
    assert_eq!(f.state.raw("cbm_data"), saved);
    assert_eq!(state.tree().unwrap().count_bookmarks(), 3);
}

#[test]
fn given_invalid_file_when_importing_then_error_and_nothing_saved() {
    // Arrange
    let f = fixture(true);
    let path = write_import(&f, r#"[{"title": "no children"}]"#);
    let mut state = f.service.load().unwrap();

    // Act
    let result = f.service.import_file(&mut state, &path);

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidFormat(_)))
    ));
    assert!(!state.is_loaded());
    assert!(f.state.raw("cbm_data").is_none());
    assert!(f.confirmer.prompts().is_empty());
}

#[test]
fn given_corrupt_saved_blob_when_loading_then_empty_workspace() {
    let f = fixture_with(MemoryStateStore::with_entry("cbm_data", "{ broken"), true);
    let state = f.service.load().unwrap();
    assert!(!state.is_loaded());
}

#[test]
fn given_non_empty_folder_when_delete_declined_then_tree_unchanged() {
    // Arrange
    let f = fixture(false);
    let path = write_import(&f, BOOKMARKS);
    let mut state = f.service.load().unwrap();
    f.service.import_file(&mut state, &path).unwrap();
    let work = id_of(state.tree().unwrap(), "Work");

    // Act
    let outcome = f.service.delete(&mut state, &work).unwrap();

    // Assert
    assert_eq!(outcome, Outcome::Declined);
    assert_eq!(f.confirmer.prompts(), vec![CONFIRM_DELETE_FOLDER.to_string()]);
    assert!(state.tree().unwrap().contains(&work));
}

#[test]
fn given_bookmark_when_deleting_then_removed_without_prompt() {
    // Arrange
    let f = fixture(false);
    let path = write_import(&f, BOOKMARKS);
    let mut state = f.service.load().unwrap();
    f.service.import_file(&mut state, &path).unwrap();
    let jira = id_of(state.tree().unwrap(), "Jira");

    // Act
    let outcome = f.service.delete(&mut state, &jira).unwrap();

    // Assert
    assert_eq!(outcome, Outcome::Applied);
    assert!(f.confirmer.prompts().is_empty());
    assert!(!f.service.load().unwrap().tree().unwrap().contains(&jira));
}

#[test]
fn given_unknown_id_when_deleting_then_unchanged() {
    let f = fixture(true);
    let path = write_import(&f, BOOKMARKS);
    let mut state = f.service.load().unwrap();
    f.service.import_file(&mut state, &path).unwrap();
    let before = f.state.raw("cbm_data");

    let result = f.service.delete(&mut state, &NodeId::from("node-999"));

    assert_eq!(result.unwrap(), Outcome::Unchanged);
    assert!(f.confirmer.prompts().is_empty());
    assert_eq!(f.state.raw("cbm_data"), before);
}

#[test]
fn given_unknown_id_when_editing_then_each_edit_is_a_no_op() {
    // Arrange
    let f = fixture(true);
    let path = write_import(&f, BOOKMARKS);
    let mut state = f.service.load().unwrap();
    f.service.import_file(&mut state, &path).unwrap();
    let missing = NodeId::from("node-999");
    let root = state.tree().unwrap().root_id().cloned().unwrap();
    let before = state.tree().unwrap().clone();

    // Act
    let renamed = f.service.rename(&mut state, &missing, "x").unwrap();
    let moved = f.service.move_node(&mut state, &missing, &root, Some(0)).unwrap();
    let moved_into = f
        .service
        .move_node(&mut state, &root, &missing, None)
        .unwrap();
    let collapsed = f.service.set_collapsed(&mut state, &missing, true).unwrap();
    let recursive = f
        .service
        .set_collapse_recursive(&mut state, &missing, true)
        .unwrap();
    let toggled = f.service.toggle(&mut state, &missing).unwrap();
    let created = f.service.add_folder(&mut state, &missing, "x").unwrap();

    // Assert
    assert_eq!(
        [renamed, moved, moved_into, collapsed, recursive],
        [Outcome::Unchanged; 5]
    );
    assert_eq!(toggled, None);
    assert_eq!(created, None);
    assert_eq!(state.tree().unwrap(), &before);
}

#[test]
fn given_no_workspace_when_renaming_then_no_workspace_error() {
    let f = fixture(true);
    let mut state = f.service.load().unwrap();

    let result = f.service.rename(&mut state, &NodeId::from("node-1"), "x");

    assert!(matches!(result, Err(ApplicationError::NoWorkspace)));
}

#[test]
fn given_loaded_workspace_when_clear_confirmed_then_key_removed() {
    // Arrange
    let f = fixture(true);
    let path = write_import(&f, BOOKMARKS);
    let mut state = f.service.load().unwrap();
    f.service.import_file(&mut state, &path).unwrap();

    // Act
    let outcome = f.service.clear(&mut state).unwrap();

    // Assert
    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(f.confirmer.prompts(), vec![CONFIRM_CLEAR_WORKSPACE.to_string()]);
    assert!(f.state.raw("cbm_data").is_none());
    assert!(!f.service.load().unwrap().is_loaded());
}

#[test]
fn given_move_without_index_when_moving_then_appended_and_target_expanded() {
    // Arrange
    let f = fixture(true);
    let path = write_import(&f, BOOKMARKS);
    let mut state = f.service.load().unwrap();
    f.service.import_file(&mut state, &path).unwrap();
    let tree = state.tree().unwrap();
    let blog = id_of(tree, "Blog");
    let tools = id_of(tree, "Tools");
    f.service.set_collapsed(&mut state, &tools, true).unwrap();

    // Act
    let outcome = f.service.move_node(&mut state, &blog, &tools, None).unwrap();

    // Assert
    assert_eq!(outcome, Outcome::Applied);
    let reloaded = f.service.load().unwrap();
    let tools_node = reloaded.tree().unwrap().get(&tools).unwrap();
    assert!(!tools_node.as_folder().unwrap().collapsed);
    let titles: Vec<_> = tools_node.children().iter().map(|n| n.display_title()).collect();
    assert_eq!(titles, ["Grafana", "Blog"]);
    assert_eq!(
        reloaded.breadcrumb(&blog).unwrap(),
        vec!["Work".to_string(), "Tools".to_string()]
    );
}

#[test]
fn given_blank_title_when_renaming_then_unchanged() {
    let f = fixture(true);
    let path = write_import(&f, BOOKMARKS);
    let mut state = f.service.load().unwrap();
    f.service.import_file(&mut state, &path).unwrap();
    let jira = id_of(state.tree().unwrap(), "Jira");

    let outcome = f.service.rename(&mut state, &jira, "   ").unwrap();

    assert_eq!(outcome, Outcome::Unchanged);
}

#[test]
fn given_output_path_when_exporting_then_parent_created_and_portable_json_written() {
    // Arrange
    let f = fixture(true);
    let path = write_import(&f, BOOKMARKS);
    let mut state = f.service.load().unwrap();
    f.service.import_file(&mut state, &path).unwrap();
    let target = f.dir.join("out").join("export.json");
    let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

    // Act
    let written = f.service.export(&state, Some(&target), date).unwrap();

    // Assert
    assert_eq!(written, target);
    let text = fs::read_to_string(&target).unwrap();
    assert!(text.contains("https://grafana.example"));
    assert!(!text.contains("_id"));
}
