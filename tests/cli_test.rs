//! End-to-end command dispatch through the service container.

use std::fs;
use std::sync::Arc;

use clap::Parser;
use tempfile::TempDir;

use cbm::cli::{execute_command, Cli, CliError};
use cbm::config::Settings;
use cbm::exitcode;
use cbm::infrastructure::di::ServiceContainer;
use cbm::infrastructure::store::ArenaBookmarkStore;
use cbm::infrastructure::traits::{BookmarkStore, RealFileSystem};
use cbm::util::testing::{init_test_setup, FixedSelector, MemoryStateStore, ScriptedConfirmer};

const BOOKMARKS: &str = r#"{"title": "root", "children": [
  {"title": "Work", "children": [
    {"title": "Jira", "url": "https://jira.example"},
    {"title": "Jira again", "url": "https://jira.example/"}
  ]}
]}"#;

struct Harness {
    temp: TempDir,
    state: Arc<MemoryStateStore>,
    store: Arc<ArenaBookmarkStore>,
    container: ServiceContainer,
}

fn harness(answer: bool) -> Harness {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("bookmarks.json"), BOOKMARKS).unwrap();
    let settings = Settings {
        data_dir: temp.path().join("data"),
        store_path: temp.path().join("data").join("store.json"),
        ..Settings::default()
    };
    let state = Arc::new(MemoryStateStore::default());
    let store = Arc::new(ArenaBookmarkStore::new());
    let container = ServiceContainer::with_deps(
        settings,
        Arc::new(RealFileSystem),
        state.clone(),
        Arc::new(ScriptedConfirmer::answering(answer)),
        Arc::new(FixedSelector { pick: Some(0) }),
    )
    .with_store(store.clone());
    Harness {
        temp,
        state,
        store,
        container,
    }
}

fn run(h: &Harness, args: &[&str]) -> Result<(), CliError> {
    let mut argv = vec!["cbm"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    execute_command(&cli, &h.container)
}

#[test]
fn given_bookmarks_file_when_import_command_then_workspace_saved() {
    // Arrange
    let h = harness(true);
    let file = h.temp.path().join("bookmarks.json");

    // Act
    run(&h, &["import", file.to_str().unwrap()]).unwrap();

    // Assert
    let blob = h.state.raw("cbm_data").expect("workspace saved");
    assert!(blob.contains("https://jira.example"));
    run(&h, &["show", "jira"]).unwrap();
    run(&h, &["duplicates"]).unwrap();
}

#[test]
fn given_no_workspace_when_renaming_then_noinput_exit_code() {
    let h = harness(true);

    let err = run(&h, &["rename", "node-1", "x"]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_missing_import_file_when_importing_then_ioerr_exit_code() {
    let h = harness(true);
    let missing = h.temp.path().join("missing.json");

    let err = run(&h, &["import", missing.to_str().unwrap()]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::IOERR);
}

#[test]
fn given_malformed_import_when_importing_then_dataerr_exit_code() {
    let h = harness(true);
    let bad = h.temp.path().join("bad.json");
    fs::write(&bad, "[1, 2").unwrap();

    let err = run(&h, &["import", bad.to_str().unwrap()]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_no_command_when_executing_then_usage_error() {
    let h = harness(true);

    let err = run(&h, &[]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_workspace_when_picking_then_selector_consulted() {
    let h = harness(true);
    let file = h.temp.path().join("bookmarks.json");
    run(&h, &["import", file.to_str().unwrap()]).unwrap();

    run(&h, &["pick", "jira"]).unwrap();
}

#[test]
fn given_bookmarks_file_when_store_import_then_injected_store_filled() {
    // Arrange
    let h = harness(true);
    let file = h.temp.path().join("bookmarks.json");

    // Act
    run(&h, &["store", "import", file.to_str().unwrap()]).unwrap();

    // Assert
    let tree = h.store.get_tree().unwrap();
    let bar = &tree[0].children.as_ref().unwrap()[0];
    let titles: Vec<&str> = bar
        .children
        .as_ref()
        .unwrap()
        .iter()
        .map(|n| n.title.as_str())
        .collect();
    assert_eq!(titles, ["Jira", "Jira again"]);
}

#[test]
fn given_loaded_workspace_when_clear_declined_then_workspace_kept() {
    // Arrange
    let h = harness(false);
    let file = h.temp.path().join("bookmarks.json");
    run(&h, &["import", file.to_str().unwrap()]).unwrap();

    // Act
    run(&h, &["clear"]).unwrap();

    // Assert
    assert!(h.state.raw("cbm_data").is_some());
}
