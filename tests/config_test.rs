//! Integration tests for Settings layered loading.
//!
//! These tests only use explicit config files in temp directories and do not
//! touch `CBM_*` environment variables, so they are safe to run in parallel.

use std::fs;

use tempfile::TempDir;

use cbm::application::ApplicationError;
use cbm::config::{Settings, DEFAULT_STORAGE_KEY};

#[test]
fn given_explicit_data_dir_when_load_then_store_path_follows() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let data_dir = temp.path().join("data");
    let config_path = temp.path().join("cbm.toml");
    fs::write(
        &config_path,
        format!("data_dir = \"{}\"\ntruncate = 40\n", data_dir.display()),
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(&config_path)).expect("load settings");

    // Assert
    assert_eq!(settings.data_dir, data_dir);
    assert_eq!(settings.store_path, data_dir.join("store.json"));
    assert_eq!(settings.truncate, 40);
    assert_eq!(settings.storage_key, DEFAULT_STORAGE_KEY);
    assert_eq!(settings.state_path(), data_dir.join("cbm_data.json"));
}

#[test]
fn given_explicit_store_path_when_load_then_kept_separate_from_data_dir() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("elsewhere").join("store.json");
    let config_path = temp.path().join("cbm.toml");
    fs::write(
        &config_path,
        format!(
            "data_dir = \"{}\"\nstore_path = \"{}\"\n",
            temp.path().join("data").display(),
            store.display()
        ),
    )
    .unwrap();

    let settings = Settings::load(Some(&config_path)).expect("load settings");

    assert_eq!(settings.store_path, store);
}

#[test]
fn given_tilde_path_when_load_then_expanded() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("cbm.toml");
    fs::write(&config_path, "data_dir = \"~/cbm-data\"\n").unwrap();

    let settings = Settings::load(Some(&config_path)).expect("load settings");

    assert!(!settings.data_dir.to_string_lossy().starts_with('~'));
    assert!(settings.data_dir.ends_with("cbm-data"));
}

#[test]
fn given_truncate_below_minimum_when_load_then_config_error() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("cbm.toml");
    fs::write(&config_path, "truncate = 1\n").unwrap();

    let result = Settings::load(Some(&config_path));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_missing_explicit_file_when_load_then_config_error() {
    let temp = TempDir::new().unwrap();

    let result = Settings::load(Some(&temp.path().join("absent.toml")));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_malformed_toml_when_load_then_error_names_file() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("cbm.toml");
    fs::write(&config_path, "truncate = [not toml\n").unwrap();

    let err = Settings::load(Some(&config_path)).unwrap_err();

    assert!(err.to_string().contains("cbm.toml"));
}

#[test]
fn given_template_when_parsed_then_valid_toml() {
    let template = Settings::template();
    let parsed: Result<toml::Value, _> = toml::from_str(&template);
    assert!(parsed.is_ok());
}
