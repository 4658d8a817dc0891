//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/cbm/cbm.toml`
//! 3. Explicit config file: `--config FILE`
//! 4. Environment variables: `CBM_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Fixed storage key of the saved workspace.
pub const DEFAULT_STORAGE_KEY: &str = "cbm_data";
pub const DEFAULT_TRUNCATE: usize = 60;

/// Raw settings for intermediate parsing; `None` means "not specified".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub storage_key: Option<String>,
    pub export_prefix: Option<String>,
    pub store_export_prefix: Option<String>,
    pub store_path: Option<PathBuf>,
    pub truncate: Option<usize>,
}

/// Unified configuration for cbm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory of the saved workspace (default: XDG data dir)
    pub data_dir: PathBuf,
    /// Key of the saved workspace; the file is `<data_dir>/<key>.json`
    pub storage_key: String,
    /// File name prefix of workspace exports
    pub export_prefix: String,
    /// File name prefix of bookmark store exports
    pub store_export_prefix: String,
    /// JSON file backing the external bookmark store
    pub store_path: PathBuf,
    /// Display width for titles and URLs
    pub truncate: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            store_path: data_dir.join("store.json"),
            data_dir,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            export_prefix: "bookmarks".to_string(),
            store_export_prefix: "chrome-bookmarks".to_string(),
            truncate: DEFAULT_TRUNCATE,
        }
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "cbm")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.cbm"))
}

/// Get the XDG config directory for cbm.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cbm").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("cbm.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn expand_path(path: &Path) -> Result<PathBuf, ApplicationError> {
    let raw = path.to_string_lossy();
    shellexpand::full(&raw)
        .map(|expanded| PathBuf::from(expanded.into_owned()))
        .map_err(|e| ApplicationError::Config {
            message: format!("expand {}: {}", raw, e),
        })
}

impl Settings {
    /// Path of the saved workspace blob.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.storage_key))
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path fields.
    fn expand_paths(&mut self) -> Result<(), ApplicationError> {
        self.data_dir = expand_path(&self.data_dir)?;
        self.store_path = expand_path(&self.store_path)?;
        Ok(())
    }

    /// Overlay wins where it specifies a value.
    ///
    /// A `data_dir` override without a `store_path` moves the store along.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let data_dir = overlay
            .data_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.clone());
        let store_path = match (&overlay.store_path, &overlay.data_dir) {
            (Some(path), _) => path.clone(),
            (None, Some(dir)) if self.store_path == self.data_dir.join("store.json") => {
                dir.join("store.json")
            }
            _ => self.store_path.clone(),
        };
        Self {
            data_dir,
            store_path,
            storage_key: overlay
                .storage_key
                .clone()
                .unwrap_or_else(|| self.storage_key.clone()),
            export_prefix: overlay
                .export_prefix
                .clone()
                .unwrap_or_else(|| self.export_prefix.clone()),
            store_export_prefix: overlay
                .store_export_prefix
                .clone()
                .unwrap_or_else(|| self.store_export_prefix.clone()),
            truncate: overlay.truncate.unwrap_or(self.truncate),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - Optional config file given with `--config`; must exist
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(path) = explicit {
            current = current.merge_with(&load_raw_settings(path)?);
        }

        current = current.merge_with(&Self::env_overrides()?);
        current.validate()?;
        current.expand_paths()?;
        Ok(current)
    }

    /// `CBM_*` environment variables, e.g. `CBM_DATA_DIR`, `CBM_TRUNCATE`.
    fn env_overrides() -> Result<RawSettings, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("CBM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        let mut raw = RawSettings::default();
        if let Ok(val) = config.get_string("data_dir") {
            raw.data_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("storage_key") {
            raw.storage_key = Some(val);
        }
        if let Ok(val) = config.get_string("export_prefix") {
            raw.export_prefix = Some(val);
        }
        if let Ok(val) = config.get_string("store_export_prefix") {
            raw.store_export_prefix = Some(val);
        }
        if let Ok(val) = config.get_string("store_path") {
            raw.store_path = Some(PathBuf::from(val));
        }
        match config.get::<usize>("truncate") {
            Ok(val) => raw.truncate = Some(val),
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }
        Ok(raw)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.storage_key.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "storage_key must not be empty".to_string(),
            });
        }
        if self.truncate < 2 {
            return Err(ApplicationError::Config {
                message: format!("truncate must be at least 2, got {}", self.truncate),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# cbm configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/cbm/cbm.toml
#   Explicit: cbm --config FILE
#   Env:      CBM_* environment variables (e.g. CBM_DATA_DIR)

# Directory of the saved workspace (<data_dir>/<storage_key>.json)
# data_dir = "~/.local/share/cbm"

# Key of the saved workspace
# storage_key = "cbm_data"

# Export file names: <prefix>-YYYY-MM-DD.json
# export_prefix = "bookmarks"
# store_export_prefix = "chrome-bookmarks"

# JSON file backing the bookmark store used by `cbm store ...`
# store_path = "~/.local/share/cbm/store.json"

# Titles and URLs longer than this are cut with a trailing ellipsis
# truncate = 60
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
