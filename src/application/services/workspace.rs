//! Workspace service: the locally saved bookmark tree
//!
//! Loads the persisted blob into an [`AppState`], applies one edit, and saves
//! whenever the edit reports a change. Destructive edits ask the
//! [`Confirmer`] first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::application::state::{AppState, Outcome};
use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{self, NodeId};
use crate::infrastructure::traits::{Confirmer, FileSystem, StateStore};

pub const CONFIRM_DELETE_FOLDER: &str =
    "Delete this folder and all its contents? This cannot be undone.";
pub const CONFIRM_CLEAR_WORKSPACE: &str =
    "Clear the local workspace? This does not affect the bookmark store.";
pub const CONFIRM_REPLACE_WORKSPACE: &str =
    "Import will replace the current workspace. Continue?";

/// `<prefix>-YYYY-MM-DD.json`
pub fn dated_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.json", prefix, date.format("%Y-%m-%d"))
}

/// Workspace management service.
pub struct WorkspaceService {
    fs: Arc<dyn FileSystem>,
    state: Arc<dyn StateStore>,
    confirmer: Arc<dyn Confirmer>,
    settings: Arc<Settings>,
}

impl WorkspaceService {
    /// Create a new workspace service.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        state: Arc<dyn StateStore>,
        confirmer: Arc<dyn Confirmer>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            fs,
            state,
            confirmer,
            settings,
        }
    }

    fn key(&self) -> &str {
        &self.settings.storage_key
    }

    /// Restores the saved workspace.
    ///
    /// A missing key yields an empty state. A blob that does not parse is
    /// logged and treated as missing.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self) -> ApplicationResult<AppState> {
        let Some(blob) = self
            .state
            .get(self.key())
            .with_context(|| format!("read saved workspace '{}'", self.key()))?
        else {
            debug!("load: no saved workspace");
            return Ok(AppState::default());
        };
        match domain::restore_persisted(&blob) {
            Ok(tree) => {
                debug!("load: {} bookmarks", tree.count_bookmarks());
                Ok(AppState::new(Some(tree)))
            }
            Err(e) => {
                warn!("ignoring corrupt saved workspace: {}", e);
                Ok(AppState::default())
            }
        }
    }

    /// Writes the tree under the storage key; no tree removes the key.
    pub fn save(&self, state: &AppState) -> ApplicationResult<()> {
        match &state.tree {
            Some(tree) => {
                let blob = domain::persisted_json(tree)?;
                self.state
                    .set(self.key(), &blob)
                    .with_context(|| format!("save workspace '{}'", self.key()))
            }
            None => self
                .state
                .remove(self.key())
                .with_context(|| format!("remove workspace '{}'", self.key())),
        }
    }

    fn save_if(&self, state: &AppState, outcome: Outcome) -> ApplicationResult<Outcome> {
        if outcome.is_applied() {
            self.save(state)?;
        }
        Ok(outcome)
    }

    /// Replaces the workspace with the contents of `path`.
    ///
    /// The file is parsed before anything else, so an invalid file never
    /// prompts and never touches the saved workspace.
    #[instrument(level = "debug", skip(self, state))]
    pub fn import_file(&self, state: &mut AppState, path: &Path) -> ApplicationResult<Outcome> {
        let text = self
            .fs
            .read_to_string(path)
            .with_path_context("read import file", path)?;
        let tree = domain::import_tree(&text)?;
        if state.is_loaded() && !self.confirm(CONFIRM_REPLACE_WORKSPACE)? {
            return Ok(Outcome::Declined);
        }
        info!(
            "imported {} bookmarks from {}",
            tree.count_bookmarks(),
            path.display()
        );
        state.tree = Some(tree);
        self.save_if(state, Outcome::Applied)
    }

    /// Writes the portable export; defaults to a dated file in the current directory.
    #[instrument(level = "debug", skip(self, state))]
    pub fn export(
        &self,
        state: &AppState,
        output: Option<&Path>,
        today: NaiveDate,
    ) -> ApplicationResult<PathBuf> {
        let tree = state.tree()?;
        let json = domain::export_json(tree.root())?;
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(dated_file_name(&self.settings.export_prefix, today)));
        self.fs
            .ensure_parent(&path)
            .with_path_context("create export directory", &path)?;
        self.fs
            .write(&path, &json)
            .with_path_context("write export", &path)?;
        Ok(path)
    }

    /// Forgets the workspace after confirmation.
    pub fn clear(&self, state: &mut AppState) -> ApplicationResult<Outcome> {
        if !state.is_loaded() {
            return Ok(Outcome::Unchanged);
        }
        if !self.confirm(CONFIRM_CLEAR_WORKSPACE)? {
            return Ok(Outcome::Declined);
        }
        state.tree = None;
        self.save_if(state, Outcome::Applied)
    }

    /// Deletes a node; a folder with children needs confirmation.
    #[instrument(level = "debug", skip(self, state))]
    pub fn delete(&self, state: &mut AppState, id: &NodeId) -> ApplicationResult<Outcome> {
        let tree = state.tree()?;
        let Some(node) = tree.get(id) else {
            debug!("delete: no node {}", id);
            return Ok(Outcome::Unchanged);
        };
        if tree.root_id() == Some(id) {
            debug!("delete: refusing to delete the root");
            return Ok(Outcome::Unchanged);
        }
        if node.is_folder()
            && !node.children().is_empty()
            && !self.confirm(CONFIRM_DELETE_FOLDER)?
        {
            return Ok(Outcome::Declined);
        }
        let removed = state.tree_mut()?.remove(id).is_some();
        self.save_if(state, Outcome::from_changed(removed))
    }

    pub fn rename(&self, state: &mut AppState, id: &NodeId, title: &str) -> ApplicationResult<Outcome> {
        let tree = state.tree_mut()?;
        let changed = tree.rename(id, title);
        self.save_if(state, Outcome::from_changed(changed))
    }

    /// Appends a folder; returns its id when one was created.
    pub fn add_folder(
        &self,
        state: &mut AppState,
        parent_id: &NodeId,
        name: &str,
    ) -> ApplicationResult<Option<NodeId>> {
        let tree = state.tree_mut()?;
        let created = tree.add_folder(parent_id, name);
        if created.is_some() {
            self.save(state)?;
        }
        Ok(created)
    }

    /// Moves a node; `index: None` appends to the target's children and
    /// expands the target.
    ///
    /// The moved node keeps its `just_moved` mark in `state` for rendering.
    #[instrument(level = "debug", skip(self, state))]
    pub fn move_node(
        &self,
        state: &mut AppState,
        id: &NodeId,
        target_parent_id: &NodeId,
        index: Option<usize>,
    ) -> ApplicationResult<Outcome> {
        let tree = state.tree_mut()?;
        let appended = index.is_none();
        let index = index.unwrap_or_else(|| {
            tree.get(target_parent_id)
                .map_or(0, |parent| parent.children().len())
        });
        let moved = tree.move_node(id, target_parent_id, index);
        if moved && appended {
            tree.set_collapsed(target_parent_id, false);
        }
        self.save_if(state, Outcome::from_changed(moved))
    }

    pub fn set_collapsed(
        &self,
        state: &mut AppState,
        id: &NodeId,
        collapsed: bool,
    ) -> ApplicationResult<Outcome> {
        let changed = state.tree_mut()?.set_collapsed(id, collapsed);
        self.save_if(state, Outcome::from_changed(changed))
    }

    /// Flips a folder; returns the new collapsed flag.
    pub fn toggle(&self, state: &mut AppState, id: &NodeId) -> ApplicationResult<Option<bool>> {
        let collapsed = state.tree_mut()?.toggle_collapsed(id);
        if collapsed.is_some() {
            self.save(state)?;
        }
        Ok(collapsed)
    }

    /// Collapses or expands every folder below `id`.
    pub fn set_collapse_recursive(
        &self,
        state: &mut AppState,
        id: &NodeId,
        collapsed: bool,
    ) -> ApplicationResult<Outcome> {
        let changed = state.tree_mut()?.set_collapse_recursive(id, collapsed);
        self.save_if(state, Outcome::from_changed(changed))
    }

    fn confirm(&self, message: &str) -> ApplicationResult<bool> {
        let confirmed = self
            .confirmer
            .confirm(message)
            .with_context(|| "read confirmation".to_string())?;
        if !confirmed {
            debug!("declined: {}", message);
        }
        Ok(confirmed)
    }
}
