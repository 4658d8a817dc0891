//! Destructive sync against an external bookmark store
//!
//! Import empties every top-level root of the store and recreates the
//! children of source root `i` under store root `i`. Nothing is rolled back
//! when the store fails halfway.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::application::services::workspace::dated_file_name;
use crate::application::state::Outcome;
use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{self, DomainError, ExportNode, Node};
use crate::infrastructure::traits::{BookmarkStore, Confirmer, CreateDetails, FileSystem, StoreNode};

pub const CONFIRM_STORE_IMPORT: &str = "Import will replace existing bookmarks. Continue?";
pub const CONFIRM_STORE_CLEAR: &str = "Clear all bookmarks? This cannot be undone.";

const NEW_FOLDER: &str = "New Folder";

/// Counts of a finished sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Top-level children removed before recreating.
    pub removed: usize,
    pub folders: usize,
    pub bookmarks: usize,
}

/// Sync service over a [`BookmarkStore`].
pub struct StoreSyncService {
    store: Arc<dyn BookmarkStore>,
    fs: Arc<dyn FileSystem>,
    confirmer: Arc<dyn Confirmer>,
    settings: Arc<Settings>,
}

impl StoreSyncService {
    pub fn new(
        store: Arc<dyn BookmarkStore>,
        fs: Arc<dyn FileSystem>,
        confirmer: Arc<dyn Confirmer>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            store,
            fs,
            confirmer,
            settings,
        }
    }

    /// Replaces the store contents with the file at `path`.
    ///
    /// Returns `None` when the user declines.
    #[instrument(level = "debug", skip(self))]
    pub fn import_file(&self, path: &Path) -> ApplicationResult<Option<SyncReport>> {
        let text = self
            .fs
            .read_to_string(path)
            .with_path_context("read import file", path)?;
        let source = domain::parse_import(&text)?;
        if !self.confirm(CONFIRM_STORE_IMPORT)? {
            return Ok(None);
        }
        let mut report = SyncReport {
            removed: self.clear_roots()?,
            ..SyncReport::default()
        };

        let targets = self.top_level_roots()?;
        for (target, source_root) in targets.iter().zip(source.children.iter()) {
            for child in source_root.children() {
                self.create_node(&target.id, child, &mut report)?;
            }
        }
        info!(
            "store import: {} folders, {} bookmarks",
            report.folders, report.bookmarks
        );
        Ok(Some(report))
    }

    /// Writes the store tree without store ids to a dated file.
    #[instrument(level = "debug", skip(self))]
    pub fn export(&self, output: Option<&Path>, today: NaiveDate) -> ApplicationResult<PathBuf> {
        let tree = self
            .store
            .get_tree()
            .with_context(|| "read bookmark store".to_string())?;
        let exported: Vec<ExportNode> = tree.iter().map(strip_ids).collect();
        let json = serde_json::to_string_pretty(&exported)
            .map_err(|e| DomainError::Encode(e.to_string()))?;
        let path = output.map(Path::to_path_buf).unwrap_or_else(|| {
            PathBuf::from(dated_file_name(&self.settings.store_export_prefix, today))
        });
        self.fs
            .ensure_parent(&path)
            .with_path_context("create export directory", &path)?;
        self.fs
            .write(&path, &json)
            .with_path_context("write store export", &path)?;
        Ok(path)
    }

    /// Removes every child of every top-level root after confirmation.
    pub fn clear(&self) -> ApplicationResult<Outcome> {
        if !self.confirm(CONFIRM_STORE_CLEAR)? {
            return Ok(Outcome::Declined);
        }
        let removed = self.clear_roots()?;
        debug!("store clear: removed {} nodes", removed);
        Ok(Outcome::Applied)
    }

    fn top_level_roots(&self) -> ApplicationResult<Vec<StoreNode>> {
        let tree = self
            .store
            .get_tree()
            .sync_context(|| "read bookmark store".to_string())?;
        Ok(tree
            .into_iter()
            .next()
            .and_then(|root| root.children)
            .unwrap_or_default())
    }

    fn clear_roots(&self) -> ApplicationResult<usize> {
        let mut removed = 0;
        for root in self.top_level_roots()? {
            for child in root.children.unwrap_or_default() {
                self.store
                    .remove_tree(&child.id)
                    .sync_context(|| format!("remove store node {}", child.id))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn create_node(&self, parent_id: &str, node: &Node, report: &mut SyncReport) -> ApplicationResult<()> {
        let details = match node {
            Node::Bookmark(bookmark) => CreateDetails {
                parent_id: parent_id.to_string(),
                title: fallback_title(node).unwrap_or(&bookmark.url).to_string(),
                url: Some(bookmark.url.clone()),
            },
            Node::Folder(_) => CreateDetails {
                parent_id: parent_id.to_string(),
                title: fallback_title(node).unwrap_or(NEW_FOLDER).to_string(),
                url: None,
            },
        };
        let created = self
            .store
            .create(details)
            .sync_context(|| format!("create store node under {parent_id}"))?;
        match node {
            Node::Bookmark(_) => report.bookmarks += 1,
            Node::Folder(folder) => {
                report.folders += 1;
                for child in &folder.children {
                    self.create_node(&created.id, child, report)?;
                }
            }
        }
        Ok(())
    }

    fn confirm(&self, message: &str) -> ApplicationResult<bool> {
        self.confirmer
            .confirm(message)
            .with_context(|| "read confirmation".to_string())
    }
}

/// Non-empty `title`, else a non-empty string `name` attribute.
fn fallback_title(node: &Node) -> Option<&str> {
    node.title().filter(|t| !t.is_empty()).or_else(|| {
        node.extra()
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    })
}

fn strip_ids(node: &StoreNode) -> ExportNode {
    ExportNode {
        title: Some(node.title.clone()),
        url: node.url.clone(),
        children: node
            .children
            .as_ref()
            .map(|children| children.iter().map(strip_ids).collect()),
        extra: Default::default(),
    }
}
