//! Explicit application state
//!
//! The loaded tree and the active filter travel together through every
//! operation; nothing is kept in globals.

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{BookmarkTree, DuplicateSet, Filter, NodeId, VisibilityMap};

/// Result of a user-facing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The tree changed and was saved.
    Applied,
    /// The user declined the confirmation prompt; nothing changed.
    Declined,
    /// The operation was a no-op (e.g. invalid move target, blank title).
    Unchanged,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }

    pub(crate) fn from_changed(changed: bool) -> Self {
        if changed {
            Outcome::Applied
        } else {
            Outcome::Unchanged
        }
    }
}

/// The workspace as seen by one invocation.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// `None` means no workspace is loaded.
    pub tree: Option<BookmarkTree>,
    pub filter: Filter,
}

impl AppState {
    pub fn new(tree: Option<BookmarkTree>) -> Self {
        Self {
            tree,
            filter: Filter::default(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.tree.is_some()
    }

    pub fn tree(&self) -> ApplicationResult<&BookmarkTree> {
        self.tree.as_ref().ok_or(ApplicationError::NoWorkspace)
    }

    pub fn tree_mut(&mut self) -> ApplicationResult<&mut BookmarkTree> {
        self.tree.as_mut().ok_or(ApplicationError::NoWorkspace)
    }

    /// Query is trimmed before use.
    pub fn set_filter(&mut self, query: &str, duplicates_only: bool) {
        self.filter = Filter::new(query.trim(), duplicates_only);
    }

    /// Everything a renderer needs for one pass.
    pub fn board(&self) -> ApplicationResult<BoardView<'_>> {
        Ok(BoardView::new(self.tree()?, &self.filter))
    }

    /// Folder path of a node, or `NodeNotFound`.
    pub fn breadcrumb(&self, id: &NodeId) -> ApplicationResult<Vec<String>> {
        self.tree()?
            .breadcrumb(id)
            .ok_or_else(|| ApplicationError::NodeNotFound(id.to_string()))
    }
}

/// Derived data for rendering: duplicate keys and the visibility side map.
#[derive(Debug)]
pub struct BoardView<'a> {
    pub tree: &'a BookmarkTree,
    pub filter: Filter,
    pub duplicates: DuplicateSet,
    pub visibility: VisibilityMap,
    pub total_bookmarks: usize,
}

impl<'a> BoardView<'a> {
    pub fn new(tree: &'a BookmarkTree, filter: &Filter) -> Self {
        let duplicates = DuplicateSet::build(tree.root());
        let visibility = VisibilityMap::compute(tree.root(), filter, &duplicates);
        Self {
            tree,
            filter: filter.clone(),
            duplicates,
            visibility,
            total_bookmarks: tree.count_bookmarks(),
        }
    }

    /// Label of the duplicates toggle, as on the board header.
    pub fn duplicates_label(&self) -> String {
        if self.filter.duplicates_only {
            "Showing Duplicates".to_string()
        } else {
            format!("Duplicates ({})", self.duplicates.total())
        }
    }
}
