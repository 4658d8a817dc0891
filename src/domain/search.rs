//! Query matching and per-node visibility

use std::collections::HashMap;

use tracing::instrument;

use super::duplicates::DuplicateSet;
use super::node::{Node, NodeId};
use super::tree::PostOrder;

/// Queries starting with this character match literally.
pub const LITERAL_PREFIX: char = '\'';

/// Greedy left-to-right subsequence match, case-insensitive.
///
/// Every pattern character must appear in `text` after the previous one.
/// An empty pattern matches everything.
pub fn fuzzy_match(text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let mut remaining = text.chars();
    pattern
        .to_lowercase()
        .chars()
        .all(|p| remaining.any(|t| t == p))
}

/// Matches `query` against `"title url"` of the node.
pub fn matches_query(node: &Node, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let target = format!("{} {}", node.title().unwrap_or(""), node.url().unwrap_or("")).to_lowercase();
    match query.strip_prefix(LITERAL_PREFIX) {
        Some(needle) => target.contains(&needle.to_lowercase()),
        None => fuzzy_match(&target, query),
    }
}

/// Search input plus the duplicates-only toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub query: String,
    pub duplicates_only: bool,
}

impl Filter {
    pub fn new(query: impl Into<String>, duplicates_only: bool) -> Self {
        Self {
            query: query.into(),
            duplicates_only,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty() || self.duplicates_only
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    pub visible: bool,
    /// Some descendant is visible (folders only).
    pub has_visible_child: bool,
}

impl Visibility {
    /// A row is drawn when it matches itself or leads to a match.
    pub fn is_rendered(&self) -> bool {
        self.visible || self.has_visible_child
    }
}

/// Visibility of every node for one render pass, keyed by node id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityMap {
    entries: HashMap<NodeId, Visibility>,
}

impl VisibilityMap {
    /// Bottom-up fold over the tree.
    ///
    /// Bookmarks are visible when they match the query and, with
    /// `duplicates_only`, when their URL is a duplicate. Folders match on their
    /// own title but never satisfy the duplicate filter themselves.
    #[instrument(level = "debug", skip(root, duplicates))]
    pub fn compute(root: &Node, filter: &Filter, duplicates: &DuplicateSet) -> Self {
        let mut entries: HashMap<NodeId, Visibility> = HashMap::new();
        for node in PostOrder::new(root) {
            let Some(id) = node.id() else {
                continue;
            };
            let matches = matches_query(node, &filter.query);
            let visibility = match node {
                Node::Bookmark(bookmark) => Visibility {
                    visible: matches
                        && (!filter.duplicates_only || duplicates.contains_url(&bookmark.url)),
                    has_visible_child: false,
                },
                Node::Folder(folder) => Visibility {
                    visible: matches && !filter.duplicates_only,
                    has_visible_child: folder.children.iter().any(|child| {
                        child
                            .id()
                            .and_then(|id| entries.get(id))
                            .is_some_and(Visibility::is_rendered)
                    }),
                },
            };
            entries.insert(id.clone(), visibility);
        }
        Self { entries }
    }

    pub fn get(&self, id: &NodeId) -> Visibility {
        self.entries.get(id).copied().unwrap_or_default()
    }

    pub fn is_rendered(&self, node: &Node) -> bool {
        node.id().is_some_and(|id| self.get(id).is_rendered())
    }

    /// Number of visible bookmarks and folders.
    pub fn visible_count(&self) -> usize {
        self.entries.values().filter(|v| v.visible).count()
    }
}
