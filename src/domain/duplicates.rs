//! Duplicate detection by normalized URL

use std::collections::BTreeSet;

use itertools::Itertools;

use super::node::{Bookmark, Node};
use super::tree::collect_bookmarks;

/// Lower-cases, drops the `#fragment`, and drops one trailing slash.
pub fn normalize_url(url: &str) -> String {
    let lowered = url.to_lowercase();
    let without_fragment = match lowered.find('#') {
        Some(pos) => &lowered[..pos],
        None => lowered.as_str(),
    };
    without_fragment
        .strip_suffix('/')
        .unwrap_or(without_fragment)
        .to_string()
}

/// Bookmarks sharing one normalized URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup<'a> {
    pub key: String,
    pub bookmarks: Vec<&'a Bookmark>,
}

/// Normalized URLs that occur more than once in a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateSet {
    keys: BTreeSet<String>,
}

impl DuplicateSet {
    pub fn build(root: &Node) -> Self {
        let keys = collect_bookmarks(root)
            .into_iter()
            .map(|b| normalize_url(&b.url))
            .filter(|key| !key.is_empty())
            .counts()
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(key, _)| key)
            .collect();
        Self { keys }
    }

    /// Number of distinct duplicated URLs.
    pub fn total(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether `url` normalizes to a duplicated key.
    pub fn contains_url(&self, url: &str) -> bool {
        self.keys.contains(&normalize_url(url))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Duplicated bookmarks grouped by key; groups sorted by key, members in tree order.
    pub fn groups<'a>(&self, root: &'a Node) -> Vec<DuplicateGroup<'a>> {
        collect_bookmarks(root)
            .into_iter()
            .map(|b| (normalize_url(&b.url), b))
            .filter(|(key, _)| self.keys.contains(key))
            .into_group_map()
            .into_iter()
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(key, bookmarks)| DuplicateGroup { key, bookmarks })
            .collect()
    }
}
