//! Bookmark tree nodes
//!
//! A node is either a [`Bookmark`] leaf or a [`Folder`] with ordered children.
//! The variant is explicit; nothing is inferred from which fields happen to be set.

use std::fmt;

use serde_json::{Map, Value};

/// Unknown JSON attributes carried through import/export untouched
/// (e.g. a browser's `dateAdded` or its own `id`).
pub type Attributes = Map<String, Value>;

/// Title shown for folders without a name.
pub const UNTITLED: &str = "Untitled";

const ID_PREFIX: &str = "node-";

/// Stable, opaque node identity, unique within one tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity for the `n`-th generated node: `node-n`.
    pub fn generated(n: u64) -> Self {
        Self(format!("{ID_PREFIX}{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Counter value of a generated id (`node-42` -> 42).
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix(ID_PREFIX)?.parse().ok()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Leaf node pointing at a URL.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bookmark {
    pub id: Option<NodeId>,
    pub title: Option<String>,
    pub url: String,
    /// One-shot highlight after a move; never persisted.
    pub just_moved: bool,
    pub extra: Attributes,
}

impl Bookmark {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Title, falling back to the URL when the title is missing or empty.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => &self.url,
        }
    }
}

/// Container node with ordered children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Folder {
    pub id: Option<NodeId>,
    pub title: Option<String>,
    pub children: Vec<Node>,
    pub collapsed: bool,
    /// One-shot highlight after a move; never persisted.
    pub just_moved: bool,
    /// Imported without a `children` key; written back the same way while empty.
    pub children_absent: bool,
    pub extra: Attributes,
}

impl Folder {
    pub fn new(title: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            title: Some(title.into()),
            children,
            ..Self::default()
        }
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => UNTITLED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Bookmark(Bookmark),
    Folder(Folder),
}

impl Node {
    pub fn bookmark(title: impl Into<String>, url: impl Into<String>) -> Self {
        Node::Bookmark(Bookmark::new(title, url))
    }

    pub fn folder(title: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Folder(Folder::new(title, children))
    }

    pub fn id(&self) -> Option<&NodeId> {
        match self {
            Node::Bookmark(b) => b.id.as_ref(),
            Node::Folder(f) => f.id.as_ref(),
        }
    }

    pub(crate) fn id_slot(&mut self) -> &mut Option<NodeId> {
        match self {
            Node::Bookmark(b) => &mut b.id,
            Node::Folder(f) => &mut f.id,
        }
    }

    pub fn has_id(&self, id: &NodeId) -> bool {
        self.id() == Some(id)
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Node::Bookmark(b) => b.title.as_deref(),
            Node::Folder(f) => f.title.as_deref(),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = Some(title.into());
        match self {
            Node::Bookmark(b) => b.title = title,
            Node::Folder(f) => f.title = title,
        }
    }

    pub fn display_title(&self) -> &str {
        match self {
            Node::Bookmark(b) => b.display_title(),
            Node::Folder(f) => f.display_title(),
        }
    }

    /// URL of a bookmark; `None` for folders.
    pub fn url(&self) -> Option<&str> {
        match self {
            Node::Bookmark(b) => Some(&b.url),
            Node::Folder(_) => None,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Node::Folder(_))
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Node::Folder(f) => Some(f),
            Node::Bookmark(_) => None,
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut Folder> {
        match self {
            Node::Folder(f) => Some(f),
            Node::Bookmark(_) => None,
        }
    }

    /// Children of a folder; always empty for bookmarks.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Folder(f) => &f.children,
            Node::Bookmark(_) => &[],
        }
    }

    pub fn just_moved(&self) -> bool {
        match self {
            Node::Bookmark(b) => b.just_moved,
            Node::Folder(f) => f.just_moved,
        }
    }

    pub fn set_just_moved(&mut self, moved: bool) {
        match self {
            Node::Bookmark(b) => b.just_moved = moved,
            Node::Folder(f) => f.just_moved = moved,
        }
    }

    pub fn extra(&self) -> &Attributes {
        match self {
            Node::Bookmark(b) => &b.extra,
            Node::Folder(f) => &f.extra,
        }
    }
}

impl From<Bookmark> for Node {
    fn from(bookmark: Bookmark) -> Self {
        Node::Bookmark(bookmark)
    }
}

impl From<Folder> for Node {
    fn from(folder: Folder) -> Self {
        Node::Folder(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_generated_id_when_reading_sequence_then_returns_counter() {
        assert_eq!(NodeId::generated(42).sequence(), Some(42));
        assert_eq!(NodeId::new("custom").sequence(), None);
        assert_eq!(NodeId::new("node-x").sequence(), None);
    }

    #[test]
    fn given_missing_titles_when_displaying_then_falls_back() {
        let mut bookmark = Bookmark::new("", "https://example.com");
        assert_eq!(bookmark.display_title(), "https://example.com");
        bookmark.title = None;
        assert_eq!(bookmark.display_title(), "https://example.com");

        let folder = Folder::default();
        assert_eq!(folder.display_title(), UNTITLED);
    }

    #[test]
    fn given_bookmark_when_asking_children_then_empty() {
        let node = Node::bookmark("a", "https://a.test");
        assert!(node.children().is_empty());
        assert!(!node.is_folder());
        assert_eq!(node.url(), Some("https://a.test"));
    }
}
