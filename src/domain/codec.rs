//! JSON import/export codec
//!
//! Two wire shapes share the `{title?, url?, children?}` layout:
//! - [`ExportNode`]: the portable export, no internal fields.
//! - [`PersistedNode`]: the saved workspace, adds `_id` and `_collapsed`.
//!
//! Unknown attributes survive both directions. The internal keys `_id`,
//! `_collapsed` and `_justMoved` are never read from or kept in them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::error::{DomainError, DomainResult};
use super::node::{Attributes, Bookmark, Folder, Node, NodeId};
use super::tree::BookmarkTree;

/// Transient flag a legacy save may still contain; never carried over.
const JUST_MOVED_KEY: &str = "_justMoved";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ExportNode>>,
    #[serde(flatten)]
    pub extra: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedNode {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_collapsed", default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PersistedNode>>,
    #[serde(flatten)]
    pub extra: Attributes,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Internal keys that never travel inside `extra`.
const RESERVED_KEYS: [&str; 3] = ["_id", "_collapsed", JUST_MOVED_KEY];

fn strip_reserved(mut extra: Attributes) -> Attributes {
    for key in RESERVED_KEYS {
        extra.remove(key);
    }
    extra
}

/// Shared decoding of both wire shapes.
///
/// A node is a bookmark iff it carries a non-empty URL. An empty `url` is
/// kept as a plain attribute of the folder it becomes.
fn decode<T>(
    id: Option<NodeId>,
    title: Option<String>,
    url: Option<String>,
    children: Option<Vec<T>>,
    collapsed: bool,
    extra: Attributes,
) -> Node
where
    Node: From<T>,
{
    let mut extra = strip_reserved(extra);
    match url {
        Some(url) if !url.is_empty() => {
            if children.is_some() {
                warn!("bookmark {} also lists children; children dropped", url);
            }
            Node::Bookmark(Bookmark {
                id,
                title,
                url,
                just_moved: false,
                extra,
            })
        }
        url => {
            if let Some(url) = url {
                extra.insert("url".to_string(), Value::String(url));
            }
            Node::Folder(Folder {
                id,
                title,
                children_absent: children.is_none(),
                children: children
                    .unwrap_or_default()
                    .into_iter()
                    .map(Node::from)
                    .collect(),
                collapsed,
                just_moved: false,
                extra,
            })
        }
    }
}

/// Children to write: a folder imported without `children` stays without
/// them until something is put inside.
fn encoded_children<T>(folder: &Folder, encode: impl Fn(&Node) -> T) -> Option<Vec<T>> {
    if folder.children_absent && folder.children.is_empty() {
        None
    } else {
        Some(folder.children.iter().map(encode).collect())
    }
}

impl From<ExportNode> for Node {
    fn from(raw: ExportNode) -> Self {
        decode(None, raw.title, raw.url, raw.children, false, raw.extra)
    }
}

impl From<&Node> for ExportNode {
    fn from(node: &Node) -> Self {
        match node {
            Node::Bookmark(b) => ExportNode {
                title: b.title.clone(),
                url: Some(b.url.clone()),
                children: None,
                extra: b.extra.clone(),
            },
            Node::Folder(f) => ExportNode {
                title: f.title.clone(),
                url: None,
                children: encoded_children(f, |child| ExportNode::from(child)),
                extra: f.extra.clone(),
            },
        }
    }
}

impl From<PersistedNode> for Node {
    fn from(raw: PersistedNode) -> Self {
        decode(
            raw.id.map(NodeId::from),
            raw.title,
            raw.url,
            raw.children,
            raw.collapsed,
            raw.extra,
        )
    }
}

impl From<&Node> for PersistedNode {
    fn from(node: &Node) -> Self {
        match node {
            Node::Bookmark(b) => PersistedNode {
                id: b.id.as_ref().map(|id| id.as_str().to_string()),
                collapsed: false,
                title: b.title.clone(),
                url: Some(b.url.clone()),
                children: None,
                extra: b.extra.clone(),
            },
            Node::Folder(f) => PersistedNode {
                id: f.id.as_ref().map(|id| id.as_str().to_string()),
                collapsed: f.collapsed,
                title: f.title.clone(),
                url: None,
                children: encoded_children(f, |child| PersistedNode::from(child)),
                extra: f.extra.clone(),
            },
        }
    }
}

/// Root of an import: always a folder, even if the payload put a `url` on it.
fn root_folder(node: Node) -> Folder {
    match node {
        Node::Folder(folder) => folder,
        Node::Bookmark(bookmark) => {
            let mut extra = bookmark.extra;
            extra.insert("url".to_string(), Value::String(bookmark.url));
            Folder {
                id: bookmark.id,
                title: bookmark.title,
                extra,
                ..Folder::default()
            }
        }
    }
}

/// Picks the root out of an import payload: the object itself, or the first
/// element of an array. The root must list `children`.
fn select_root(value: Value) -> DomainResult<Value> {
    let root = match value {
        Value::Array(items) => items.into_iter().next(),
        other => Some(other),
    };
    match root {
        Some(root) if root.get("children").is_some_and(|c| !c.is_null()) => Ok(root),
        _ => Err(DomainError::InvalidFormat(
            "expected a root object with children".to_string(),
        )),
    }
}

/// Parses an import payload into the root folder, without identities.
pub fn parse_import(text: &str) -> DomainResult<Folder> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DomainError::ParseFailure(e.to_string()))?;
    let root = select_root(value)?;
    let raw: ExportNode =
        serde_json::from_value(root).map_err(|e| DomainError::InvalidFormat(e.to_string()))?;
    Ok(root_folder(Node::from(raw)))
}

/// Parses an import payload into a fresh tree with newly assigned ids.
pub fn import_tree(text: &str) -> DomainResult<BookmarkTree> {
    let tree = BookmarkTree::new(parse_import(text)?);
    debug!("imported {} bookmarks", tree.count_bookmarks());
    Ok(tree)
}

/// Deep copy of the tree without internal fields.
pub fn to_export(root: &Node) -> ExportNode {
    ExportNode::from(root)
}

/// Pretty-printed export JSON. The live tree is not touched.
pub fn export_json(root: &Node) -> DomainResult<String> {
    serde_json::to_string_pretty(&to_export(root)).map_err(|e| DomainError::Encode(e.to_string()))
}

/// Workspace JSON including ids and collapsed flags, excluding transient flags.
pub fn persisted_json(tree: &BookmarkTree) -> DomainResult<String> {
    serde_json::to_string(&PersistedNode::from(tree.root()))
        .map_err(|e| DomainError::Encode(e.to_string()))
}

/// Restores a saved workspace. Ids are kept; nodes saved without one get one.
pub fn restore_persisted(text: &str) -> DomainResult<BookmarkTree> {
    let raw: PersistedNode =
        serde_json::from_str(text).map_err(|e| DomainError::ParseFailure(e.to_string()))?;
    Ok(BookmarkTree::new(root_folder(Node::from(raw))))
}
