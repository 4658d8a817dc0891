//! Domain layer: the bookmark tree and its algorithms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod codec;
pub mod duplicates;
pub mod error;
pub mod node;
pub mod search;
pub mod tree;

pub use codec::{export_json, import_tree, parse_import, persisted_json, restore_persisted, ExportNode};
pub use duplicates::{normalize_url, DuplicateGroup, DuplicateSet};
pub use error::{DomainError, DomainResult};
pub use node::{Attributes, Bookmark, Folder, Node, NodeId, UNTITLED};
pub use search::{fuzzy_match, matches_query, Filter, Visibility, VisibilityMap};
pub use tree::{
    build_breadcrumb, collect_bookmarks, count_bookmarks, find_node, insert_node, is_descendant,
    move_node, remove_node, BookmarkTree, Found, Removed,
};
