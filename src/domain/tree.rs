//! In-memory bookmark tree: identity assignment, lookup, and mutation.
//!
//! Free functions operate on any subtree; [`BookmarkTree`] owns a root folder
//! plus the id counter and is what the application layer works with.
//! Lookups, mutations and traversals here use an explicit stack, so tree
//! depth is bounded by memory rather than by the call stack.

use std::collections::HashSet;

use tracing::{debug, instrument, trace};

use super::node::{Bookmark, Folder, Node, NodeId};

/// Lookup result: the node and its direct parent (`None` for the root).
#[derive(Debug, Clone, Copy)]
pub struct Found<'a> {
    pub node: &'a Node,
    pub parent: Option<&'a Node>,
}

/// A node detached from its parent, with enough context to put it back.
#[derive(Debug, Clone, PartialEq)]
pub struct Removed {
    pub node: Node,
    pub parent_id: Option<NodeId>,
    pub index: usize,
}

/// Depth-first search; first match wins.
pub fn find_node<'a>(root: &'a Node, id: &NodeId) -> Option<Found<'a>> {
    let mut stack: Vec<(&Node, Option<&Node>)> = vec![(root, None)];
    while let Some((node, parent)) = stack.pop() {
        if node.has_id(id) {
            return Some(Found { node, parent });
        }
        for child in node.children().iter().rev() {
            stack.push((child, Some(node)));
        }
    }
    None
}

pub fn find_node_mut<'a>(root: &'a mut Node, id: &NodeId) -> Option<&'a mut Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.has_id(id) {
            return Some(node);
        }
        if let Node::Folder(folder) = node {
            stack.extend(folder.children.iter_mut().rev());
        }
    }
    None
}

/// True iff `id` is reachable through `node`'s children (the node itself excluded).
pub fn is_descendant(node: &Node, id: &NodeId) -> bool {
    let mut stack: Vec<&Node> = node.children().iter().collect();
    while let Some(current) = stack.pop() {
        if current.has_id(id) {
            return true;
        }
        stack.extend(current.children());
    }
    false
}

/// Folder titles from the root (exclusive) down to the target's parent.
///
/// Returns `None` when `id` is not in the tree. The target itself is never part
/// of the trail, whether it is a bookmark or a folder.
pub fn build_breadcrumb(root: &Node, id: &NodeId) -> Option<Vec<String>> {
    let mut trail: Vec<String> = Vec::new();
    let mut stack: Vec<(&Node, usize)> = vec![(root, 0)];
    while let Some((node, depth)) = stack.pop() {
        // Titles of the folders strictly between the root and `node`.
        trail.truncate(depth.saturating_sub(1));
        if node.has_id(id) {
            return Some(trail);
        }
        if let Node::Folder(folder) = node {
            if depth > 0 {
                trail.push(folder.display_title().to_string());
            }
            stack.extend(folder.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }
    None
}

/// Detaches `id` from its parent. The root cannot be removed.
pub fn remove_node(root: &mut Node, id: &NodeId) -> Option<Removed> {
    if root.has_id(id) {
        return None;
    }
    detach(root, id)
}

fn detach(root: &mut Node, id: &NodeId) -> Option<Removed> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let Node::Folder(folder) = node else {
            continue;
        };
        if let Some(index) = folder.children.iter().position(|c| c.has_id(id)) {
            let node = folder.children.remove(index);
            return Some(Removed {
                node,
                parent_id: folder.id.clone(),
                index,
            });
        }
        stack.extend(folder.children.iter_mut().rev());
    }
    None
}

/// Inserts `node` under `parent` at `index`, clamped to the children length.
///
/// Bookmarks cannot hold children; the node is handed back unchanged.
pub fn insert_node(parent: &mut Node, index: usize, node: Node) -> Result<usize, Node> {
    match parent {
        Node::Folder(folder) => {
            let index = index.min(folder.children.len());
            folder.children.insert(index, node);
            Ok(index)
        }
        Node::Bookmark(_) => Err(node),
    }
}

/// Moves `node_id` under `target_parent_id` at `target_index`.
///
/// Returns `false` without touching the tree when the move is impossible:
/// unknown ids, a bookmark target, or a target inside the moving subtree.
#[instrument(level = "debug", skip(root))]
pub fn move_node(
    root: &mut Node,
    node_id: &NodeId,
    target_parent_id: &NodeId,
    target_index: usize,
) -> bool {
    if node_id == target_parent_id {
        return false;
    }
    match find_node(root, target_parent_id) {
        Some(target) if target.node.is_folder() => {}
        _ => {
            debug!("move rejected: no folder {}", target_parent_id);
            return false;
        }
    }
    let Some(moving) = find_node(root, node_id) else {
        debug!("move rejected: no node {}", node_id);
        return false;
    };
    if is_descendant(moving.node, target_parent_id) {
        debug!("move rejected: {} is inside {}", target_parent_id, node_id);
        return false;
    }
    let Some(Removed {
        mut node,
        parent_id,
        index: original_index,
    }) = remove_node(root, node_id)
    else {
        return false;
    };

    // Removal shifted later siblings down by one.
    let index = if parent_id.as_ref() == Some(target_parent_id) && original_index < target_index {
        target_index - 1
    } else {
        target_index
    };

    node.set_just_moved(true);
    match find_node_mut(root, target_parent_id) {
        Some(parent) => match insert_node(parent, index, node) {
            Ok(_) => true,
            Err(node) => {
                restore(root, parent_id.as_ref(), original_index, node);
                false
            }
        },
        None => {
            restore(root, parent_id.as_ref(), original_index, node);
            false
        }
    }
}

fn restore(root: &mut Node, parent_id: Option<&NodeId>, index: usize, mut node: Node) {
    node.set_just_moved(false);
    let Some(parent_id) = parent_id else {
        return;
    };
    if let Some(parent) = find_node_mut(root, parent_id) {
        let _ = insert_node(parent, index, node);
    }
}

/// Visits every node of the subtree, parents before children.
pub fn for_each_mut(root: &mut Node, mut f: impl FnMut(&mut Node)) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        f(&mut *node);
        if let Node::Folder(folder) = node {
            stack.extend(folder.children.iter_mut().rev());
        }
    }
}

/// Collapses or expands every folder below `node` (not `node` itself).
pub fn set_collapse_recursive(node: &mut Node, collapsed: bool) {
    let Some(folder) = node.as_folder_mut() else {
        return;
    };
    for child in &mut folder.children {
        for_each_mut(child, |n| {
            if let Node::Folder(f) = n {
                f.collapsed = collapsed;
            }
        });
    }
}

/// Every bookmark leaf below `node`, in tree order.
pub fn collect_bookmarks(node: &Node) -> Vec<&Bookmark> {
    PreOrder::new(node)
        .filter_map(|n| match n {
            Node::Bookmark(b) => Some(b),
            Node::Folder(_) => None,
        })
        .collect()
}

pub fn count_bookmarks(node: &Node) -> usize {
    PreOrder::new(node)
        .filter(|n| matches!(n, Node::Bookmark(_)))
        .count()
}

pub struct PreOrder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> PreOrder<'a> {
    pub fn new(root: &'a Node) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// Children before parents; used for bottom-up folds.
pub struct PostOrder<'a> {
    stack: Vec<(&'a Node, bool)>,
}

impl<'a> PostOrder<'a> {
    pub fn new(root: &'a Node) -> Self {
        Self {
            stack: vec![(root, false)],
        }
    }
}

impl<'a> Iterator for PostOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, visited)) = self.stack.pop() {
            if visited {
                return Some(node);
            }
            self.stack.push((node, true));
            for child in node.children().iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}

/// Next counter value not taken by any `node-N` in `used`.
///
/// The counter wraps instead of overflowing; `used` keeps a wrapped counter
/// from handing out an id that is still in the tree.
fn take_free_id(next_id: &mut u64, used: &HashSet<u64>) -> NodeId {
    while used.contains(&*next_id) {
        *next_id = next_id.wrapping_add(1);
    }
    let id = NodeId::generated(*next_id);
    *next_id = next_id.wrapping_add(1);
    id
}

/// The whole bookmark hierarchy: one root folder and its id counter.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkTree {
    root: Node,
    next_id: u64,
}

impl BookmarkTree {
    /// Takes ownership of `root`, assigning ids to every node lacking one.
    ///
    /// The counter starts past the highest `node-N` already present, so a
    /// restored tree never hands out an id it already contains.
    pub fn new(root: Folder) -> Self {
        let root = Node::Folder(root);
        let next_id = PreOrder::new(&root)
            .filter_map(|n| n.id()?.sequence())
            .max()
            .map_or(1, |max| max.wrapping_add(1));
        let mut tree = Self { root, next_id };
        tree.ensure_ids();
        tree
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_id(&self) -> Option<&NodeId> {
        self.root.id()
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Assigns a fresh id to every node without one. Idempotent.
    ///
    /// Returns how many ids were assigned.
    #[instrument(level = "trace", skip(self))]
    pub fn ensure_ids(&mut self) -> usize {
        let used = self.used_sequences();
        let Self { root, next_id } = self;
        let mut assigned = 0;
        for_each_mut(root, |node| {
            let slot = node.id_slot();
            if slot.is_none() {
                *slot = Some(take_free_id(next_id, &used));
                assigned += 1;
            }
        });
        if assigned > 0 {
            trace!("assigned {} ids", assigned);
        }
        assigned
    }

    fn used_sequences(&self) -> HashSet<u64> {
        self.iter().filter_map(|n| n.id()?.sequence()).collect()
    }

    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder::new(&self.root)
    }

    pub fn find(&self, id: &NodeId) -> Option<Found<'_>> {
        find_node(&self.root, id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.find(id).map(|found| found.node)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    pub fn breadcrumb(&self, id: &NodeId) -> Option<Vec<String>> {
        build_breadcrumb(&self.root, id)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, id: &NodeId) -> Option<Removed> {
        remove_node(&mut self.root, id)
    }

    /// Inserts a detached node under `parent_id`; ids are assigned where missing.
    #[instrument(level = "debug", skip(self, node))]
    pub fn insert(&mut self, parent_id: &NodeId, index: usize, node: Node) -> bool {
        let Some(parent) = find_node_mut(&mut self.root, parent_id) else {
            return false;
        };
        let inserted = insert_node(parent, index, node).is_ok();
        if inserted {
            self.ensure_ids();
        }
        inserted
    }

    pub fn move_node(&mut self, node_id: &NodeId, target_parent_id: &NodeId, target_index: usize) -> bool {
        move_node(&mut self.root, node_id, target_parent_id, target_index)
    }

    /// Renames a node; blank titles are ignored.
    #[instrument(level = "debug", skip(self))]
    pub fn rename(&mut self, id: &NodeId, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        match find_node_mut(&mut self.root, id) {
            Some(node) => {
                node.set_title(title);
                true
            }
            None => false,
        }
    }

    /// Appends an empty folder named `name` to the folder `parent_id`.
    #[instrument(level = "debug", skip(self))]
    pub fn add_folder(&mut self, parent_id: &NodeId, name: &str) -> Option<NodeId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if !self.get(parent_id).is_some_and(Node::is_folder) {
            return None;
        }
        let used = self.used_sequences();
        let id = take_free_id(&mut self.next_id, &used);
        let parent = find_node_mut(&mut self.root, parent_id)?.as_folder_mut()?;
        let mut folder = Folder::new(name, Vec::new());
        folder.id = Some(id.clone());
        parent.children.push(Node::Folder(folder));
        Some(id)
    }

    pub fn set_collapsed(&mut self, id: &NodeId, collapsed: bool) -> bool {
        match find_node_mut(&mut self.root, id).and_then(Node::as_folder_mut) {
            Some(folder) => {
                folder.collapsed = collapsed;
                true
            }
            None => false,
        }
    }

    /// Flips a folder's collapsed flag and returns the new value.
    pub fn toggle_collapsed(&mut self, id: &NodeId) -> Option<bool> {
        let folder = find_node_mut(&mut self.root, id)?.as_folder_mut()?;
        folder.collapsed = !folder.collapsed;
        Some(folder.collapsed)
    }

    pub fn set_collapse_recursive(&mut self, id: &NodeId, collapsed: bool) -> bool {
        match find_node_mut(&mut self.root, id) {
            Some(node) if node.is_folder() => {
                set_collapse_recursive(node, collapsed);
                true
            }
            _ => false,
        }
    }

    /// Drops one-shot display flags before persisting.
    pub fn clear_transient_flags(&mut self) {
        for_each_mut(&mut self.root, |node| node.set_just_moved(false));
    }

    pub fn bookmarks(&self) -> Vec<&Bookmark> {
        collect_bookmarks(&self.root)
    }

    pub fn count_bookmarks(&self) -> usize {
        count_bookmarks(&self.root)
    }

    /// Top-level folders; each is shown as one column.
    pub fn columns(&self) -> impl Iterator<Item = &Folder> {
        self.root.children().iter().filter_map(Node::as_folder)
    }
}
