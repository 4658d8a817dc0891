//! Bookmark store implementations
//!
//! [`ArenaBookmarkStore`] keeps a browser-like bookmark tree in a generational
//! arena; [`FileBookmarkStore`] persists one to a JSON file after every change.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::infrastructure::traits::{
    BookmarkStore, CreateDetails, FileSystem, RealFileSystem, StoreNode,
};

/// Top-level roots of a fresh store, in browser order.
pub const DEFAULT_ROOTS: [&str; 3] = ["Bookmarks bar", "Other bookmarks", "Mobile bookmarks"];

#[derive(Debug)]
struct Entry {
    id: String,
    parent: Option<Index>,
    title: String,
    url: Option<String>,
    children: Vec<Index>,
}

#[derive(Debug)]
struct StoreArena {
    arena: Arena<Entry>,
    root: Index,
    by_id: HashMap<String, Index>,
    next_id: u64,
}

impl StoreArena {
    fn empty_root() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(Entry {
            id: "0".to_string(),
            parent: None,
            title: String::new(),
            url: None,
            children: Vec::new(),
        });
        let by_id = HashMap::from([("0".to_string(), root)]);
        Self {
            arena,
            root,
            by_id,
            next_id: 1,
        }
    }

    fn with_default_roots() -> Self {
        let mut store = Self::empty_root();
        for title in DEFAULT_ROOTS {
            let id = store.allocate_id();
            store.attach(store.root, id, title.to_string(), None);
        }
        store
    }

    fn from_nodes(nodes: Vec<StoreNode>) -> io::Result<Self> {
        let Some(root) = nodes.into_iter().next() else {
            return Ok(Self::with_default_roots());
        };
        let mut store = Self::empty_root();
        let root_idx = store.root;
        if let Some(entry) = store.arena.get_mut(root_idx) {
            entry.title = root.title;
        }
        store.by_id.clear();
        store.rekey(root_idx, root.id)?;

        let mut stack: Vec<(Index, StoreNode)> = root
            .children
            .unwrap_or_default()
            .into_iter()
            .rev()
            .map(|child| (root_idx, child))
            .collect();
        while let Some((parent, node)) = stack.pop() {
            if store.by_id.contains_key(&node.id) {
                return Err(invalid_data(format!("duplicate store id {}", node.id)));
            }
            let idx = store.attach(parent, node.id, node.title, node.url);
            if let Some(children) = node.children {
                stack.extend(children.into_iter().rev().map(|child| (idx, child)));
            }
        }
        store.next_id = store
            .by_id
            .keys()
            .filter_map(|id| id.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        Ok(store)
    }

    fn rekey(&mut self, idx: Index, id: String) -> io::Result<()> {
        let entry = self
            .arena
            .get_mut(idx)
            .ok_or_else(|| invalid_data("dangling store index"))?;
        entry.id = id.clone();
        self.by_id.insert(id, idx);
        Ok(())
    }

    fn allocate_id(&mut self) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        id
    }

    fn attach(&mut self, parent: Index, id: String, title: String, url: Option<String>) -> Index {
        let idx = self.arena.insert(Entry {
            id: id.clone(),
            parent: Some(parent),
            title,
            url,
            children: Vec::new(),
        });
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.children.push(idx);
        }
        self.by_id.insert(id, idx);
        idx
    }

    fn snapshot(&self, idx: Index) -> Option<StoreNode> {
        let entry = self.arena.get(idx)?;
        let children = match entry.url {
            Some(_) => None,
            None => Some(
                entry
                    .children
                    .iter()
                    .filter_map(|&child| self.snapshot(child))
                    .collect(),
            ),
        };
        Some(StoreNode {
            id: entry.id.clone(),
            parent_id: entry
                .parent
                .and_then(|p| self.arena.get(p))
                .map(|p| p.id.clone()),
            title: entry.title.clone(),
            url: entry.url.clone(),
            children,
        })
    }

    fn create(&mut self, details: CreateDetails) -> io::Result<StoreNode> {
        let parent = *self
            .by_id
            .get(&details.parent_id)
            .ok_or_else(|| not_found(&details.parent_id))?;
        if self.arena.get(parent).is_some_and(|p| p.url.is_some()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("parent {} is a bookmark", details.parent_id),
            ));
        }
        let id = self.allocate_id();
        let idx = self.attach(parent, id, details.title, details.url);
        self.snapshot(idx)
            .ok_or_else(|| invalid_data("created node vanished"))
    }

    fn remove_tree(&mut self, id: &str) -> io::Result<usize> {
        let idx = *self.by_id.get(id).ok_or_else(|| not_found(id))?;
        if idx == self.root {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "cannot remove the store root",
            ));
        }
        if let Some(parent) = self.arena.get(idx).and_then(|e| e.parent) {
            if let Some(parent) = self.arena.get_mut(parent) {
                parent.children.retain(|&child| child != idx);
            }
        }
        let mut removed = 0;
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.arena.remove(current) {
                self.by_id.remove(&entry.id);
                stack.extend(entry.children);
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn not_found(id: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no bookmark node {id}"))
}

fn invalid_data(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

/// In-memory store with browser-style numeric string ids.
#[derive(Debug)]
pub struct ArenaBookmarkStore {
    inner: Mutex<StoreArena>,
}

impl Default for ArenaBookmarkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaBookmarkStore {
    /// Store with the three default roots and nothing else.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreArena::with_default_roots()),
        }
    }

    /// Store seeded from a `get_tree` snapshot; ids are preserved.
    pub fn from_tree(nodes: Vec<StoreNode>) -> io::Result<Self> {
        Ok(Self {
            inner: Mutex::new(StoreArena::from_nodes(nodes)?),
        })
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, StoreArena>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "bookmark store lock poisoned"))
    }
}

impl BookmarkStore for ArenaBookmarkStore {
    fn get_tree(&self) -> io::Result<Vec<StoreNode>> {
        let store = self.lock()?;
        Ok(store.snapshot(store.root).into_iter().collect())
    }

    #[instrument(level = "trace", skip(self))]
    fn create(&self, details: CreateDetails) -> io::Result<StoreNode> {
        self.lock()?.create(details)
    }

    #[instrument(level = "trace", skip(self))]
    fn remove_tree(&self, id: &str) -> io::Result<()> {
        let removed = self.lock()?.remove_tree(id)?;
        debug!("removed {} store nodes under {}", removed, id);
        Ok(())
    }
}

/// Store kept in a JSON file (`get_tree` format), rewritten after each change.
#[derive(Debug)]
pub struct FileBookmarkStore {
    path: PathBuf,
    inner: ArenaBookmarkStore,
}

impl FileBookmarkStore {
    /// Opens `path`; a missing file starts a store with the default roots.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let inner = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let nodes: Vec<StoreNode> =
                    serde_json::from_str(&content).map_err(|e| invalid_data(e.to_string()))?;
                ArenaBookmarkStore::from_tree(nodes)?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => ArenaBookmarkStore::new(),
            Err(e) => return Err(e),
        };
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> io::Result<()> {
        let tree = self.inner.get_tree()?;
        let content =
            serde_json::to_string_pretty(&tree).map_err(|e| invalid_data(e.to_string()))?;
        RealFileSystem.write_atomic(&self.path, &content)
    }
}

impl BookmarkStore for FileBookmarkStore {
    fn get_tree(&self) -> io::Result<Vec<StoreNode>> {
        self.inner.get_tree()
    }

    fn create(&self, details: CreateDetails) -> io::Result<StoreNode> {
        let node = self.inner.create(details)?;
        self.flush()?;
        Ok(node)
    }

    fn remove_tree(&self, id: &str) -> io::Result<()> {
        self.inner.remove_tree(id)?;
        self.flush()
    }
}
