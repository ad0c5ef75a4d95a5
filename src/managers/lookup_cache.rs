//! Bounded LRU lookup caches over the bookmark tree.
//!
//! Two caches map a file path and a node id to the node's index path. They
//! are cleared wholesale on every structural mutation; a miss always falls
//! back to a full traversal, and a hit is re-checked against the tree before
//! it is trusted.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::managers::bookmark_tree::{BookmarkTree, NodePath};
use crate::types::bookmark::TreeNode;

/// Default entries per cache.
pub const DEFAULT_CAPACITY: usize = 100;

pub struct LookupCache {
    by_file: LruCache<String, NodePath>,
    by_id: LruCache<String, NodePath>,
    hits: u64,
    misses: u64,
}

impl LookupCache {
    /// Creates caches holding `capacity` entries each (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            by_file: LruCache::new(capacity),
            by_id: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Path to the bookmark for `file_path`.
    pub fn bookmark_path(&mut self, tree: &BookmarkTree, file_path: &str) -> Option<NodePath> {
        if let Some(path) = self.by_file.get(file_path) {
            let valid = tree
                .node_at(path)
                .and_then(TreeNode::as_bookmark)
                .is_some_and(|b| b.file_path == file_path);
            if valid {
                self.hits += 1;
                return Some(path.clone());
            }
            self.by_file.pop(file_path);
        }

        self.misses += 1;
        let path = tree.find_path_by_file(file_path)?;
        self.by_file.put(file_path.to_string(), path.clone());
        Some(path)
    }

    /// Path to the node with `id`.
    pub fn node_path(&mut self, tree: &BookmarkTree, id: &str) -> Option<NodePath> {
        if let Some(path) = self.by_id.get(id) {
            if tree.node_at(path).is_some_and(|n| n.id() == id) {
                self.hits += 1;
                return Some(path.clone());
            }
            self.by_id.pop(id);
        }

        self.misses += 1;
        let path = tree.find_path_by_id(id)?;
        self.by_id.put(id.to_string(), path.clone());
        Some(path)
    }

    /// Drops every cached entry.
    pub fn invalidate(&mut self) {
        self.by_file.clear();
        self.by_id.clear();
    }

    pub fn len(&self) -> usize {
        self.by_file.len() + self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
