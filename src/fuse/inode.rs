//! Inode management for path <-> inode mapping
//!
//! The FUSE interface works with inodes (numeric identifiers) while
//! connectors work with paths. This module provides bidirectional
//! mapping between the two. A mapping only says which path an inode
//! stands for; whether that path still exists is always asked anew.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Root directory inode (always 1 in FUSE)
pub const ROOT_INODE: u64 = 1;

/// Manages bidirectional inode <-> path mapping
pub struct InodeTable {
    /// Maps inode -> path
    inode_to_path: DashMap<u64, PathBuf>,
    /// Maps path -> inode
    path_to_inode: DashMap<PathBuf, u64>,
    /// Next inode number to allocate
    next_inode: AtomicU64,
}

impl InodeTable {
    /// Create a new inode table with root directory pre-registered
    pub fn new() -> Self {
        let table = Self {
            inode_to_path: DashMap::new(),
            path_to_inode: DashMap::new(),
            next_inode: AtomicU64::new(ROOT_INODE + 1),
        };

        let root_path = PathBuf::from("/");
        table.inode_to_path.insert(ROOT_INODE, root_path.clone());
        table.path_to_inode.insert(root_path, ROOT_INODE);

        table
    }

    /// Get inode for a path, allocating one if it doesn't exist
    pub fn get_or_create_inode(&self, path: &Path) -> u64 {
        let normalized = normalize_path(path);

        if let Some(inode) = self.path_to_inode.get(&normalized) {
            return *inode;
        }

        // The entry lock makes allocation atomic with respect to other
        // callers racing on the same path
        let inode = *self
            .path_to_inode
            .entry(normalized.clone())
            .or_insert_with(|| {
                let inode = self.next_inode.fetch_add(1, Ordering::SeqCst);
                self.inode_to_path.insert(inode, normalized);
                inode
            });
        inode
    }

    /// Get path for an inode
    pub fn get_path(&self, inode: u64) -> Option<PathBuf> {
        self.inode_to_path.get(&inode).map(|p| p.clone())
    }

    /// Forget a path and everything below it
    pub fn remove_tree(&self, path: &Path) {
        let normalized = normalize_path(path);
        if normalized == Path::new("/") {
            return;
        }

        self.path_to_inode.retain(|p, inode| {
            if p.starts_with(&normalized) {
                self.inode_to_path.remove(inode);
                false
            } else {
                true
            }
        });
    }

    /// Get the number of tracked inodes
    pub fn len(&self) -> usize {
        self.inode_to_path.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.inode_to_path.is_empty()
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a path for consistent mapping
fn normalize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        PathBuf::from("/").join(path)
    }
}
