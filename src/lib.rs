//! # B+ Tree
//!
//! An in-memory B+ tree: an ordered key/value index with logarithmic point
//! lookups and efficient range scans over linked leaves.
//!
//! ## Architecture
//!
//! - **Node Layer** (`node`): Leaf and internal node shapes
//! - **B+ Tree Layer** (`btree`): Node arena, insert/split, delete
//!   repair, range cursors and diagnostics
//! - **Db** (this module): A shareable, lock-guarded byte-keyed handle
//!
//! ## Usage
//!
//! ```rust
//! use bplus_tree::BPlusTree;
//!
//! let mut tree = BPlusTree::new(4);
//! for k in [5, 15, 10, 20, 1] {
//!     tree.insert(k, format!("v{}", k));
//! }
//!
//! assert_eq!(tree.search(&10).map(String::as_str), Some("v10"));
//!
//! let keys: Vec<i32> = tree.range_query(&3, &17).into_iter().map(|(k, _)| k).collect();
//! assert_eq!(keys, vec![5, 10, 15]);
//!
//! // Cursor walk
//! for (key, value) in tree.range_begin_bounded(&10, &20) {
//!     println!("{} -> {}", key, value);
//! }
//! ```

pub mod btree;
pub mod error;
pub mod node;
pub mod types;

pub use error::{Result, TreeError};
pub use types::{NodeId, TreeConfig, DEFAULT_BRANCHING_FACTOR, MIN_BRANCHING_FACTOR};

// Re-export main public API
pub use btree::{BPlusTree, RangeCursor, TreeNode, TreeStats};

use parking_lot::RwLock;
use std::sync::Arc;

type ByteTree = BPlusTree<Vec<u8>, Vec<u8>>;

#[allow(clippy::ptr_arg)]
fn lossy(bytes: &Vec<u8>) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Shared database handle over a byte-keyed B+ tree
///
/// Cloning the handle shares the tree. Reads take a shared lock and writes
/// an exclusive one, so scans are materialised before the lock is released.
#[derive(Clone)]
pub struct Db {
    tree: Arc<RwLock<ByteTree>>,
    config: TreeConfig,
}

impl Db {
    /// Create an empty database
    pub fn open(config: TreeConfig) -> Self {
        let config = config.normalized();
        tracing::debug!(
            target: "bplus_tree::db",
            branching_factor = config.branching_factor,
            "opened in-memory database"
        );
        Self {
            tree: Arc::new(RwLock::new(BPlusTree::with_config(config))),
            config,
        }
    }

    /// Get the current B+ tree configuration
    pub fn btree_config(&self) -> TreeConfig {
        self.config
    }

    /// Get a value by key
    ///
    /// Returns `None` if the key does not exist.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let tree = self.tree.read();
        tree.search(&key.to_vec()).cloned()
    }

    /// Insert or update a key-value pair, returning the previous value
    pub fn put(&self, key: &[u8], value: &[u8]) -> Option<Vec<u8>> {
        let mut tree = self.tree.write();
        tree.insert(key.to_vec(), value.to_vec())
    }

    /// Delete a key-value pair
    ///
    /// Returns `true` if the key existed and was deleted.
    pub fn delete(&self, key: &[u8]) -> bool {
        let mut tree = self.tree.write();
        tree.remove(&key.to_vec())
    }

    /// Check if a key exists
    pub fn contains(&self, key: &[u8]) -> bool {
        let tree = self.tree.read();
        tree.contains_key(&key.to_vec())
    }

    /// Number of stored pairs
    pub fn len(&self) -> usize {
        self.tree.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.read().is_empty()
    }

    /// All key-value pairs in sorted order
    pub fn iter(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.range(None, None)
    }

    /// Key-value pairs in a range
    ///
    /// Both bounds are inclusive and optional; `None` means unbounded on
    /// that side.
    pub fn range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Vec<(Vec<u8>, Vec<u8>)> {
        let start = start.map(<[u8]>::to_vec);
        let end = end.map(<[u8]>::to_vec);
        let tree = self.tree.read();
        tree.scan(start.as_ref(), end.as_ref())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Remove every key
    pub fn clear(&self) {
        self.tree.write().clear();
    }

    /// Debug trace a key lookup
    pub fn debug_get(&self, key: &[u8]) -> Vec<String> {
        let tree = self.tree.read();
        tree.debug_get_with(&key.to_vec(), &lossy)
    }

    /// Get statistics about the database
    pub fn stats(&self) -> TreeStats {
        self.tree.read().stats()
    }

    /// Export the tree structure for visualization
    pub fn export_tree(&self) -> Option<TreeNode> {
        let tree = self.tree.read();
        tree.export_with(&lossy, &lossy)
    }

    /// Text dump of every node
    pub fn dump(&self) -> String {
        let tree = self.tree.read();
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = tree.print_tree_with(&mut out, &lossy, &lossy);
        out
    }

    /// Check every structural invariant of the tree
    pub fn validate(&self) -> Result<()> {
        self.tree.read().validate()
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::open(TreeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_basic_operations() -> Result<()> {
        let db = Db::open(TreeConfig::new(4));

        // Test put and get
        assert_eq!(db.put(b"key1", b"value1"), None);
        assert_eq!(db.get(b"key1"), Some(b"value1".to_vec()));

        // Test update
        assert_eq!(db.put(b"key1", b"value2"), Some(b"value1".to_vec()));
        assert_eq!(db.get(b"key1"), Some(b"value2".to_vec()));
        assert_eq!(db.len(), 1);

        // Test delete
        assert!(db.delete(b"key1"));
        assert_eq!(db.get(b"key1"), None);

        // Test non-existent key
        assert_eq!(db.get(b"nonexistent"), None);
        assert!(!db.delete(b"nonexistent"));
        assert!(db.is_empty());

        db.validate()
    }

    #[test]
    fn test_range_scan() -> Result<()> {
        let db = Db::open(TreeConfig::new(3));

        // Insert some data
        db.put(b"apple", b"1");
        db.put(b"banana", b"2");
        db.put(b"cherry", b"3");
        db.put(b"date", b"4");

        // Full scan
        let all = db.iter();
        assert_eq!(all.len(), 4);

        // Range scan, both ends inclusive
        let range = db.range(Some(b"banana"), Some(b"cherry"));
        assert_eq!(range.len(), 2);
        assert_eq!(range[0].0, b"banana".to_vec());
        assert_eq!(range[1].0, b"cherry".to_vec());

        let tail = db.range(Some(b"c"), None);
        assert_eq!(tail.len(), 2);
        assert_eq!(db.range(None, Some(b"b")).len(), 1);

        db.validate()
    }

    #[test]
    fn test_diagnostics_render_text() {
        let db = Db::open(TreeConfig::new(3));
        for word in ["alpha", "bravo", "charlie"] {
            db.put(word.as_bytes(), b"x");
        }

        let dump = db.dump();
        assert!(dump.starts_with("B+ Tree Structure:"));
        assert!(dump.contains("(alpha:x)"));

        let root = db.export_tree().unwrap();
        assert!(!root.is_leaf);
        assert_eq!(root.children[0].keys, vec!["alpha".to_string()]);

        let trace = db.debug_get(b"bravo");
        assert_eq!(trace[0], "Searching for key: bravo");

        let stats = db.stats();
        assert_eq!(stats.len, 3);
        assert_eq!(stats.branching_factor, 3);
    }

    #[test]
    fn test_shared_handle() -> Result<()> {
        let db = Db::default();
        assert_eq!(db.btree_config(), TreeConfig::default());

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let db = db.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        let key = format!("t{}_{:04}", t, i);
                        db.put(key.as_bytes(), b"v");
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().expect("writer thread panicked");
        }

        assert_eq!(db.len(), 1000);
        assert!(db.contains(b"t3_0249"));
        db.validate()?;

        db.clear();
        assert!(db.is_empty());
        Ok(())
    }
}
