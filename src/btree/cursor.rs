//! Range cursor over the leaf chain.
//!
//! A cursor is a position `(leaf, index)` in the leaf chain plus an optional
//! inclusive upper bound. Once it runs past the last leaf or past its bound
//! it becomes terminal: no leaf, index 0. Every terminal cursor compares
//! equal to `range_end()`.
//!
//! The cursor borrows the tree, so the tree cannot be modified while a
//! cursor is alive.

use super::arena::NodeArena;
use crate::error::{Result, TreeError};
use crate::types::NodeId;
use std::fmt;
use std::ptr;

/// A forward cursor yielding key/value pairs in key order
pub struct RangeCursor<'a, K, V> {
    /// Node storage of the tree being walked
    arena: &'a NodeArena<K, V>,
    /// Current leaf (None means terminal)
    leaf: Option<NodeId>,
    /// Position within the current leaf
    index: usize,
    /// Inclusive upper bound
    end: Option<K>,
}

impl<'a, K, V> RangeCursor<'a, K, V> {
    /// The terminal cursor
    pub(crate) fn terminal(arena: &'a NodeArena<K, V>) -> Self {
        Self {
            arena,
            leaf: None,
            index: 0,
            end: None,
        }
    }

    /// Check if the cursor has run off its range
    pub fn is_end(&self) -> bool {
        self.leaf.is_none()
    }

    /// Leaf the cursor currently points into
    pub fn leaf(&self) -> Option<NodeId> {
        self.leaf
    }

    /// Position within the current leaf
    pub fn index(&self) -> usize {
        self.index
    }

    /// Get the key/value pair under the cursor
    pub fn current(&self) -> Result<(&'a K, &'a V)> {
        let arena: &'a NodeArena<K, V> = self.arena;
        let leaf = self.leaf.ok_or(TreeError::CursorOutOfRange)?;
        arena
            .leaf(leaf)
            .entry(self.index)
            .ok_or(TreeError::CursorOutOfRange)
    }

    /// Get the key under the cursor
    pub fn key(&self) -> Result<&'a K> {
        self.current().map(|(k, _)| k)
    }

    /// Get the value under the cursor
    pub fn value(&self) -> Result<&'a V> {
        self.current().map(|(_, v)| v)
    }

    fn finish(&mut self) {
        self.leaf = None;
        self.index = 0;
    }
}

impl<'a, K: Ord, V> RangeCursor<'a, K, V> {
    /// Position a cursor at `(leaf, index)`, moving forward to the first
    /// live entry and honouring `end`
    pub(crate) fn new(
        arena: &'a NodeArena<K, V>,
        leaf: Option<NodeId>,
        index: usize,
        end: Option<K>,
    ) -> Self {
        let mut cursor = Self {
            arena,
            leaf,
            index,
            end,
        };
        cursor.settle();
        cursor
    }

    /// Move to the next pair; a no-op on a terminal cursor
    pub fn advance(&mut self) {
        if self.leaf.is_some() {
            self.index += 1;
            self.settle();
        }
    }

    /// Skip exhausted and empty leaves, then apply the bound
    fn settle(&mut self) {
        let arena: &'a NodeArena<K, V> = self.arena;
        while let Some(id) = self.leaf {
            let leaf = arena.leaf(id);
            match leaf.entry(self.index) {
                Some((key, _)) => {
                    if self.end.as_ref().is_some_and(|end| key > end) {
                        self.finish();
                    }
                    return;
                }
                None => {
                    tracing::trace!(target: "bplus_tree::cursor", from = %id, "following leaf link");
                    self.leaf = leaf.next();
                    self.index = 0;
                }
            }
        }
        self.finish();
    }
}

impl<'a, K: Ord, V> Iterator for RangeCursor<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.current().ok()?;
        self.advance();
        Some(item)
    }
}

impl<K, V> PartialEq for RangeCursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        match (self.leaf, other.leaf) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                ptr::eq(self.arena, other.arena) && a == b && self.index == other.index
            }
            _ => false,
        }
    }
}

impl<K: Clone, V> Clone for RangeCursor<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena,
            leaf: self.leaf,
            index: self.index,
            end: self.end.clone(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for RangeCursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeCursor")
            .field("leaf", &self.leaf)
            .field("index", &self.index)
            .field("end", &self.end)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::btree::BPlusTree;
    use crate::error::TreeError;

    fn tree_with(bf: usize, keys: impl IntoIterator<Item = i32>) -> BPlusTree<i32, String> {
        let mut tree = BPlusTree::new(bf);
        for k in keys {
            tree.insert(k, format!("v{}", k));
        }
        tree
    }

    #[test]
    fn test_terminal_cursor_errors() {
        let tree = tree_with(4, 1..=3);
        let end = tree.range_end();
        assert!(end.is_end());
        assert!(matches!(end.current(), Err(TreeError::CursorOutOfRange)));
        assert!(matches!(end.key(), Err(TreeError::CursorOutOfRange)));
    }

    #[test]
    fn test_advance_terminal_is_noop() {
        let tree = tree_with(4, 1..=3);
        let mut cursor = tree.range_end();
        cursor.advance();
        assert!(cursor.is_end());
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_cursor_walks_across_leaves() {
        let tree = tree_with(3, 1..=20);
        assert!(tree.height() > 2);

        let mut cursor = tree.range_begin(&4);
        let mut seen = Vec::new();
        while !cursor.is_end() {
            let (k, v) = cursor.current().unwrap();
            assert_eq!(v, &format!("v{}", k));
            seen.push(*k);
            cursor.advance();
        }
        assert_eq!(seen, (4..=20).collect::<Vec<_>>());
        assert_eq!(cursor, tree.range_end());
    }

    #[test]
    fn test_cursor_start_between_keys() {
        let tree = tree_with(4, (0..40).map(|k| k * 10));
        let cursor = tree.range_begin(&55);
        assert_eq!(cursor.key().unwrap(), &60);

        // Past the largest key
        assert!(tree.range_begin(&1000).is_end());
    }

    #[test]
    fn test_bounded_cursor() {
        let tree = tree_with(4, 1..=30);
        let keys: Vec<i32> = tree.range_begin_bounded(&8, &12).map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![8, 9, 10, 11, 12]);

        // First key already beyond the bound
        let cursor = tree.range_begin_bounded(&15, &14);
        assert!(cursor.is_end());
        assert_eq!(cursor, tree.range_end());
    }

    #[test]
    fn test_cursor_equality() {
        let tree = tree_with(4, 1..=10);
        let other = tree_with(4, 1..=10);

        let a = tree.range_begin(&5);
        let b = tree.range_begin(&5);
        assert_eq!(a, b);

        let mut c = tree.range_begin(&5);
        c.advance();
        assert_ne!(a, c);
        assert_eq!(c.key().unwrap(), &6);

        // Same position in a different tree
        assert_ne!(a, other.range_begin(&5));

        // All terminal cursors compare equal
        assert_eq!(tree.range_end(), other.range_end());
        assert_eq!(tree.range_begin(&99), other.range_end());
    }

    #[test]
    fn test_cursor_after_delete_repair() {
        let mut tree = tree_with(4, 1..=6);
        // Emptying the middle leaf makes the tree repair itself; iteration
        // must still see exactly the survivors in order
        tree.remove(&3);
        tree.remove(&4);
        let keys: Vec<i32> = tree.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 2, 5, 6]);
        assert_eq!(tree.range_begin(&3).key().unwrap(), &5);
    }

    #[test]
    fn test_cursor_clone_is_independent() {
        let tree = tree_with(4, 1..=5);
        let mut a = tree.range_begin(&2);
        let b = a.clone();
        a.advance();
        assert_eq!(b.key().unwrap(), &2);
        assert_eq!(a.key().unwrap(), &3);
    }
}
