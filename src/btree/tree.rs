//! B+ tree core implementation.
//!
//! This module provides the main BPlusTree struct with operations for:
//! - search: Point lookups
//! - insert: Insertions and updates
//! - remove: Removals with sibling repair
//! - range_query / range_begin: Ordered range scans over the leaf chain

use super::arena::NodeArena;
use super::cursor::RangeCursor;
use super::rebalance;
use super::split::{self, SplitOutcome};
use crate::node::{InternalNode, LeafInsert, LeafNode, Node};
use crate::types::{NodeId, TreeConfig};

/// An in-memory B+ tree
///
/// Keys are kept in sorted order; every key/value pair lives in a leaf and
/// the leaves form a singly linked chain in key order, so a range scan
/// descends once and then walks the chain.
///
/// The tree has a single writer: mutation takes `&mut self`, and cursors
/// borrow the tree, so a cursor can never observe a concurrent split.
#[derive(Debug, Clone)]
pub struct BPlusTree<K, V> {
    /// Storage for every node
    pub(crate) arena: NodeArena<K, V>,
    /// Root node (None means empty tree)
    pub(crate) root: Option<NodeId>,
    /// Node capacity shared by all nodes of this tree
    pub(crate) config: TreeConfig,
    /// Number of key/value pairs
    pub(crate) len: usize,
}

impl<K, V> BPlusTree<K, V> {
    /// Create an empty tree.
    ///
    /// Branching factors below 3 are raised to 3.
    pub fn new(branching_factor: usize) -> Self {
        Self::with_config(TreeConfig::new(branching_factor))
    }

    /// Create an empty tree from a config
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            arena: NodeArena::new(),
            root: None,
            config: config.normalized(),
            len: 0,
        }
    }

    /// Get the tree configuration
    pub fn config(&self) -> TreeConfig {
        self.config
    }

    /// Maximum number of children per internal node
    pub fn branching_factor(&self) -> usize {
        self.config.branching_factor
    }

    /// Number of key/value pairs in the tree
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the tree holds no keys
    pub fn is_empty(&self) -> bool {
        match self.root {
            None => true,
            Some(root) => self.arena.get(root).key_count() == 0,
        }
    }

    /// Height of the tree (0 when empty, 1 for a single leaf)
    pub fn height(&self) -> usize {
        let Some(mut current) = self.root else {
            return 0;
        };
        let mut height = 1;
        while let Node::Internal(internal) = self.arena.get(current) {
            current = internal.child(0);
            height += 1;
        }
        height
    }

    /// Root node handle
    pub fn root_node(&self) -> Option<NodeId> {
        self.root
    }

    /// Remove every key
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.len = 0;
    }

    /// Leftmost leaf, where the leaf chain starts
    pub(crate) fn first_leaf(&self) -> Option<NodeId> {
        let mut current = self.root?;
        while let Node::Internal(internal) = self.arena.get(current) {
            current = internal.child(0);
        }
        Some(current)
    }

    /// Cursor over every pair in key order
    pub fn iter(&self) -> RangeCursor<'_, K, V>
    where
        K: Ord,
    {
        RangeCursor::new(&self.arena, self.first_leaf(), 0, None)
    }

    /// The terminal cursor
    pub fn range_end(&self) -> RangeCursor<'_, K, V> {
        RangeCursor::terminal(&self.arena)
    }
}

impl<K, V> Default for BPlusTree<K, V> {
    fn default() -> Self {
        Self::with_config(TreeConfig::default())
    }
}

impl<K: Ord, V> BPlusTree<K, V> {
    /// Look up a key and return its value
    pub fn search(&self, key: &K) -> Option<&V> {
        let leaf = self.find_leaf(key)?;
        self.arena.leaf(leaf).find_value(key)
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Descend to the leaf whose range covers `key`
    pub(crate) fn find_leaf(&self, key: &K) -> Option<NodeId> {
        let mut current = self.root?;
        while let Node::Internal(internal) = self.arena.get(current) {
            current = internal.find_child(key);
        }
        tracing::trace!(target: "bplus_tree::search", leaf = %current, "located target leaf");
        Some(current)
    }

    /// Cursor positioned at the first key >= `start`
    pub fn range_begin(&self, start: &K) -> RangeCursor<'_, K, V> {
        self.seek(start, None)
    }

    /// Cursor positioned at the first key >= `start`, ending after `end`
    pub fn range_begin_bounded(&self, start: &K, end: &K) -> RangeCursor<'_, K, V>
    where
        K: Clone,
    {
        self.seek(start, Some(end.clone()))
    }

    /// Cursor over `[start, end]` with either bound optional
    pub fn scan(&self, start: Option<&K>, end: Option<&K>) -> RangeCursor<'_, K, V>
    where
        K: Clone,
    {
        let end = end.cloned();
        match start {
            Some(start) => self.seek(start, end),
            None => RangeCursor::new(&self.arena, self.first_leaf(), 0, end),
        }
    }

    fn seek(&self, start: &K, end: Option<K>) -> RangeCursor<'_, K, V> {
        match self.find_leaf(start) {
            Some(leaf) => {
                let index = self.arena.leaf(leaf).lower_bound(start);
                RangeCursor::new(&self.arena, Some(leaf), index, end)
            }
            None => RangeCursor::terminal(&self.arena),
        }
    }

    /// Collect every pair with `start <= key <= end` in key order
    pub fn range_query(&self, start: &K, end: &K) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        if start > end {
            return Vec::new();
        }
        self.range_begin_bounded(start, end)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: Ord + Clone, V> BPlusTree<K, V> {
    /// Insert or update a key/value pair
    ///
    /// Insertion always succeeds. If the key was already present its value
    /// is replaced in place and the previous value is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let root = match self.root {
            Some(root) => root,
            None => {
                let root = self
                    .arena
                    .allocate(Node::Leaf(LeafNode::new(self.config.max_keys())));
                self.root = Some(root);
                root
            }
        };

        let (outcome, previous) = self.insert_into(root, key, value);
        if previous.is_none() {
            self.len += 1;
        }

        // Handle root split
        if let SplitOutcome::Split { promoted, sibling } = outcome {
            self.split_root(root, promoted, sibling);
        }

        previous
    }

    /// Recursive insert
    ///
    /// Returns the split this subtree's root went through (if any) and the
    /// value replaced by an update.
    fn insert_into(&mut self, id: NodeId, key: K, value: V) -> (SplitOutcome<K>, Option<V>) {
        let step = match self.arena.get(id) {
            Node::Leaf(_) => None,
            Node::Internal(internal) => {
                let index = internal.child_index(&key);
                Some((index, internal.child(index)))
            }
        };

        let Some((index, child)) = step else {
            return self.insert_into_leaf(id, key, value);
        };

        let (outcome, previous) = self.insert_into(child, key, value);

        // Handle child split
        let outcome = match outcome {
            SplitOutcome::NoSplit => SplitOutcome::NoSplit,
            SplitOutcome::Split { promoted, sibling } => {
                let internal = self.arena.internal_mut(id);
                if internal.is_full() {
                    split::split_internal(&mut self.arena, id, index, promoted, sibling)
                } else {
                    internal.insert_child(index, promoted, sibling);
                    SplitOutcome::NoSplit
                }
            }
        };

        (outcome, previous)
    }

    /// Insert into a leaf, splitting it when full
    fn insert_into_leaf(&mut self, id: NodeId, key: K, value: V) -> (SplitOutcome<K>, Option<V>) {
        match self.arena.leaf_mut(id).insert_value(key, value) {
            LeafInsert::Inserted => (SplitOutcome::NoSplit, None),
            LeafInsert::Updated(old) => (SplitOutcome::NoSplit, Some(old)),
            LeafInsert::Full(key, value) => {
                (split::split_leaf(&mut self.arena, id, key, value), None)
            }
        }
    }

    /// Remove a key from the tree
    ///
    /// Returns true if the key was found and removed.
    pub fn remove(&mut self, key: &K) -> bool {
        self.take(key).is_some()
    }

    /// Remove a key and return its value
    pub fn take(&mut self, key: &K) -> Option<V> {
        let root = self.root?;
        let removed = self.remove_from(root, key)?;
        self.len -= 1;
        self.shrink_root();
        Some(removed)
    }

    /// Recursive delete; repairs any child left below minimum occupancy
    fn remove_from(&mut self, id: NodeId, key: &K) -> Option<V> {
        let step = match self.arena.get(id) {
            Node::Leaf(_) => None,
            Node::Internal(internal) => {
                let index = internal.child_index(key);
                Some((index, internal.child(index)))
            }
        };

        let Some((index, child)) = step else {
            return self.arena.leaf_mut(id).remove_value(key);
        };

        let removed = self.remove_from(child, key)?;
        if self.arena.get(child).needs_rebalance() {
            rebalance::repair_child(&mut self.arena, id, index);
        }
        Some(removed)
    }

    /// Collapse a root that has run out of keys
    fn shrink_root(&mut self) {
        let Some(root) = self.root else {
            return;
        };

        let replacement = match self.arena.get(root) {
            Node::Internal(internal) if internal.key_count() == 0 => Some(Some(internal.child(0))),
            Node::Leaf(leaf) if leaf.key_count() == 0 => Some(None),
            _ => None,
        };

        if let Some(new_root) = replacement {
            self.arena.release(root);
            self.root = new_root;
            tracing::debug!(
                target: "bplus_tree::tree",
                old_root = %root,
                height = self.height(),
                "collapsed root"
            );
        }
    }

    /// Split the root, creating a new root one level up
    fn split_root(&mut self, old_root: NodeId, promoted: K, sibling: NodeId) {
        let new_root = InternalNode::new_root(self.config.max_keys(), old_root, promoted, sibling);
        let new_root = self.arena.allocate(Node::Internal(new_root));
        self.root = Some(new_root);

        tracing::debug!(
            target: "bplus_tree::tree",
            root = %new_root,
            height = self.height(),
            "grew new root"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    fn keys_of(pairs: &[(i32, String)]) -> Vec<i32> {
        pairs.iter().map(|(k, _)| *k).collect()
    }

    /// Depth of every leaf, left to right
    fn leaf_depths(tree: &BPlusTree<i32, String>) -> Vec<usize> {
        fn walk(tree: &BPlusTree<i32, String>, id: NodeId, depth: usize, out: &mut Vec<usize>) {
            match tree.arena.get(id) {
                Node::Leaf(_) => out.push(depth),
                Node::Internal(internal) => {
                    for &child in internal.children() {
                        walk(tree, child, depth + 1, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        if let Some(root) = tree.root {
            walk(tree, root, 1, &mut out);
        }
        out
    }

    #[test]
    fn test_tree_empty() {
        let mut tree: BPlusTree<i32, String> = BPlusTree::new(4);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.search(&1), None);
        assert!(!tree.remove(&1));
        assert!(tree.range_query(&0, &100).is_empty());
        assert!(tree.range_begin(&0).is_end());
    }

    #[test]
    fn test_branching_factor_clamped() {
        let tree: BPlusTree<i32, i32> = BPlusTree::new(1);
        assert_eq!(tree.branching_factor(), 3);
        assert_eq!(BPlusTree::<i32, i32>::default().branching_factor(), 64);
    }

    #[test]
    fn test_tree_single_insert() {
        let mut tree = BPlusTree::new(4);
        assert_eq!(tree.insert(1, "one".to_string()), None);
        assert!(!tree.is_empty());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.search(&1).map(String::as_str), Some("one"));
        assert_eq!(tree.search(&2), None);
    }

    #[test]
    fn test_tree_update_is_not_insert() {
        let mut tree = BPlusTree::new(4);
        tree.insert(7, "first".to_string());
        assert_eq!(tree.insert(7, "second".to_string()), Some("first".to_string()));

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.search(&7).map(String::as_str), Some("second"));
        assert_eq!(tree.range_query(&0, &10), vec![(7, "second".to_string())]);
    }

    #[test]
    fn test_scenario_small_tree_range() {
        let mut tree = BPlusTree::new(4);
        for k in [5, 15, 10, 20, 1] {
            tree.insert(k, format!("v{}", k));
        }

        assert_eq!(tree.search(&10).map(String::as_str), Some("v10"));
        assert_eq!(tree.height(), 2);
        let range = tree.range_query(&3, &17);
        assert_eq!(keys_of(&range), vec![5, 10, 15]);
        assert_eq!(range[0].1, "v5");
    }

    #[test]
    fn test_scenario_twenty_keys() {
        let mut tree = BPlusTree::new(8);
        for k in 1..=20 {
            tree.insert(k, format!("value_{}", k));
        }

        assert_eq!(tree.range_query(&5, &15).len(), 11);
        assert_eq!(tree.range_query(&25, &30).len(), 0);
    }

    #[test]
    fn test_scenario_many_splits() {
        let mut tree = BPlusTree::new(4);
        for k in 1..=100 {
            tree.insert(k, format!("v{}", k));
        }

        for k in 1..=100 {
            assert_eq!(tree.search(&k), Some(&format!("v{}", k)), "missing key {}", k);
        }
        let all = tree.range_query(&1, &100);
        assert_eq!(all.len(), 100);
        assert!(all.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(tree.height() > 2);
        tree.validate().unwrap();
    }

    #[test]
    fn test_scenario_delete_evens() {
        let mut tree = BPlusTree::new(4);
        for k in 1..=50 {
            tree.insert(k, format!("v{}", k));
        }
        for k in (2..=50).step_by(2) {
            assert!(tree.remove(&k), "failed to remove {}", k);
        }

        let odds: Vec<i32> = (1..=50).step_by(2).collect();
        assert_eq!(keys_of(&tree.range_query(&1, &50)), odds);
        assert_eq!(tree.len(), 25);
        tree.validate().unwrap();
    }

    #[test]
    fn test_remove_leaves_other_keys() {
        let mut tree = BPlusTree::new(5);
        for k in 0..40 {
            tree.insert(k, k.to_string());
        }

        assert!(tree.remove(&17));
        assert!(!tree.remove(&17));
        assert_eq!(tree.search(&17), None);
        for k in (0..40).filter(|&k| k != 17) {
            assert_eq!(tree.search(&k), Some(&k.to_string()));
        }
        assert_eq!(tree.take(&18), Some("18".to_string()));
        assert_eq!(tree.len(), 38);
    }

    #[test]
    fn test_range_query_inverted_bounds() {
        let mut tree = BPlusTree::new(4);
        for k in 1..=10 {
            tree.insert(k, k.to_string());
        }
        assert!(tree.range_query(&8, &3).is_empty());
        assert_eq!(keys_of(&tree.range_query(&4, &4)), vec![4]);
    }

    #[test]
    fn test_root_collapses_to_leaf() {
        let mut tree = BPlusTree::new(4);
        for k in 1..=4 {
            tree.insert(k, k.to_string());
        }
        // Leaves [1, 2] and [3, 4] under root [3]
        assert_eq!(tree.height(), 2);

        assert!(tree.remove(&4));
        assert!(tree.remove(&3)); // borrows 2 from the left leaf
        assert_eq!(tree.height(), 2);
        assert!(tree.remove(&2)); // merges, root collapses
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.search(&1).map(String::as_str), Some("1"));

        assert!(tree.remove(&1));
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.arena.live_count(), 0);
    }

    #[test]
    fn test_delete_everything_then_reuse() {
        let mut tree = BPlusTree::new(3);
        for k in 0..200 {
            tree.insert(k, k.to_string());
        }
        for k in 0..200 {
            assert!(tree.remove(&k));
            tree.validate().unwrap();
        }
        assert!(tree.is_empty());
        assert_eq!(tree.arena.live_count(), 0);

        tree.insert(5, "five".to_string());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.search(&5).map(String::as_str), Some("five"));
    }

    #[test]
    fn test_height_uniform_after_inserts() {
        for bf in [3, 4, 5, 8, 16] {
            let mut tree = BPlusTree::new(bf);
            let mut rng = StdRng::seed_from_u64(bf as u64);
            for _ in 0..500 {
                let k = rng.gen_range(0..1000);
                tree.insert(k, k.to_string());
            }
            let depths = leaf_depths(&tree);
            assert!(!depths.is_empty());
            assert!(depths.iter().all(|&d| d == tree.height()), "bf {}: {:?}", bf, depths);
        }
    }

    #[test]
    fn test_randomized_against_btreemap() {
        for bf in [3, 4, 7] {
            let mut tree = BPlusTree::new(bf);
            let mut model = BTreeMap::new();
            let mut rng = StdRng::seed_from_u64(0xB7EE + bf as u64);

            for step in 0..3000 {
                let k: i32 = rng.gen_range(0..300);
                if rng.gen_bool(0.6) {
                    let v = format!("{}-{}", k, step);
                    assert_eq!(tree.insert(k, v.clone()), model.insert(k, v));
                } else {
                    assert_eq!(tree.take(&k), model.remove(&k));
                }
                assert_eq!(tree.len(), model.len());
                tree.validate().unwrap();
            }

            for (k, v) in &model {
                assert_eq!(tree.search(k), Some(v));
            }
            let expected: Vec<(i32, String)> =
                model.range(50..=250).map(|(k, v)| (*k, v.clone())).collect();
            assert_eq!(tree.range_query(&50, &250), expected);
            assert!(leaf_depths(&tree).iter().all(|&d| d == tree.height()));
        }
    }

    #[test]
    fn test_clear() {
        let mut tree = BPlusTree::new(4);
        for k in 0..50 {
            tree.insert(k, k.to_string());
        }
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.search(&3), None);
        tree.insert(3, "3".to_string());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_string_keys() {
        let mut tree = BPlusTree::new(4);
        for word in ["delta", "alpha", "echo", "charlie", "bravo"] {
            tree.insert(word.to_string(), word.len());
        }
        let keys: Vec<&String> = tree.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["alpha", "bravo", "charlie", "delta", "echo"]);
        assert_eq!(tree.search(&"echo".to_string()), Some(&4));
    }

    #[test]
    fn test_scan_open_bounds() {
        let mut tree = BPlusTree::new(4);
        for k in 1..=30 {
            tree.insert(k, k.to_string());
        }
        assert_eq!(tree.scan(None, None).count(), 30);
        assert_eq!(tree.scan(None, Some(&10)).count(), 10);
        assert_eq!(tree.scan(Some(&21), None).count(), 10);
        assert_eq!(tree.scan(Some(&11), Some(&20)).count(), 10);
        assert_eq!(tree.scan(Some(&20), Some(&11)).count(), 0);
    }
}
