//! Diagnostics: debug dump, search trace, structural export, statistics
//! and the invariant checker.

use super::tree::BPlusTree;
use crate::error::{Result, TreeError};
use crate::node::Node;
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node type for visualization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Arena handle of the node
    pub node_id: u32,
    /// Whether this is a leaf node
    pub is_leaf: bool,
    /// Keys in this node
    pub keys: Vec<String>,
    /// Values (only for leaf nodes)
    pub values: Vec<String>,
    /// Child nodes (only for internal nodes)
    pub children: Vec<TreeNode>,
}

/// Tree statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    /// Number of key/value pairs
    pub len: usize,
    /// Height of the tree
    pub height: usize,
    /// Total number of live nodes
    pub node_count: usize,
    /// Number of leaves
    pub leaf_count: usize,
    /// Number of internal nodes
    pub internal_count: usize,
    /// Non-root nodes holding fewer than `min_keys()` keys
    pub underflow_nodes: usize,
    /// Maximum children per internal node
    pub branching_factor: usize,
    /// Maximum keys per node
    pub max_keys: usize,
}

type Render<'f, T> = &'f dyn Fn(&T) -> String;

impl<K, V> BPlusTree<K, V> {
    /// Write an indented dump of every node, root first
    pub fn print_tree<W: fmt::Write>(&self, out: &mut W) -> fmt::Result
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        self.print_tree_with(out, &|k| format!("{:?}", k), &|v| format!("{:?}", v))
    }

    /// Like `print_tree`, rendering keys and values with the given functions
    pub fn print_tree_with<W: fmt::Write>(
        &self,
        out: &mut W,
        key_fmt: Render<'_, K>,
        value_fmt: Render<'_, V>,
    ) -> fmt::Result {
        let Some(root) = self.root else {
            return writeln!(out, "Empty tree");
        };
        writeln!(out, "B+ Tree Structure:")?;

        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let indent = "  ".repeat(depth);
            match self.arena.get(id) {
                Node::Internal(internal) => {
                    let keys: Vec<String> = internal.keys().iter().map(key_fmt).collect();
                    writeln!(out, "{}Internal Node: {}", indent, keys.join(", "))?;
                    for &child in internal.children().iter().rev() {
                        stack.push((child, depth + 1));
                    }
                }
                Node::Leaf(leaf) => {
                    let pairs: Vec<String> = leaf
                        .keys()
                        .iter()
                        .zip(leaf.values())
                        .map(|(k, v)| format!("({}:{})", key_fmt(k), value_fmt(v)))
                        .collect();
                    writeln!(out, "{}Leaf Node: {}", indent, pairs.join(", "))?;
                }
            }
        }
        Ok(())
    }

    /// Export the tree structure for visualization
    pub fn export(&self) -> Option<TreeNode>
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        self.export_with(&|k| format!("{:?}", k), &|v| format!("{:?}", v))
    }

    /// Like `export`, rendering keys and values with the given functions
    pub fn export_with(&self, key_fmt: Render<'_, K>, value_fmt: Render<'_, V>) -> Option<TreeNode> {
        self.root
            .map(|root| self.export_node(root, key_fmt, value_fmt))
    }

    fn export_node(&self, id: NodeId, key_fmt: Render<'_, K>, value_fmt: Render<'_, V>) -> TreeNode {
        match self.arena.get(id) {
            Node::Leaf(leaf) => TreeNode {
                node_id: id.value(),
                is_leaf: true,
                keys: leaf.keys().iter().map(key_fmt).collect(),
                values: leaf.values().iter().map(value_fmt).collect(),
                children: Vec::new(),
            },
            Node::Internal(internal) => TreeNode {
                node_id: id.value(),
                is_leaf: false,
                keys: internal.keys().iter().map(key_fmt).collect(),
                values: Vec::new(),
                children: internal
                    .children()
                    .iter()
                    .map(|&child| self.export_node(child, key_fmt, value_fmt))
                    .collect(),
            },
        }
    }

    /// Get statistics about the tree
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            len: self.len,
            height: self.height(),
            branching_factor: self.config.branching_factor,
            max_keys: self.config.max_keys(),
            ..TreeStats::default()
        };

        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = self.arena.get(id);
            stats.node_count += 1;
            if Some(id) != self.root && node.is_underflow() {
                stats.underflow_nodes += 1;
            }
            match node {
                Node::Leaf(_) => stats.leaf_count += 1,
                Node::Internal(internal) => {
                    stats.internal_count += 1;
                    stack.extend_from_slice(internal.children());
                }
            }
        }
        stats
    }
}

impl<K: Ord, V> BPlusTree<K, V> {
    /// Debug search - traces the path through the tree
    pub fn debug_get(&self, key: &K) -> Vec<String>
    where
        K: fmt::Debug,
    {
        self.debug_get_with(key, &|k| format!("{:?}", k))
    }

    /// Like `debug_get`, rendering keys with the given function
    pub fn debug_get_with(&self, key: &K, key_fmt: Render<'_, K>) -> Vec<String> {
        let mut trace = Vec::new();
        let Some(root) = self.root else {
            trace.push("Tree is empty (no root)".to_string());
            return trace;
        };

        trace.push(format!("Searching for key: {}", key_fmt(key)));
        trace.push(format!("Root node: {}, Height: {}", root, self.height()));

        let mut current = root;
        loop {
            let node = self.arena.get(current);
            trace.push(format!(
                "  Node {}: is_leaf={}, key_count={}",
                current,
                node.is_leaf(),
                node.key_count()
            ));

            match node {
                Node::Leaf(leaf) => {
                    for (i, k) in leaf.keys().iter().enumerate() {
                        trace.push(format!("    Key {}: key={}", i, key_fmt(k)));
                    }
                    match leaf.search(key) {
                        Ok(index) => trace.push(format!("  FOUND at index {}", index)),
                        Err(_) => trace.push("  NOT FOUND in leaf".to_string()),
                    }
                    return trace;
                }
                Node::Internal(internal) => {
                    trace.push(format!("    child 0={} (keys < first sep)", internal.child(0)));
                    for (i, k) in internal.keys().iter().enumerate() {
                        trace.push(format!(
                            "    Key {}: sep={}, child={} (keys >= sep)",
                            i,
                            key_fmt(k),
                            internal.child(i + 1)
                        ));
                    }
                    current = internal.find_child(key);
                    trace.push(format!("  -> Descending to child node {}", current));
                }
            }
        }
    }

    /// Check every structural invariant of the tree
    ///
    /// Verifies key order and separator bounds, node capacity and minimum
    /// occupancy, uniform leaf depth, the leaf chain, the entry count and
    /// that no arena slot leaked.
    pub fn validate(&self) -> Result<()> {
        let Some(root) = self.root else {
            if self.len != 0 {
                return Err(TreeError::corruption(format!("empty tree reports {} entries", self.len)));
            }
            if self.arena.live_count() != 0 {
                return Err(TreeError::corruption(format!(
                    "empty tree holds {} live nodes",
                    self.arena.live_count()
                )));
            }
            return Ok(());
        };

        let mut walk = Walk::default();
        self.validate_node(root, None, None, 1, &mut walk)?;

        if walk.entries != self.len {
            return Err(TreeError::corruption(format!(
                "tree reports {} entries but leaves hold {}",
                self.len, walk.entries
            )));
        }
        if walk.nodes != self.arena.live_count() {
            return Err(TreeError::corruption(format!(
                "{} nodes reachable but {} live in the arena",
                walk.nodes,
                self.arena.live_count()
            )));
        }

        // The chain must visit the leaves in tree order and then stop
        let mut current = walk.leaves.first().copied();
        for (position, &expected) in walk.leaves.iter().enumerate() {
            if current != Some(expected) {
                return Err(TreeError::corruption(format!(
                    "leaf chain position {} is {:?}, expected {}",
                    position, current, expected
                )));
            }
            current = self.arena.leaf(expected).next();
        }
        if let Some(extra) = current {
            return Err(TreeError::corruption(format!("leaf chain continues past last leaf to {}", extra)));
        }

        Ok(())
    }

    fn validate_node(
        &self,
        id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        walk: &mut Walk,
    ) -> Result<()> {
        let node = self
            .arena
            .try_get(id)
            .ok_or_else(|| TreeError::corruption(format!("node {} is referenced after release", id)))?;

        walk.nodes += 1;
        if walk.nodes > self.arena.live_count() {
            return Err(TreeError::corruption("tree structure contains a cycle"));
        }

        let is_root = Some(id) == self.root;
        let keys = node.keys();

        if node.max_keys() != self.config.max_keys() {
            return Err(TreeError::corruption(format!(
                "node {} has capacity {}, tree uses {}",
                id,
                node.max_keys(),
                self.config.max_keys()
            )));
        }
        if keys.len() > node.max_keys() {
            return Err(TreeError::corruption(format!(
                "node {} holds {} keys, capacity is {}",
                id,
                keys.len(),
                node.max_keys()
            )));
        }
        if !is_root && node.needs_rebalance() {
            return Err(TreeError::corruption(format!(
                "node {} holds {} keys, below minimum occupancy",
                id,
                keys.len()
            )));
        }
        if is_root && keys.is_empty() {
            return Err(TreeError::corruption(format!("root {} has no keys", id)));
        }
        if !keys.windows(2).all(|w| w[0] < w[1]) {
            return Err(TreeError::corruption(format!("keys of node {} are not strictly sorted", id)));
        }

        let in_bounds = |k: &K| lower.map_or(true, |l| l <= k) && upper.map_or(true, |u| k < u);
        if !keys.iter().all(in_bounds) {
            return Err(TreeError::corruption(format!(
                "node {} holds a key outside its separator range",
                id
            )));
        }

        match node {
            Node::Leaf(leaf) => {
                if leaf.values().len() != keys.len() {
                    return Err(TreeError::corruption(format!(
                        "leaf {} has {} keys but {} values",
                        id,
                        keys.len(),
                        leaf.values().len()
                    )));
                }
                match walk.leaf_depth {
                    None => walk.leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(TreeError::corruption(format!(
                            "leaf {} at depth {}, other leaves at depth {}",
                            id, depth, expected
                        )));
                    }
                    Some(_) => {}
                }
                walk.entries += keys.len();
                walk.leaves.push(id);
            }
            Node::Internal(internal) => {
                let children = internal.children();
                if children.len() != keys.len() + 1 {
                    return Err(TreeError::corruption(format!(
                        "internal node {} has {} keys but {} children",
                        id,
                        keys.len(),
                        children.len()
                    )));
                }
                for (i, &child) in children.iter().enumerate() {
                    let child_lower = if i == 0 { lower } else { keys.get(i - 1) };
                    let child_upper = if i == keys.len() { upper } else { keys.get(i) };
                    self.validate_node(child, child_lower, child_upper, depth + 1, walk)?;
                }
            }
        }
        Ok(())
    }
}

/// State gathered while validating
#[derive(Default)]
struct Walk {
    nodes: usize,
    entries: usize,
    leaf_depth: Option<usize>,
    leaves: Vec<NodeId>,
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Display for BPlusTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print_tree(f)
    }
}
