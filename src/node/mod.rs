//! Node layer: the two node shapes of the B+ tree.
//!
//! A node is either a leaf or an internal node:
//! - Leaves hold the sorted keys, the parallel values, and a forward link to
//!   the next leaf in key order
//! - Internal nodes hold sorted separator keys and one more child handle
//!   than they have keys
//!
//! Nodes never own each other. Children and the leaf chain are [`NodeId`]s
//! into the arena owned by the tree.
//!
//! [`NodeId`]: crate::types::NodeId

mod internal;
mod leaf;

pub use internal::InternalNode;
pub use leaf::{LeafInsert, LeafNode};

/// A B+ tree node
#[derive(Debug, Clone)]
pub enum Node<K, V> {
    /// Leaf node with key/value pairs
    Leaf(LeafNode<K, V>),
    /// Internal node with separators and children
    Internal(InternalNode<K>),
}

impl<K, V> Node<K, V> {
    /// Check if this is a leaf node
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Keys stored in this node
    pub fn keys(&self) -> &[K] {
        match self {
            Node::Leaf(leaf) => leaf.keys(),
            Node::Internal(internal) => internal.keys(),
        }
    }

    /// Number of keys in this node
    pub fn key_count(&self) -> usize {
        self.keys().len()
    }

    /// Capacity of this node
    pub fn max_keys(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.max_keys(),
            Node::Internal(internal) => internal.max_keys(),
        }
    }

    /// Minimum number of keys for a node of this capacity
    pub fn min_keys(&self) -> usize {
        (self.max_keys() + 1) / 2
    }

    /// Check if the node has reached its capacity
    pub fn is_full(&self) -> bool {
        self.key_count() >= self.max_keys()
    }

    /// Check if the node holds fewer than `min_keys()` keys
    ///
    /// A freshly split node can already sit below this line, so the tree
    /// only reports it (see `TreeStats::underflow_nodes`); delete repair
    /// is driven by `needs_rebalance` instead.
    pub fn is_underflow(&self) -> bool {
        self.key_count() < self.min_keys()
    }

    /// Check if a non-root node fell below the occupancy splits guarantee
    pub fn needs_rebalance(&self) -> bool {
        self.key_count() < min_occupancy(self.max_keys())
    }

    /// Check if the node can give one key to a sibling and stay balanced
    pub fn can_lend(&self) -> bool {
        self.key_count() > min_occupancy(self.max_keys())
    }

    /// Get the leaf variant, if this is a leaf
    pub fn as_leaf(&self) -> Option<&LeafNode<K, V>> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Internal(_) => None,
        }
    }

    /// Get the internal variant, if this is an internal node
    pub fn as_internal(&self) -> Option<&InternalNode<K>> {
        match self {
            Node::Leaf(_) => None,
            Node::Internal(internal) => Some(internal),
        }
    }
}

/// Fewest keys a non-root node holds after any split or delete repair.
///
/// Both split flavours leave at least `max_keys / 2` keys on each side, and
/// two siblings at this bound (plus a pulled-down separator) always fit in
/// one node, which is what makes merging safe.
pub fn min_occupancy(max_keys: usize) -> usize {
    max_keys / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    fn leaf_with(keys: &[i32], max_keys: usize) -> Node<i32, i32> {
        let mut leaf = LeafNode::new(max_keys);
        for &k in keys {
            leaf.insert_value(k, k * 10);
        }
        Node::Leaf(leaf)
    }

    #[test]
    fn test_capacity_predicates() {
        let node = leaf_with(&[1, 2, 3], 3);
        assert!(node.is_full());
        assert!(!node.is_underflow());
        assert!(node.can_lend());

        let node = leaf_with(&[1], 3);
        assert!(!node.is_full());
        assert_eq!(node.min_keys(), 2);
        assert!(node.is_underflow());
        assert!(!node.needs_rebalance());
        assert!(!node.can_lend());

        let node = leaf_with(&[], 3);
        assert!(node.needs_rebalance());
    }

    #[test]
    fn test_variant_accessors() {
        let leaf = leaf_with(&[5], 4);
        assert!(leaf.is_leaf());
        assert!(leaf.as_leaf().is_some());
        assert!(leaf.as_internal().is_none());

        let internal: Node<i32, i32> =
            Node::Internal(InternalNode::new_root(4, NodeId::new(0), 10, NodeId::new(1)));
        assert!(!internal.is_leaf());
        assert_eq!(internal.keys(), &[10]);
        assert_eq!(internal.max_keys(), 4);
    }

    #[test]
    fn test_min_occupancy() {
        assert_eq!(min_occupancy(2), 1);
        assert_eq!(min_occupancy(3), 1);
        assert_eq!(min_occupancy(4), 2);
        assert_eq!(min_occupancy(63), 31);
    }
}
