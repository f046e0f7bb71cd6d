//! Delete repair.
//!
//! After a delete leaves a child below minimum occupancy its parent fixes
//! it, preferring to borrow one key from a sibling that can spare it and
//! merging with a sibling otherwise:
//! 1. Borrow from the left sibling
//! 2. Borrow from the right sibling
//! 3. Merge into the left sibling, or merge the right sibling in
//!
//! A merge removes one separator from the parent, which may in turn leave
//! the parent short; the caller one level up handles that on the way out of
//! the recursion.

use super::arena::NodeArena;
use crate::node::Node;
use crate::types::NodeId;

/// Repair the child at `index` of internal node `parent`
pub(crate) fn repair_child<K: Ord + Clone, V>(arena: &mut NodeArena<K, V>, parent: NodeId, index: usize) {
    let (child, left, right) = {
        let node = arena.internal(parent);
        let left = index.checked_sub(1).map(|i| node.child(i));
        let right = (index < node.key_count()).then(|| node.child(index + 1));
        (node.child(index), left, right)
    };

    if let Some(left) = left {
        if arena.get(left).can_lend() {
            borrow_from_left(arena, parent, index, left, child);
            return;
        }
    }

    if let Some(right) = right {
        if arena.get(right).can_lend() {
            borrow_from_right(arena, parent, index, child, right);
            return;
        }
    }

    match (left, right) {
        (Some(left), _) => merge(arena, parent, index - 1, left, child),
        (None, Some(right)) => merge(arena, parent, index, child, right),
        (None, None) => {}
    }
}

/// Move the last entry of `left` to the front of `child`
fn borrow_from_left<K: Ord + Clone, V>(
    arena: &mut NodeArena<K, V>,
    parent: NodeId,
    index: usize,
    left: NodeId,
    child: NodeId,
) {
    if arena.get(child).is_leaf() {
        let Some((key, value)) = arena.leaf_mut(left).pop_last() else {
            return;
        };
        let separator = key.clone();
        arena.leaf_mut(child).push_front(key, value);
        arena.internal_mut(parent).replace_key(index - 1, separator);
    } else {
        let Some((key, grandchild)) = arena.internal_mut(left).pop_last() else {
            return;
        };
        let separator = arena.internal_mut(parent).replace_key(index - 1, key);
        arena.internal_mut(child).push_front(separator, grandchild);
    }

    tracing::debug!(
        target: "bplus_tree::rebalance",
        node = %child,
        sibling = %left,
        "borrowed from left sibling"
    );
}

/// Move the first entry of `right` to the back of `child`
fn borrow_from_right<K: Ord + Clone, V>(
    arena: &mut NodeArena<K, V>,
    parent: NodeId,
    index: usize,
    child: NodeId,
    right: NodeId,
) {
    if arena.get(child).is_leaf() {
        let Some((key, value)) = arena.leaf_mut(right).pop_first() else {
            return;
        };
        arena.leaf_mut(child).push_back(key, value);
        if let Some(separator) = arena.leaf(right).first_key().cloned() {
            arena.internal_mut(parent).replace_key(index, separator);
        }
    } else {
        let Some((key, grandchild)) = arena.internal_mut(right).pop_first() else {
            return;
        };
        let separator = arena.internal_mut(parent).replace_key(index, key);
        arena.internal_mut(child).push_back(separator, grandchild);
    }

    tracing::debug!(
        target: "bplus_tree::rebalance",
        node = %child,
        sibling = %right,
        "borrowed from right sibling"
    );
}

/// Fold `right` into `left`; they sit either side of separator `separator_index`
fn merge<K: Ord, V>(
    arena: &mut NodeArena<K, V>,
    parent: NodeId,
    separator_index: usize,
    left: NodeId,
    right: NodeId,
) {
    let (separator, removed) = arena.internal_mut(parent).remove_child(separator_index);
    debug_assert_eq!(removed, right);

    match (arena.release(right), arena.get_mut(left)) {
        (Node::Leaf(right_leaf), Node::Leaf(left_leaf)) => left_leaf.absorb(right_leaf),
        (Node::Internal(right_node), Node::Internal(left_node)) => {
            left_node.absorb(separator, right_node)
        }
        _ => unreachable!("siblings {} and {} sit at different heights", left, right),
    }

    tracing::debug!(
        target: "bplus_tree::rebalance",
        node = %left,
        released = %right,
        "merged siblings"
    );
}
