//! Node splitting.
//!
//! Splits happen bottom-up during insert. Each split reports what the
//! parent has to do through [`SplitOutcome`]:
//! - Leaf split: the sibling's first key is promoted and stays in the leaf
//! - Internal split: the middle separator is promoted and leaves both halves

use super::arena::NodeArena;
use crate::node::Node;
use crate::types::NodeId;

/// Result of inserting into a subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome<K> {
    /// The subtree absorbed the insert
    NoSplit,
    /// The subtree root split; `sibling` must be linked to the right of it
    /// under the separator `promoted`
    Split { promoted: K, sibling: NodeId },
}

/// Split the full leaf `id` and insert `(key, value)` into the half whose range covers it.
///
/// The pair goes left iff `key` is not greater than the left half's largest
/// key. The new leaf is spliced into the leaf chain right after `id`.
pub(crate) fn split_leaf<K: Ord + Clone, V>(
    arena: &mut NodeArena<K, V>,
    id: NodeId,
    key: K,
    value: V,
) -> SplitOutcome<K> {
    let mut sibling = arena.leaf_mut(id).split_off();

    let left = arena.leaf_mut(id);
    let goes_left = left.last_key().map_or(false, |last| key <= *last);
    if goes_left {
        let index = left.lower_bound(&key);
        left.insert_at(index, key, value);
    } else {
        let index = sibling.lower_bound(&key);
        sibling.insert_at(index, key, value);
    }

    let promoted = sibling.keys()[0].clone();
    let sibling_id = arena.allocate(Node::Leaf(sibling));
    arena.leaf_mut(id).set_next(Some(sibling_id));

    tracing::debug!(
        target: "bplus_tree::split",
        node = %id,
        sibling = %sibling_id,
        kind = "leaf",
        "split leaf node"
    );

    SplitOutcome::Split {
        promoted,
        sibling: sibling_id,
    }
}

/// Split the full internal node `id` after logically inserting the separator
/// `key` and the new child `child` for the child at `index`.
pub(crate) fn split_internal<K: Ord, V>(
    arena: &mut NodeArena<K, V>,
    id: NodeId,
    index: usize,
    key: K,
    child: NodeId,
) -> SplitOutcome<K> {
    let (promoted, sibling) = arena.internal_mut(id).split_expanded(index, key, child);
    let sibling_id = arena.allocate(Node::Internal(sibling));

    tracing::debug!(
        target: "bplus_tree::split",
        node = %id,
        sibling = %sibling_id,
        kind = "internal",
        "split internal node"
    );

    SplitOutcome::Split {
        promoted,
        sibling: sibling_id,
    }
}
