//! Internal node: separator keys routing to child nodes.

use crate::types::NodeId;

/// An internal (routing) node
///
/// Holds `n` separator keys and `n + 1` children. Keys reachable under
/// `children[i]` satisfy `keys[i - 1] <= k < keys[i]`, with the missing
/// bounds at either end open.
#[derive(Debug, Clone)]
pub struct InternalNode<K> {
    max_keys: usize,
    keys: Vec<K>,
    children: Vec<NodeId>,
}

impl<K> InternalNode<K> {
    /// Create a root with two children split by `key`
    pub fn new_root(max_keys: usize, left: NodeId, key: K, right: NodeId) -> Self {
        let mut keys = Vec::with_capacity(max_keys);
        keys.push(key);
        let mut children = Vec::with_capacity(max_keys + 1);
        children.push(left);
        children.push(right);
        Self {
            max_keys,
            keys,
            children,
        }
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    pub fn is_full(&self) -> bool {
        self.keys.len() >= self.max_keys
    }

    /// Child handle at `index` (0 ..= key_count)
    pub fn child(&self, index: usize) -> NodeId {
        self.children[index]
    }

    /// Insert a separator and the child to its right.
    ///
    /// `index` is the position of the child that split; the new sibling
    /// lands directly after it.
    pub fn insert_child(&mut self, index: usize, key: K, child: NodeId) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, child);
    }

    /// Remove the separator at `index` together with the child to its right
    pub fn remove_child(&mut self, index: usize) -> (K, NodeId) {
        let key = self.keys.remove(index);
        let child = self.children.remove(index + 1);
        (key, child)
    }

    /// Replace the separator at `index`, returning the previous one
    pub(crate) fn replace_key(&mut self, index: usize, key: K) -> K {
        std::mem::replace(&mut self.keys[index], key)
    }

    /// Insert a separator and child, then split the overfull node in two.
    ///
    /// The middle key of the expanded arrays is returned for promotion and
    /// appears in neither half. This node keeps keys `[0, mid)` and
    /// children `[0, mid]`; the returned sibling gets the rest.
    pub(crate) fn split_expanded(&mut self, index: usize, key: K, child: NodeId) -> (K, InternalNode<K>) {
        self.insert_child(index, key, child);

        let mid = self.keys.len() / 2;
        let right_keys = self.keys.split_off(mid + 1);
        let right_children = self.children.split_off(mid + 1);
        let promoted = self.keys.remove(mid);

        let sibling = InternalNode {
            max_keys: self.max_keys,
            keys: right_keys,
            children: right_children,
        };
        (promoted, sibling)
    }

    /// Detach the first separator and the first child
    pub(crate) fn pop_first(&mut self) -> Option<(K, NodeId)> {
        if self.keys.is_empty() {
            return None;
        }
        Some((self.keys.remove(0), self.children.remove(0)))
    }

    /// Detach the last separator and the last child
    pub(crate) fn pop_last(&mut self) -> Option<(K, NodeId)> {
        let key = self.keys.pop()?;
        let child = self.children.pop()?;
        Some((key, child))
    }

    /// Prepend a child, using `key` as the separator between it and the old first child
    pub(crate) fn push_front(&mut self, key: K, child: NodeId) {
        self.keys.insert(0, key);
        self.children.insert(0, child);
    }

    /// Append a child, using `key` as the separator between the old last child and it
    pub(crate) fn push_back(&mut self, key: K, child: NodeId) {
        self.keys.push(key);
        self.children.push(child);
    }

    /// Merge the right-hand sibling into this node around the pulled-down separator
    pub(crate) fn absorb(&mut self, separator: K, right: InternalNode<K>) {
        self.keys.push(separator);
        self.keys.extend(right.keys);
        self.children.extend(right.children);
    }
}

impl<K: Ord> InternalNode<K> {
    /// Index of the child whose range contains `key`.
    ///
    /// That is the position of the first separator strictly greater than
    /// `key`, so a key equal to a separator routes right.
    pub fn child_index(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k <= key)
    }

    /// Child handle whose range contains `key`
    pub fn find_child(&self, key: &K) -> NodeId {
        self.children[self.child_index(key)]
    }
}
