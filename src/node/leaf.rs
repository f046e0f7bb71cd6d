//! Leaf node: sorted key/value pairs plus the forward link of the leaf chain.

use crate::types::NodeId;

/// Outcome of inserting into a leaf
#[derive(Debug, PartialEq, Eq)]
pub enum LeafInsert<K, V> {
    /// The key was new and has been placed in sorted position
    Inserted,
    /// The key existed; its value was replaced and the old one is returned
    Updated(V),
    /// The key is new but the leaf is full; the pair is handed back
    Full(K, V),
}

/// A leaf node
///
/// `values[i]` belongs to `keys[i]`. `next` is a non-owning link to the
/// leaf that follows this one in key order.
#[derive(Debug, Clone)]
pub struct LeafNode<K, V> {
    max_keys: usize,
    keys: Vec<K>,
    values: Vec<V>,
    next: Option<NodeId>,
}

impl<K, V> LeafNode<K, V> {
    /// Create an empty leaf holding at most `max_keys` pairs
    pub fn new(max_keys: usize) -> Self {
        Self {
            max_keys,
            keys: Vec::with_capacity(max_keys),
            values: Vec::with_capacity(max_keys),
            next: None,
        }
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn values(&self) -> &[V] {
        &self.values
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

    /// The next leaf in key order
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub fn set_next(&mut self, next: Option<NodeId>) {
        self.next = next;
    }

    pub fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    pub fn last_key(&self) -> Option<&K> {
        self.keys.last()
    }

    /// Key/value pair at `index`
    pub fn entry(&self, index: usize) -> Option<(&K, &V)> {
        Some((self.keys.get(index)?, self.values.get(index)?))
    }

    /// Insert a pair at `index` without checking order or capacity
    pub(crate) fn insert_at(&mut self, index: usize, key: K, value: V) {
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    /// Move the upper half of this leaf into a new sibling.
    ///
    /// The sibling inherits this leaf's `next`; the caller links this leaf
    /// to the sibling once the sibling has a handle.
    pub(crate) fn split_off(&mut self) -> LeafNode<K, V> {
        let mid = (self.max_keys + 1) / 2;
        let keys = self.keys.split_off(mid);
        let values = self.values.split_off(mid);
        LeafNode {
            max_keys: self.max_keys,
            keys,
            values,
            next: self.next,
        }
    }

    pub(crate) fn pop_first(&mut self) -> Option<(K, V)> {
        if self.keys.is_empty() {
            return None;
        }
        Some((self.keys.remove(0), self.values.remove(0)))
    }

    pub(crate) fn pop_last(&mut self) -> Option<(K, V)> {
        match (self.keys.pop(), self.values.pop()) {
            (Some(key), Some(value)) => Some((key, value)),
            _ => None,
        }
    }

    pub(crate) fn push_front(&mut self, key: K, value: V) {
        self.insert_at(0, key, value);
    }

    pub(crate) fn push_back(&mut self, key: K, value: V) {
        self.keys.push(key);
        self.values.push(value);
    }

    /// Append every pair of the right-hand sibling and take over its link
    pub(crate) fn absorb(&mut self, right: LeafNode<K, V>) {
        self.keys.extend(right.keys);
        self.values.extend(right.values);
        self.next = right.next;
    }
}

impl<K: Ord, V> LeafNode<K, V> {
    /// Binary search for `key`
    ///
    /// Returns Ok(index) if the key is present, or Err(index) where it
    /// would be inserted.
    pub fn search(&self, key: &K) -> Result<usize, usize> {
        self.keys.binary_search(key)
    }

    /// Index of the first key >= `key`
    pub fn lower_bound(&self, key: &K) -> usize {
        self.keys.partition_point(|k| k < key)
    }

    /// Find the value associated with a key
    pub fn find_value(&self, key: &K) -> Option<&V> {
        let index = self.search(key).ok()?;
        self.values.get(index)
    }

    /// Insert or update a key/value pair
    pub fn insert_value(&mut self, key: K, value: V) -> LeafInsert<K, V> {
        match self.search(&key) {
            Ok(index) => {
                let old = std::mem::replace(&mut self.values[index], value);
                LeafInsert::Updated(old)
            }
            Err(_) if self.is_full() => LeafInsert::Full(key, value),
            Err(index) => {
                self.insert_at(index, key, value);
                LeafInsert::Inserted
            }
        }
    }

    /// Remove a key, returning its value if it was present
    pub fn remove_value(&mut self, key: &K) -> Option<V> {
        let index = self.search(key).ok()?;
        self.keys.remove(index);
        Some(self.values.remove(index))
    }
}
