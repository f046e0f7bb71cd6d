//! Node arena.
//!
//! All nodes of a tree live in one slot vector and are addressed by
//! [`NodeId`]. Internal nodes own their children only in the sense that
//! releasing a subtree is the tree's job; the leaf chain is just another
//! set of handles and never decides when a slot is freed. Released slots go
//! on a free list and are reused by later allocations.

use crate::node::{InternalNode, LeafNode, Node};
use crate::types::NodeId;

#[derive(Debug, Clone)]
pub(crate) struct NodeArena<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free_list: Vec<NodeId>,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Store a node and return its handle
    pub(crate) fn allocate(&mut self, node: Node<K, V>) -> NodeId {
        if let Some(id) = self.free_list.pop() {
            self.slots[id.index()] = Some(node);
            return id;
        }
        assert!(self.slots.len() < u32::MAX as usize, "node arena exhausted");
        let id = NodeId::new(self.slots.len() as u32);
        self.slots.push(Some(node));
        id
    }

    /// Take a node out of the arena and recycle its slot
    pub(crate) fn release(&mut self, id: NodeId) -> Node<K, V> {
        match self.slots.get_mut(id.index()).and_then(Option::take) {
            Some(node) => {
                self.free_list.push(id);
                node
            }
            None => panic!("node {} released twice", id),
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node<K, V> {
        match self.slots.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("node {} accessed after release", id),
        }
    }

    /// Like `get`, but reports a stale handle instead of panicking
    pub(crate) fn try_get(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("node {} accessed after release", id),
        }
    }

    pub(crate) fn leaf(&self, id: NodeId) -> &LeafNode<K, V> {
        match self.get(id) {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("node {} is not a leaf", id),
        }
    }

    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> &mut LeafNode<K, V> {
        match self.get_mut(id) {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("node {} is not a leaf", id),
        }
    }

    pub(crate) fn internal(&self, id: NodeId) -> &InternalNode<K> {
        match self.get(id) {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("node {} is not an internal node", id),
        }
    }

    pub(crate) fn internal_mut(&mut self, id: NodeId) -> &mut InternalNode<K> {
        match self.get_mut(id) {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("node {} is not an internal node", id),
        }
    }

    /// Number of live nodes
    pub(crate) fn live_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Drop every node and forget all handles
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
    }
}
