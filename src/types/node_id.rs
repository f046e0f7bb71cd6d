//! Node handle type.

use std::fmt;

/// Stable handle to a node stored in the tree's arena.
///
/// Internal nodes refer to their children by `NodeId` and every leaf refers
/// to its successor in the leaf chain the same way. A handle is only
/// meaningful for the tree that issued it, and a released handle may be
/// reissued for a later node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a new node ID
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw node ID value
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Slot index of this node in the arena
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_basics() {
        let id = NodeId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.index(), 42);
        assert_eq!(u32::from(id), 42);
        assert_eq!(NodeId::from(7), NodeId::new(7));
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{}", NodeId::new(42)), "#42");
    }
}
