//! B+ tree implementation.
//!
//! This module provides an in-memory B+ tree that supports:
//! - Point lookups (search)
//! - Insertions and in-place updates (insert)
//! - Deletions with sibling borrow/merge (remove)
//! - Range scans over the linked leaves (range_query, cursors)

mod arena;
mod cursor;
mod inspect;
mod rebalance;
mod split;
mod tree;

pub use cursor::RangeCursor;
pub use inspect::{TreeNode, TreeStats};
pub use split::SplitOutcome;
pub use tree::BPlusTree;
