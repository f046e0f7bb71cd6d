//! Common types used throughout the tree.

mod node_id;

pub use node_id::NodeId;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Smallest branching factor a tree accepts; smaller values are raised to it
pub const MIN_BRANCHING_FACTOR: usize = 3;

/// Branching factor used by `TreeConfig::default()`
pub const DEFAULT_BRANCHING_FACTOR: usize = 64;

/// Tree configuration for node capacity
///
/// The branching factor is the maximum number of children of an internal
/// node. Every node the tree creates holds at most `branching_factor - 1`
/// keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConfig {
    /// Maximum number of children per internal node
    pub branching_factor: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            branching_factor: DEFAULT_BRANCHING_FACTOR,
        }
    }
}

impl TreeConfig {
    /// Create a new config, raising undersized branching factors to the minimum
    pub fn new(branching_factor: usize) -> Self {
        Self {
            branching_factor: branching_factor.max(MIN_BRANCHING_FACTOR),
        }
    }

    /// Parse a config from JSON, e.g. `{"branchingFactor": 8}`
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TreeConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Return this config with the branching factor clamped to the minimum
    pub fn normalized(self) -> Self {
        Self::new(self.branching_factor)
    }

    /// Maximum keys per node
    pub fn max_keys(&self) -> usize {
        self.branching_factor.max(MIN_BRANCHING_FACTOR) - 1
    }

    /// Underflow line of a node: `ceil(max_keys / 2)`
    pub fn min_keys(&self) -> usize {
        (self.max_keys() + 1) / 2
    }

    /// Fewest keys a non-root node keeps after a delete
    pub fn min_occupancy(&self) -> usize {
        self.max_keys() / 2
    }
}
