//! Merkle computation configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs for root-hash computation.
///
/// None of these change the computed digest; they only decide where work
/// fans out across threads and how long a path may be.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerkleConfig {
    /// Minimum entries under a branch before its children are hashed in parallel.
    pub parallel_threshold: usize,
    /// Minimum accounts with storage writes before storage roots are computed in parallel.
    pub parallel_storage_threshold: usize,
    /// Maximum path length, in nibbles, of any single trie.
    /// 64 is sufficient for 256-bit keys.
    pub max_depth: usize,
}

impl Default for MerkleConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 64,
            parallel_storage_threshold: 4,
            max_depth: 64,
        }
    }
}

impl MerkleConfig {
    /// Everything on the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel_threshold: usize::MAX,
            parallel_storage_threshold: usize::MAX,
            ..Default::default()
        }
    }
}
