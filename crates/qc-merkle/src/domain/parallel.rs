//! # Parallel Storage Root Computation
//!
//! Storage sub-tries of different accounts share nothing, so their roots
//! are computed independently with rayon.
//!
//! ## Map-Reduce State Commit
//!
//! 1. Group: collect storage keys written in the commit by owning account
//! 2. Scan: read each touched account's visible storage slots
//! 3. Map (parallel): build each account's storage trie and hash it
//! 4. Reduce (sequential): patch `storage_root` into each account record

use super::{
    bytes::without_leading_zeros, rlp, Hash, Key, MerkleError, NibblePath, TrieBuilder,
};
use rayon::prelude::*;

/// Widest storage value, in bytes.
pub const MAX_STORAGE_VALUE_LEN: usize = 32;

/// Visible storage of a single account.
#[derive(Clone, Debug)]
pub struct StorageUpdate {
    pub account: Hash,
    /// `(slot hash, stored value)` for every slot visible in the commit.
    pub slots: Vec<(Hash, Vec<u8>)>,
}

/// Result of a storage root computation.
#[derive(Clone, Debug)]
pub struct StorageRootResult {
    pub account: Hash,
    pub storage_root: Hash,
    /// Slots that ended up in the trie.
    pub live_slots: usize,
    /// Hash-referenced nodes, when the builder records them.
    pub nodes: Vec<(Hash, Vec<u8>)>,
}

/// Storage trie leaf value for a stored slot value.
///
/// `None` when the slot is empty (empty or all-zero bytes), otherwise the
/// RLP string of the value with leading zeros stripped.
pub fn storage_leaf_value(value: &[u8]) -> Result<Option<Vec<u8>>, MerkleError> {
    if value.len() > MAX_STORAGE_VALUE_LEN {
        return Err(MerkleError::malformed(format!(
            "storage value of {} bytes exceeds {MAX_STORAGE_VALUE_LEN}",
            value.len()
        )));
    }
    match without_leading_zeros(value) {
        [0] => Ok(None),
        trimmed => Ok(Some(rlp::encode_bytes(trimmed))),
    }
}

/// Compute storage roots for multiple accounts.
///
/// Runs on the calling thread below `threshold` accounts and with rayon
/// otherwise. Results come back in the order of `updates`.
pub fn compute_storage_roots_parallel(
    updates: Vec<StorageUpdate>,
    builder: &TrieBuilder,
    threshold: usize,
) -> Result<Vec<StorageRootResult>, MerkleError> {
    if updates.len() < threshold {
        updates
            .into_iter()
            .map(|update| compute_single_storage_root(update, builder))
            .collect()
    } else {
        updates
            .into_par_iter()
            .map(|update| compute_single_storage_root(update, builder))
            .collect()
    }
}

/// Compute the storage root for a single account.
fn compute_single_storage_root(
    update: StorageUpdate,
    builder: &TrieBuilder,
) -> Result<StorageRootResult, MerkleError> {
    let mut entries = Vec::with_capacity(update.slots.len());
    for (slot, value) in &update.slots {
        let leaf = storage_leaf_value(value)
            .map_err(|e| e.at_key(Key::storage_cell(update.account, *slot)))?;
        if let Some(leaf) = leaf {
            entries.push((NibblePath::from_key(slot), leaf));
        }
    }

    let live_slots = entries.len();
    let root = builder.build(entries)?;

    Ok(StorageRootResult {
        account: update.account,
        storage_root: root.hash,
        live_slots,
        nodes: root.nodes,
    })
}
