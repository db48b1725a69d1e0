//! # Root Hash Computation
//!
//! [`ComputeMerkleBehavior`] turns a commit into the state root in two
//! strictly ordered passes:
//!
//! 1. **Storage pass**: every account with storage keys in the write-set
//!    gets its storage trie rebuilt from the visible slots, and the new
//!    root is patched into its record. Accounts without storage writes keep
//!    their stored `storage_root`.
//! 2. **Account pass**: every visible account record becomes a leaf
//!    `rlp([nonce, balance, storage_root, code_hash])` at its 64-nibble
//!    path, and the account trie is built over them.
//!
//! The account pass reads records only after the storage pass has written
//! all of them back.

use super::{
    parallel::{compute_storage_roots_parallel, storage_leaf_value, StorageUpdate},
    Account, Hash, Key, KeyPrefix, MerkleConfig, MerkleError, NibblePath, TrieBuilder, TrieRoot,
    EMPTY_TRIE_ROOT,
};
use crate::ports::{Commit, NodeStore};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, trace, warn};

/// Computes the state root of a commit.
pub struct ComputeMerkleBehavior {
    config: MerkleConfig,
    root_hash: Hash,
    node_store: Option<Arc<dyn NodeStore>>,
}

impl ComputeMerkleBehavior {
    pub fn new(config: MerkleConfig) -> Self {
        Self {
            config,
            root_hash: EMPTY_TRIE_ROOT,
            node_store: None,
        }
    }

    /// Write every hash-referenced node of each computation to `store`.
    pub fn with_node_store(mut self, store: Arc<dyn NodeStore>) -> Self {
        self.node_store = Some(store);
        self
    }

    /// Root of the last successful computation, or the empty root.
    pub fn root_hash(&self) -> Hash {
        self.root_hash
    }

    /// Compute the root of `commit`, patching storage roots into its
    /// account records on the way.
    ///
    /// On error the exposed root keeps its previous value.
    #[instrument(skip(self, commit))]
    pub fn before_commit<C: Commit + ?Sized>(&mut self, commit: &mut C) -> Result<Hash, MerkleError> {
        let start = Instant::now();
        let builder = TrieBuilder::new(&self.config).recording_nodes(self.node_store.is_some());

        let mut nodes = self.storage_pass(commit, &builder)?;
        let root = self.account_pass(commit, &builder)?;
        nodes.extend(root.nodes);

        if let Some(store) = &self.node_store {
            let emitted = nodes.len();
            store.batch_put(nodes)?;
            trace!(emitted, "[qc-merkle] Trie nodes written to node store");
        }

        self.root_hash = root.hash;
        let elapsed_us = start.elapsed().as_micros() as u64;
        debug!(
            root = %hex::encode(root.hash),
            elapsed_us,
            "[qc-merkle] State root computed"
        );
        Ok(root.hash)
    }

    /// Rebuild the storage tries touched by the commit and patch their roots
    /// into the owning account records. Returns the recorded storage nodes.
    fn storage_pass<C: Commit + ?Sized>(
        &self,
        commit: &mut C,
        builder: &TrieBuilder,
    ) -> Result<Vec<(Hash, Vec<u8>)>, MerkleError> {
        let mut touched: BTreeMap<Hash, Vec<Key>> = BTreeMap::new();
        for key in commit.written_keys() {
            if !key.is_account() {
                touched.entry(key.account_hash()).or_default().push(key);
            }
        }

        if touched.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = Vec::with_capacity(touched.len());
        let mut updates = Vec::with_capacity(touched.len());

        for (account, written) in touched {
            let key = Key::account(account);
            let Some(raw) = commit.get(&key)? else {
                // Absent account: only this commit's slot writes count.
                // Slots left in prior state are orphaned.
                for slot_key in &written {
                    if let Some(value) = commit.get(slot_key)? {
                        let live = storage_leaf_value(&value).map_err(|e| e.at_key(*slot_key))?;
                        if live.is_some() {
                            return Err(MerkleError::MissingPriorState { key });
                        }
                    }
                }
                warn!(
                    account = %hex::encode(account),
                    "[qc-merkle] Storage written for absent account holds no live slot, skipping"
                );
                continue;
            };

            let record = Account::decode(&raw).map_err(|e| e.at_key(key))?;
            let slots: Vec<(Hash, Vec<u8>)> = commit
                .iter_prefix(KeyPrefix::StorageOf(account))?
                .into_iter()
                .filter_map(|(slot_key, value)| slot_key.slot_hash().map(|slot| (slot, value)))
                .collect();
            records.push((key, record));
            updates.push(StorageUpdate { account, slots });
        }

        debug!(
            accounts = updates.len(),
            "[qc-merkle] Computing storage roots"
        );

        let results =
            compute_storage_roots_parallel(updates, builder, self.config.parallel_storage_threshold)?;

        let mut nodes = Vec::new();
        for ((key, mut record), result) in records.into_iter().zip(results) {
            trace!(
                account = %hex::encode(result.account),
                live_slots = result.live_slots,
                storage_root = %hex::encode(result.storage_root),
                "[qc-merkle] Storage root"
            );
            if record.storage_root != result.storage_root {
                record.storage_root = result.storage_root;
                commit.set(key, record.encode())?;
            }
            nodes.extend(result.nodes);
        }

        Ok(nodes)
    }

    /// Build the account trie over every visible account record.
    fn account_pass<C: Commit + ?Sized>(
        &self,
        commit: &C,
        builder: &TrieBuilder,
    ) -> Result<TrieRoot, MerkleError> {
        let accounts = commit.iter_prefix(KeyPrefix::Accounts)?;
        debug!(
            accounts = accounts.len(),
            "[qc-merkle] Building account trie"
        );

        let leaves = if accounts.len() >= self.config.parallel_threshold {
            accounts
                .par_iter()
                .map(account_leaf)
                .collect::<Result<Vec<_>, MerkleError>>()?
        } else {
            accounts
                .iter()
                .map(account_leaf)
                .collect::<Result<Vec<_>, MerkleError>>()?
        };

        builder.build(leaves)
    }
}

/// Account trie entry for a stored account record.
fn account_leaf((key, raw): &(Key, Vec<u8>)) -> Result<(NibblePath<'_>, Vec<u8>), MerkleError> {
    let account = Account::decode(raw).map_err(|e| e.at_key(*key))?;
    Ok((key.path(), account.rlp_encode()))
}

impl Default for ComputeMerkleBehavior {
    fn default() -> Self {
        Self::new(MerkleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryCommit, InMemoryNodeStore};
    use crate::domain::{rlp, TrieNode};
    use crate::ports::{Commit, NodeStore};

    fn put_account(commit: &mut InMemoryCommit, id: u8, account: &Account) {
        commit.set(Key::account([id; 32]), account.encode()).unwrap();
    }

    #[test]
    fn test_empty_commit_yields_empty_root() {
        let mut behavior = ComputeMerkleBehavior::default();
        let mut commit = InMemoryCommit::new();
        assert_eq!(behavior.before_commit(&mut commit).unwrap(), EMPTY_TRIE_ROOT);
        assert_eq!(behavior.root_hash(), EMPTY_TRIE_ROOT);
    }

    #[test]
    fn test_single_account_is_hashed_leaf() {
        let account = Account::new(1_000u64, 3);
        let mut commit = InMemoryCommit::new();
        put_account(&mut commit, 0x42, &account);

        let root = ComputeMerkleBehavior::default()
            .before_commit(&mut commit)
            .unwrap();

        let leaf = TrieNode::Leaf {
            path: Key::account([0x42; 32]).path().to_nibbles(),
            value: account.rlp_encode(),
        };
        assert_eq!(root, rlp::keccak256(&leaf.rlp_encode()));
    }

    #[test]
    fn test_storage_root_patched_into_record() {
        let mut commit = InMemoryCommit::new();
        put_account(&mut commit, 1, &Account::new(5u64, 0));
        commit
            .set(Key::storage_cell([1; 32], [2; 32]), vec![0x01])
            .unwrap();

        ComputeMerkleBehavior::default()
            .before_commit(&mut commit)
            .unwrap();

        let stored = commit.get(&Key::account([1; 32])).unwrap().unwrap();
        let record = Account::decode(&stored).unwrap();
        assert_ne!(record.storage_root, EMPTY_TRIE_ROOT);
    }

    #[test]
    fn test_missing_account_with_live_storage() {
        let mut behavior = ComputeMerkleBehavior::default();
        let mut commit = InMemoryCommit::new();
        commit
            .set(Key::storage_cell([7; 32], [1; 32]), vec![0x09])
            .unwrap();

        assert_eq!(
            behavior.before_commit(&mut commit),
            Err(MerkleError::MissingPriorState {
                key: Key::account([7; 32])
            })
        );
        assert_eq!(behavior.root_hash(), EMPTY_TRIE_ROOT);
    }

    #[test]
    fn test_missing_account_with_cleared_storage_is_skipped() {
        let mut commit = InMemoryCommit::new();
        commit
            .set(Key::storage_cell([7; 32], [1; 32]), vec![0; 32])
            .unwrap();

        let root = ComputeMerkleBehavior::default()
            .before_commit(&mut commit)
            .unwrap();
        assert_eq!(root, EMPTY_TRIE_ROOT);
    }

    #[test]
    fn test_error_keeps_previous_root() {
        let mut behavior = ComputeMerkleBehavior::default();
        let mut good = InMemoryCommit::new();
        put_account(&mut good, 1, &Account::new(1u64, 1));
        let root = behavior.before_commit(&mut good).unwrap();

        let mut bad = InMemoryCommit::new();
        bad.set(Key::account([2; 32]), vec![0xFF; 3]).unwrap();
        let err = behavior.before_commit(&mut bad).unwrap_err();

        assert!(matches!(
            err,
            MerkleError::MalformedValue { key: Some(key), .. } if key == Key::account([2; 32])
        ));
        assert_eq!(behavior.root_hash(), root);
    }

    #[test]
    fn test_nodes_emitted_to_store() {
        let store = Arc::new(InMemoryNodeStore::new());
        let mut behavior = ComputeMerkleBehavior::default().with_node_store(store.clone());

        let mut commit = InMemoryCommit::new();
        for id in 0..20u8 {
            put_account(&mut commit, id.wrapping_mul(13), &Account::new(id as u64, 0));
        }
        commit
            .set(Key::storage_cell([0; 32], [3; 32]), vec![0x33])
            .unwrap();

        let root = behavior.before_commit(&mut commit).unwrap();

        let encoded = store.get_node(&root).unwrap().unwrap();
        assert_eq!(rlp::keccak256(&encoded), root);
        assert!(matches!(
            TrieNode::decode(&encoded).unwrap(),
            TrieNode::Branch { .. }
        ));
        assert!(store.len().unwrap() > 20);
    }
}
