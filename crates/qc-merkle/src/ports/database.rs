use crate::domain::{Hash, Key, KeyPrefix, MerkleError};
use std::sync::Arc;

/// Persisted state below a commit.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, MerkleError>;

    /// Stored keys under `prefix`, in key order.
    fn keys_with_prefix(&self, prefix: &KeyPrefix) -> Result<Vec<Key>, MerkleError>;

    /// Apply writes atomically. `None` removes the key.
    fn put_batch(&self, writes: Vec<(Key, Option<Vec<u8>>)>) -> Result<(), MerkleError>;
}

/// Sink for encoded trie nodes, keyed by their hash.
pub trait NodeStore: Send + Sync {
    fn get_node(&self, hash: &Hash) -> Result<Option<Vec<u8>>, MerkleError>;
    fn put_node(&self, hash: Hash, encoded: Vec<u8>) -> Result<(), MerkleError>;

    fn batch_put(&self, nodes: Vec<(Hash, Vec<u8>)>) -> Result<(), MerkleError> {
        for (hash, encoded) in nodes {
            self.put_node(hash, encoded)?;
        }
        Ok(())
    }
}

impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, MerkleError> {
        (**self).get(key)
    }

    fn keys_with_prefix(&self, prefix: &KeyPrefix) -> Result<Vec<Key>, MerkleError> {
        (**self).keys_with_prefix(prefix)
    }

    fn put_batch(&self, writes: Vec<(Key, Option<Vec<u8>>)>) -> Result<(), MerkleError> {
        (**self).put_batch(writes)
    }
}
