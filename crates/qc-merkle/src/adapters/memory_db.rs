use crate::domain::{Hash, Key, KeyPrefix, MerkleError};
use crate::ports::{NodeStore, StateStore};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// In-memory implementation of StateStore for testing
pub struct InMemoryStateStore {
    entries: RwLock<BTreeMap<Key, Vec<u8>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> Result<usize, MerkleError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| MerkleError::LockPoisoned)?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, MerkleError> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for InMemoryStateStore {
    fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, MerkleError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| MerkleError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn keys_with_prefix(&self, prefix: &KeyPrefix) -> Result<Vec<Key>, MerkleError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| MerkleError::LockPoisoned)?;
        Ok(entries
            .range(prefix.range())
            .map(|(key, _)| *key)
            .filter(|key| prefix.matches(key))
            .collect())
    }

    fn put_batch(&self, writes: Vec<(Key, Option<Vec<u8>>)>) -> Result<(), MerkleError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| MerkleError::LockPoisoned)?;
        for (key, value) in writes {
            match value {
                Some(value) => entries.insert(key, value),
                None => entries.remove(&key),
            };
        }
        Ok(())
    }
}

/// In-memory implementation of NodeStore for testing
pub struct InMemoryNodeStore {
    nodes: RwLock<HashMap<Hash, Vec<u8>>>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> Result<usize, MerkleError> {
        let nodes = self
            .nodes
            .read()
            .map_err(|_| MerkleError::LockPoisoned)?;
        Ok(nodes.len())
    }

    pub fn is_empty(&self) -> Result<bool, MerkleError> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore for InMemoryNodeStore {
    fn get_node(&self, hash: &Hash) -> Result<Option<Vec<u8>>, MerkleError> {
        let nodes = self
            .nodes
            .read()
            .map_err(|_| MerkleError::LockPoisoned)?;
        Ok(nodes.get(hash).cloned())
    }

    fn put_node(&self, hash: Hash, encoded: Vec<u8>) -> Result<(), MerkleError> {
        let mut nodes = self
            .nodes
            .write()
            .map_err(|_| MerkleError::LockPoisoned)?;
        nodes.insert(hash, encoded);
        Ok(())
    }

    fn batch_put(&self, batch: Vec<(Hash, Vec<u8>)>) -> Result<(), MerkleError> {
        let mut nodes = self
            .nodes
            .write()
            .map_err(|_| MerkleError::LockPoisoned)?;
        nodes.extend(batch);
        Ok(())
    }
}
