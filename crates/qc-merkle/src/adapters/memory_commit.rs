use crate::domain::{Key, KeyPrefix, MerkleError};
use crate::ports::{Commit, StateStore};
use super::InMemoryStateStore;
use std::collections::BTreeMap;

/// Pending writes layered over a [`StateStore`].
///
/// An empty pending value marks a deletion: the key reads as absent and
/// drops out of prefix scans, even when the store below still holds it.
pub struct InMemoryCommit<S: StateStore = InMemoryStateStore> {
    pending: BTreeMap<Key, Vec<u8>>,
    prior: S,
}

impl InMemoryCommit {
    /// Commit over empty prior state.
    pub fn new() -> Self {
        Self::over(InMemoryStateStore::new())
    }
}

impl Default for InMemoryCommit {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateStore> InMemoryCommit<S> {
    /// Commit over existing state.
    pub fn over(prior: S) -> Self {
        Self {
            pending: BTreeMap::new(),
            prior,
        }
    }

    /// Copy the pending writes into `store`.
    pub fn flush_into(&self, store: &dyn StateStore) -> Result<(), MerkleError> {
        store.put_batch(self.batch())
    }

    /// Write the pending changes into the prior store and return it.
    pub fn apply(self) -> Result<S, MerkleError> {
        self.prior.put_batch(self.batch())?;
        Ok(self.prior)
    }

    fn batch(&self) -> Vec<(Key, Option<Vec<u8>>)> {
        self.pending
            .iter()
            .map(|(key, value)| (*key, (!value.is_empty()).then(|| value.clone())))
            .collect()
    }
}

impl<S: StateStore> Commit for InMemoryCommit<S> {
    fn written_keys(&self) -> Vec<Key> {
        self.pending.keys().copied().collect()
    }

    fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, MerkleError> {
        match self.pending.get(key) {
            Some(value) if value.is_empty() => Ok(None),
            Some(value) => Ok(Some(value.clone())),
            None => self.prior.get(key),
        }
    }

    fn set(&mut self, key: Key, value: Vec<u8>) -> Result<(), MerkleError> {
        self.pending.insert(key, value);
        Ok(())
    }

    fn iter_prefix(&self, prefix: KeyPrefix) -> Result<Vec<(Key, Vec<u8>)>, MerkleError> {
        let mut visible = BTreeMap::new();

        for key in self.prior.keys_with_prefix(&prefix)? {
            if self.pending.contains_key(&key) {
                continue;
            }
            let value = self
                .prior
                .get(&key)?
                .ok_or(MerkleError::MissingPriorState { key })?;
            visible.insert(key, value);
        }

        for (key, value) in self.pending.range(prefix.range()) {
            if prefix.matches(key) && !value.is_empty() {
                visible.insert(*key, value.clone());
            }
        }

        Ok(visible.into_iter().collect())
    }
}
