use crate::domain::{Key, KeyPrefix, MerkleError};

/// Pending writes of one commit plus read access to the state below them.
///
/// Root computation reads through this trait and patches account records
/// back into it. Callers must not mutate the commit while a computation
/// is running.
pub trait Commit {
    /// Keys written in this commit, in key order, deletions included.
    fn written_keys(&self) -> Vec<Key>;

    /// Visible value of `key`: the pending write if any, else prior state.
    fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, MerkleError>;

    /// Write `value` at `key`. An empty value deletes the key.
    fn set(&mut self, key: Key, value: Vec<u8>) -> Result<(), MerkleError>;

    /// Every visible `(key, value)` under `prefix`, in key order.
    /// Deleted keys are left out.
    fn iter_prefix(&self, prefix: KeyPrefix) -> Result<Vec<(Key, Vec<u8>)>, MerkleError>;
}
