use super::Key;
use thiserror::Error;

/// Failures of a root-hash computation.
///
/// None of these are retried: the computation is a pure function of the
/// commit, so running it again on the same input fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("Malformed value at {key:?}: {reason}")]
    MalformedValue { key: Option<Key>, reason: String },

    #[error("Trie invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Missing prior state for {key:?}")]
    MissingPriorState { key: Key },

    #[error("Trie depth exceeded: max {max}, attempted {attempted}")]
    TrieDepthExceeded { max: usize, attempted: usize },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Lock poisoned")]
    LockPoisoned,
}

impl MerkleError {
    /// Malformed value not yet attributed to a key.
    pub fn malformed(reason: impl Into<String>) -> Self {
        MerkleError::MalformedValue {
            key: None,
            reason: reason.into(),
        }
    }

    /// Attach the key whose value failed to decode.
    pub fn at_key(self, at: Key) -> Self {
        match self {
            MerkleError::MalformedValue { key: None, reason } => MerkleError::MalformedValue {
                key: Some(at),
                reason,
            },
            other => other,
        }
    }
}
