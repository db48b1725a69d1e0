//! # State Keys
//!
//! A key is either an account (hash of the address) or a storage cell
//! (account hash + hash of the slot). Both live in one addressable space:
//! the raw 64 bytes hold the account hash followed by the slot hash, so a
//! storage cell's path is its account's path extended by 64 nibbles.
//!
//! Ordering follows the concatenated nibble path, which places an account
//! immediately before all of its storage cells.

use super::{Hash, NibblePath};
use std::fmt;
use std::ops::RangeInclusive;

/// Nibbles in a 32-byte hash path.
pub const HASH_PATH_LEN: usize = 64;

/// Kind tag of a [`Key`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyKind {
    /// Terminates an account subtree.
    Account,
    /// Lives inside an account's storage subtree.
    StorageCell,
}

/// Identifier of a value in the state.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    // Field order drives the derived ordering: path bytes, then kind.
    raw: [u8; 64],
    kind: KeyKind,
}

impl Key {
    pub fn account(account: Hash) -> Self {
        let mut raw = [0u8; 64];
        raw[..32].copy_from_slice(&account);
        Self {
            raw,
            kind: KeyKind::Account,
        }
    }

    pub fn storage_cell(account: Hash, slot: Hash) -> Self {
        let mut raw = [0u8; 64];
        raw[..32].copy_from_slice(&account);
        raw[32..].copy_from_slice(&slot);
        Self {
            raw,
            kind: KeyKind::StorageCell,
        }
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn is_account(&self) -> bool {
        self.kind == KeyKind::Account
    }

    pub fn account_hash(&self) -> Hash {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&self.raw[..32]);
        hash
    }

    /// Slot hash for storage cells.
    pub fn slot_hash(&self) -> Option<Hash> {
        match self.kind {
            KeyKind::Account => None,
            KeyKind::StorageCell => {
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&self.raw[32..]);
                Some(hash)
            }
        }
    }

    /// Full placement path: 64 nibbles for accounts, 128 for storage cells.
    pub fn path(&self) -> NibblePath<'_> {
        let len = match self.kind {
            KeyKind::Account => HASH_PATH_LEN,
            KeyKind::StorageCell => 2 * HASH_PATH_LEN,
        };
        NibblePath::from_raw(&self.raw, 0, len)
    }

    /// Path of the owning account.
    pub fn account_path(&self) -> NibblePath<'_> {
        NibblePath::from_raw(&self.raw, 0, HASH_PATH_LEN)
    }

    /// Path of the slot inside the account's storage trie.
    pub fn storage_path(&self) -> Option<NibblePath<'_>> {
        match self.kind {
            KeyKind::Account => None,
            KeyKind::StorageCell => Some(NibblePath::from_raw(
                &self.raw,
                HASH_PATH_LEN,
                HASH_PATH_LEN,
            )),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            KeyKind::Account => write!(f, "Account({})", hex::encode(&self.raw[..32])),
            KeyKind::StorageCell => write!(
                f,
                "StorageCell({}, {})",
                hex::encode(&self.raw[..32]),
                hex::encode(&self.raw[32..])
            ),
        }
    }
}

/// Key-space prefix used for ordered scans.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPrefix {
    /// Every account key.
    Accounts,
    /// Every storage cell of one account.
    StorageOf(Hash),
}

impl KeyPrefix {
    pub fn matches(&self, key: &Key) -> bool {
        match self {
            KeyPrefix::Accounts => key.is_account(),
            KeyPrefix::StorageOf(account) => {
                key.kind == KeyKind::StorageCell && key.raw[..32] == account[..]
            }
        }
    }

    /// Inclusive key range covering every match. It may also cover keys that
    /// do not match, so callers filter with [`KeyPrefix::matches`].
    pub fn range(&self) -> RangeInclusive<Key> {
        match self {
            KeyPrefix::Accounts => {
                Key::account([0x00; 32])..=Key::storage_cell([0xFF; 32], [0xFF; 32])
            }
            KeyPrefix::StorageOf(account) => {
                Key::storage_cell(*account, [0x00; 32])..=Key::storage_cell(*account, [0xFF; 32])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_precedes_its_storage() {
        let account = Key::account([0x10; 32]);
        let zero_slot = Key::storage_cell([0x10; 32], [0x00; 32]);
        let high_slot = Key::storage_cell([0x10; 32], [0xFF; 32]);
        let next_account = Key::account([0x11; 32]);

        assert!(account < zero_slot);
        assert!(zero_slot < high_slot);
        assert!(high_slot < next_account);
    }

    #[test]
    fn test_paths_are_concatenated() {
        let mut account = [0u8; 32];
        account[0] = 0xAB;
        let mut slot = [0u8; 32];
        slot[0] = 0xCD;

        let key = Key::storage_cell(account, slot);
        assert_eq!(key.path().len(), 128);
        assert_eq!(key.path().nibble_at(0), 0x0A);
        assert_eq!(key.path().nibble_at(64), 0x0C);
        assert_eq!(key.account_path(), Key::account(account).path());

        let storage = key.storage_path().unwrap();
        assert_eq!(storage.len(), 64);
        assert_eq!(storage.nibble_at(1), 0x0D);
        assert_eq!(storage, NibblePath::from_key(&slot));
    }

    #[test]
    fn test_accessors() {
        let key = Key::storage_cell([1; 32], [2; 32]);
        assert_eq!(key.kind(), KeyKind::StorageCell);
        assert_eq!(key.account_hash(), [1; 32]);
        assert_eq!(key.slot_hash(), Some([2; 32]));

        let key = Key::account([3; 32]);
        assert!(key.is_account());
        assert_eq!(key.slot_hash(), None);
        assert!(key.storage_path().is_none());
    }

    #[test]
    fn test_prefix_matching() {
        let prefix = KeyPrefix::StorageOf([7; 32]);
        assert!(prefix.matches(&Key::storage_cell([7; 32], [1; 32])));
        assert!(!prefix.matches(&Key::storage_cell([8; 32], [1; 32])));
        assert!(!prefix.matches(&Key::account([7; 32])));
        assert!(prefix.range().contains(&Key::storage_cell([7; 32], [9; 32])));

        assert!(KeyPrefix::Accounts.matches(&Key::account([9; 32])));
        assert!(!KeyPrefix::Accounts.matches(&Key::storage_cell([9; 32], [0; 32])));
    }
}
