//! # Domain Entities
//!
//! Digests, well-known roots and the account record carried at the leaves
//! of the account trie.
//!
//! ## Account record layouts
//!
//! Stored (inside a commit):
//!
//! ```text
//! [balance_len: u8][balance][nonce_len: u8][nonce][code_hash: 32][storage_root: 32]
//! ```
//!
//! Integers are big-endian with leading zeros stripped (zero is the single
//! byte `0x00`). Anything else is rejected as malformed.
//!
//! Hashed (account trie leaf value): `rlp([nonce, balance, storage_root, code_hash])`.

use super::{
    bytes::{is_trimmed, without_leading_zeros},
    rlp, MerkleError,
};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

pub type Hash = [u8; 32];

/// Keccak256 of the empty byte sequence, the code hash of accounts without code.
pub const EMPTY_CODE_HASH: Hash = [
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
];

/// Keccak256 hash of an empty RLP-encoded trie.
/// The root of a trie with no entries.
/// Value: keccak256(RLP("")) = 0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421
pub const EMPTY_TRIE_ROOT: Hash = [
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
];

/// Encodings shorter than this are embedded in their parent instead of hashed.
pub const INLINE_THRESHOLD: usize = 32;

/// Account state stored at the leaves of the account trie.
///
/// ## Fields
///
/// - `balance`: up to 256 bits
/// - `nonce`: transaction count
/// - `code_hash`: hash of contract code, [`EMPTY_CODE_HASH`] for EOAs
/// - `storage_root`: root of the account's storage trie, [`EMPTY_TRIE_ROOT`] if empty
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code_hash: Hash,
    pub storage_root: Hash,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            balance: U256::zero(),
            nonce: 0,
            code_hash: EMPTY_CODE_HASH,
            storage_root: EMPTY_TRIE_ROOT,
        }
    }
}

impl Account {
    /// Largest stored encoding: two length bytes, 32 + 8 integer bytes, two hashes.
    pub const MAX_BYTE_COUNT: usize = 1 + 32 + 1 + 8 + 32 + 32;

    /// Create an account without code or storage.
    pub fn new(balance: impl Into<U256>, nonce: u64) -> Self {
        Self {
            balance: balance.into(),
            nonce,
            ..Default::default()
        }
    }

    /// Builder method to set the code hash.
    pub fn with_code_hash(mut self, code_hash: Hash) -> Self {
        self.code_hash = code_hash;
        self
    }

    /// Builder method to set the storage root.
    pub fn with_storage_root(mut self, storage_root: Hash) -> Self {
        self.storage_root = storage_root;
        self
    }

    /// Encode into the stored layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::MAX_BYTE_COUNT);

        let mut balance = [0u8; 32];
        self.balance.to_big_endian(&mut balance);
        let balance = without_leading_zeros(&balance);
        out.push(balance.len() as u8);
        out.extend_from_slice(balance);

        let nonce = self.nonce.to_be_bytes();
        let nonce = without_leading_zeros(&nonce);
        out.push(nonce.len() as u8);
        out.extend_from_slice(nonce);

        out.extend_from_slice(&self.code_hash);
        out.extend_from_slice(&self.storage_root);
        out
    }

    /// Decode the stored layout, rejecting anything non-canonical.
    pub fn decode(data: &[u8]) -> Result<Self, MerkleError> {
        let mut cursor = Cursor { data, pos: 0 };

        let balance = cursor.integer("balance", 32)?;
        let nonce = cursor.integer("nonce", 8)?;
        let code_hash = cursor.hash("code hash")?;
        let storage_root = cursor.hash("storage root")?;

        if cursor.pos != data.len() {
            return Err(MerkleError::malformed(format!(
                "{} trailing bytes after account record",
                data.len() - cursor.pos
            )));
        }

        Ok(Self {
            balance: U256::from_big_endian(balance),
            nonce: nonce.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64),
            code_hash,
            storage_root,
        })
    }

    /// RLP-encode this account for the trie leaf.
    ///
    /// Encoding order: [nonce, balance, storage_root, code_hash]
    /// This matches Ethereum's account RLP encoding.
    pub fn rlp_encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(Self::MAX_BYTE_COUNT);

        rlp::append_uint(&mut payload, &self.nonce.to_be_bytes());

        let mut balance = [0u8; 32];
        self.balance.to_big_endian(&mut balance);
        rlp::append_uint(&mut payload, &balance);

        rlp::append_bytes(&mut payload, &self.storage_root);
        rlp::append_bytes(&mut payload, &self.code_hash);

        rlp::encode_list(&payload)
    }
}

/// Bounds-checked reader over a stored account record.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8], MerkleError> {
        let end = self.pos + len;
        if end > self.data.len() {
            return Err(MerkleError::malformed(format!(
                "account record truncated in {field}"
            )));
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn integer(&mut self, field: &str, max_len: usize) -> Result<&'a [u8], MerkleError> {
        let len = self.take(1, field)?[0] as usize;
        if len == 0 || len > max_len {
            return Err(MerkleError::malformed(format!(
                "{field} length {len} outside 1..={max_len}"
            )));
        }
        let bytes = self.take(len, field)?;
        if !is_trimmed(bytes) {
            return Err(MerkleError::malformed(format!("{field} has leading zero bytes")));
        }
        Ok(bytes)
    }

    fn hash(&mut self, field: &str) -> Result<Hash, MerkleError> {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(self.take(32, field)?);
        Ok(hash)
    }
}
