use super::{
    nibbles::Nibbles,
    rlp::{self, Item},
    Hash, MerkleError, INLINE_THRESHOLD,
};

// =============================================================================
// TRIE NODE: Leaf, Extension, Branch
// =============================================================================

/// Reference from a parent to a child node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeRef {
    /// Child encoding shorter than [`INLINE_THRESHOLD`], embedded verbatim.
    Inline(Vec<u8>),
    /// Keccak256 of the child encoding.
    Hash(Hash),
}

impl NodeRef {
    /// Reference a child by its encoding: embed it when short, hash it otherwise.
    pub fn from_encoded(encoded: &[u8]) -> Self {
        if encoded.len() < INLINE_THRESHOLD {
            NodeRef::Inline(encoded.to_vec())
        } else {
            NodeRef::Hash(rlp::keccak256(encoded))
        }
    }

    fn append_to(&self, out: &mut Vec<u8>) {
        match self {
            NodeRef::Inline(encoded) => out.extend_from_slice(encoded),
            NodeRef::Hash(hash) => rlp::append_bytes(out, hash),
        }
    }

    fn decode(item: &Item<'_>) -> Result<Self, MerkleError> {
        if item.is_list {
            if item.raw.len() >= INLINE_THRESHOLD {
                return Err(MerkleError::malformed(format!(
                    "inline child of {} bytes must be hash-referenced",
                    item.raw.len()
                )));
            }
            return Ok(NodeRef::Inline(item.raw.to_vec()));
        }
        let hash: Hash = item.payload.try_into().map_err(|_| {
            MerkleError::malformed(format!(
                "child reference of {} bytes is neither inline nor a hash",
                item.payload.len()
            ))
        })?;
        Ok(NodeRef::Hash(hash))
    }
}

/// Node of the Merkle Patricia Trie.
///
/// Nodes are built per computation and dropped afterwards; a parent refers
/// to its children through [`NodeRef`] values, never through live pointers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrieNode {
    /// Leaf node: stores remaining key path and the value.
    /// RLP: [hex_prefix_encode(path, true), value]
    Leaf {
        /// Path not yet consumed by ancestors.
        path: Nibbles,
        /// Leaf value (RLP of an account or of a storage value).
        value: Vec<u8>,
    },

    /// Extension node: shared prefix compression over a single child.
    /// RLP: [hex_prefix_encode(path, false), child]
    Extension {
        /// Shared prefix path, never empty.
        path: Nibbles,
        child: NodeRef,
    },

    /// Branch node: 16-way branch for each nibble value.
    /// RLP: \[child\[0\], ..., child\[15\], value\]
    Branch {
        /// 16 child references (None = empty).
        children: Box<[Option<NodeRef>; 16]>,
        /// Value if a key terminates exactly at this branch.
        value: Option<Vec<u8>>,
    },
}

impl TrieNode {
    /// Empty 16-slot child array.
    pub fn empty_children() -> Box<[Option<NodeRef>; 16]> {
        Box::new(std::array::from_fn(|_| None))
    }

    /// Reject shapes that may not appear in a canonical trie.
    pub fn validate(&self) -> Result<(), MerkleError> {
        match self {
            TrieNode::Leaf { .. } => Ok(()),
            TrieNode::Extension { path, .. } => {
                if path.is_empty() {
                    return Err(MerkleError::InvariantViolation(
                        "extension with empty path".into(),
                    ));
                }
                Ok(())
            }
            TrieNode::Branch { children, value } => {
                let occupied =
                    children.iter().filter(|c| c.is_some()).count() + usize::from(value.is_some());
                if occupied < 2 {
                    return Err(MerkleError::InvariantViolation(format!(
                        "branch with {occupied} occupied slot(s)"
                    )));
                }
                Ok(())
            }
        }
    }

    /// RLP-encode this node for hashing.
    pub fn rlp_encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(128);

        match self {
            TrieNode::Leaf { path, value } => {
                rlp::append_bytes(&mut payload, &path.encode_hex_prefix(true));
                rlp::append_bytes(&mut payload, value);
            }

            TrieNode::Extension { path, child } => {
                rlp::append_bytes(&mut payload, &path.encode_hex_prefix(false));
                child.append_to(&mut payload);
            }

            TrieNode::Branch { children, value } => {
                for child in children.iter() {
                    match child {
                        Some(child) => child.append_to(&mut payload),
                        None => payload.push(rlp::EMPTY_STRING),
                    }
                }
                match value {
                    Some(v) => rlp::append_bytes(&mut payload, v),
                    None => payload.push(rlp::EMPTY_STRING),
                }
            }
        }

        rlp::encode_list(&payload)
    }

    /// Validate, then encode.
    pub fn encode_checked(&self) -> Result<Vec<u8>, MerkleError> {
        self.validate()?;
        Ok(self.rlp_encode())
    }

    /// Compute Keccak256 hash of RLP-encoded node.
    pub fn hash(&self) -> Hash {
        rlp::keccak256(&self.rlp_encode())
    }

    /// Parse a canonical node encoding.
    pub fn decode(encoded: &[u8]) -> Result<Self, MerkleError> {
        let items = rlp::decode_exact(encoded)?.list_items()?;

        let node = match items.as_slice() {
            [path, second] => {
                if path.is_list {
                    return Err(MerkleError::malformed("node path must be a byte string"));
                }
                let (path, is_leaf) = Nibbles::decode_hex_prefix(path.payload)?;
                if is_leaf {
                    if second.is_list {
                        return Err(MerkleError::malformed("leaf value must be a byte string"));
                    }
                    TrieNode::Leaf {
                        path,
                        value: second.payload.to_vec(),
                    }
                } else {
                    TrieNode::Extension {
                        path,
                        child: NodeRef::decode(second)?,
                    }
                }
            }

            [slots @ .., value] if slots.len() == 16 => {
                let mut children = Self::empty_children();
                for (slot, item) in children.iter_mut().zip(slots) {
                    if item.raw != [rlp::EMPTY_STRING] {
                        *slot = Some(NodeRef::decode(item)?);
                    }
                }
                if value.is_list {
                    return Err(MerkleError::malformed("branch value must be a byte string"));
                }
                let value = (!value.payload.is_empty()).then(|| value.payload.to_vec());
                TrieNode::Branch { children, value }
            }

            other => {
                return Err(MerkleError::malformed(format!(
                    "node list with {} items",
                    other.len()
                )))
            }
        };

        node.validate()?;
        Ok(node)
    }
}
