//! # Trie Builder
//!
//! Recursive-descent construction of a Merkle Patricia Trie from a flat set
//! of `(path, value)` entries.
//!
//! ## Algorithm
//!
//! Entries are sorted by nibble path once. After that every subtree is a
//! contiguous slice, and the node for a slice at `depth` is decided by its
//! first and last entries alone:
//!
//! - one entry: a leaf holding the whole remaining path
//! - first and last share `n > 0` nibbles past `depth`: an extension over
//!   those `n` nibbles, then recurse at `depth + n`
//! - otherwise: a branch; an entry ending at `depth` becomes the branch
//!   value, the rest split into runs by the nibble at `depth`
//!
//! Children are encoded before their parent. Branch children are
//! independent, so large slices fan out with rayon and join at the parent.

use super::{rlp, Hash, MerkleConfig, MerkleError, NibblePath, NodeRef, TrieNode, EMPTY_TRIE_ROOT};
use rayon::prelude::*;

/// Root of a built trie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrieRoot {
    pub hash: Hash,
    /// `(keccak(encoding), encoding)` for every hash-referenced node and the
    /// root. Empty unless recording was enabled.
    pub nodes: Vec<(Hash, Vec<u8>)>,
}

impl TrieRoot {
    fn empty() -> Self {
        Self {
            hash: EMPTY_TRIE_ROOT,
            nodes: Vec::new(),
        }
    }
}

/// Encoded subtree plus the hashed nodes below it.
struct Subtrie {
    encoded: Vec<u8>,
    nodes: Vec<(Hash, Vec<u8>)>,
}

/// Builds tries and computes their roots.
#[derive(Clone, Debug)]
pub struct TrieBuilder {
    parallel_threshold: usize,
    max_depth: usize,
    record_nodes: bool,
}

impl TrieBuilder {
    pub fn new(config: &MerkleConfig) -> Self {
        Self {
            parallel_threshold: config.parallel_threshold,
            max_depth: config.max_depth,
            record_nodes: false,
        }
    }

    /// Keep the encodings of hash-referenced nodes in [`TrieRoot::nodes`].
    pub fn recording_nodes(mut self, record: bool) -> Self {
        self.record_nodes = record;
        self
    }

    /// Build the trie over `entries` in any order.
    ///
    /// Fails with `TrieDepthExceeded` on a path longer than the configured
    /// depth, and with `InvariantViolation` when two entries share a path.
    pub fn build(&self, mut entries: Vec<(NibblePath<'_>, Vec<u8>)>) -> Result<TrieRoot, MerkleError> {
        if entries.is_empty() {
            return Ok(TrieRoot::empty());
        }

        if let Some(deepest) = entries.iter().map(|(path, _)| path.len()).max() {
            if deepest > self.max_depth {
                return Err(MerkleError::TrieDepthExceeded {
                    max: self.max_depth,
                    attempted: deepest,
                });
            }
        }

        if entries.len() >= self.parallel_threshold {
            entries.par_sort_unstable_by(|a, b| a.0.cmp(&b.0));
        } else {
            entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        }

        if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(MerkleError::InvariantViolation(format!(
                "duplicate trie path {:?}",
                pair[0].0
            )));
        }

        let Subtrie {
            encoded,
            mut nodes,
        } = self.node(&entries, 0)?;

        let hash = rlp::keccak256(&encoded);
        if self.record_nodes {
            nodes.push((hash, encoded));
        }

        Ok(TrieRoot { hash, nodes })
    }

    /// Root hash of the trie over `entries`, without recording nodes.
    pub fn root_hash(&self, entries: Vec<(NibblePath<'_>, Vec<u8>)>) -> Result<Hash, MerkleError> {
        self.clone().recording_nodes(false).build(entries).map(|root| root.hash)
    }

    /// Encode the subtree over a sorted, duplicate-free, non-empty slice.
    fn node(&self, entries: &[(NibblePath<'_>, Vec<u8>)], depth: usize) -> Result<Subtrie, MerkleError> {
        let (first, first_value) = &entries[0];

        if entries.len() == 1 {
            let leaf = TrieNode::Leaf {
                path: first.slice_from(depth).to_nibbles(),
                value: first_value.clone(),
            };
            return Ok(Subtrie {
                encoded: leaf.encode_checked()?,
                nodes: Vec::new(),
            });
        }

        // sorted: the first and last entries bound the prefix shared by all
        let last = &entries[entries.len() - 1].0;
        let shared = first.slice_from(depth).common_prefix_len(&last.slice_from(depth));

        if shared > 0 {
            let (child, nodes) = self.child(entries, depth + shared)?;
            let extension = TrieNode::Extension {
                path: first.slice(depth, shared).to_nibbles(),
                child,
            };
            return Ok(Subtrie {
                encoded: extension.encode_checked()?,
                nodes,
            });
        }

        let (value, rest) = if first.len() == depth {
            (Some(first_value.clone()), &entries[1..])
        } else {
            (None, entries)
        };

        let mut groups = Vec::with_capacity(16);
        let mut start = 0;
        while start < rest.len() {
            let nibble = rest[start].0.nibble_at(depth);
            let run = rest[start..]
                .iter()
                .take_while(|(path, _)| path.nibble_at(depth) == nibble)
                .count();
            groups.push((nibble, &rest[start..start + run]));
            start += run;
        }

        let built = if entries.len() >= self.parallel_threshold {
            groups
                .par_iter()
                .map(|(nibble, group)| self.child(group, depth + 1).map(|child| (*nibble, child)))
                .collect::<Result<Vec<_>, MerkleError>>()?
        } else {
            groups
                .iter()
                .map(|(nibble, group)| self.child(group, depth + 1).map(|child| (*nibble, child)))
                .collect::<Result<Vec<_>, MerkleError>>()?
        };

        let mut children = TrieNode::empty_children();
        let mut nodes = Vec::new();
        for (nibble, (child, below)) in built {
            children[nibble as usize] = Some(child);
            nodes.extend(below);
        }

        let branch = TrieNode::Branch { children, value };
        Ok(Subtrie {
            encoded: branch.encode_checked()?,
            nodes,
        })
    }

    /// Encode a subtree and turn it into a reference for its parent.
    fn child(
        &self,
        entries: &[(NibblePath<'_>, Vec<u8>)],
        depth: usize,
    ) -> Result<(NodeRef, Vec<(Hash, Vec<u8>)>), MerkleError> {
        let Subtrie {
            encoded,
            mut nodes,
        } = self.node(entries, depth)?;

        let reference = NodeRef::from_encoded(&encoded);
        if self.record_nodes {
            if let NodeRef::Hash(hash) = &reference {
                nodes.push((*hash, encoded));
            }
        }
        Ok((reference, nodes))
    }
}
