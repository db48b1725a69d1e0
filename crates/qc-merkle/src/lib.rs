//! # qc-merkle
//!
//! Merkle Patricia Trie root computation for Quantum-Chain state.
//!
//! ## Role in System
//!
//! - **Root commitment**: turns a commit's write-set into the 32-byte state root
//! - **Storage nesting**: per-account storage tries roll up into account records
//! - **Canonical encoding**: RLP nodes with hex-prefix paths, small nodes inlined
//!
//! ## Flow
//!
//! ```text
//! Commit write-set
//!     │
//!     ├── storage keys ──→ group by account ──→ storage tries (rayon)
//!     │                                              │
//!     │                         storage_root patched into account records
//!     │                                              │
//!     └── account records ──────────────────────────→ account trie ──→ root
//! ```
//!
//! ## Example
//!
//! ```
//! use qc_merkle::{Account, Commit, ComputeMerkleBehavior, InMemoryCommit, Key, EMPTY_TRIE_ROOT};
//!
//! let mut commit = InMemoryCommit::new();
//! commit.set(Key::account([0x11; 32]), Account::new(100u64, 1).encode()).unwrap();
//!
//! let mut merkle = ComputeMerkleBehavior::default();
//! let root = merkle.before_commit(&mut commit).unwrap();
//! assert_ne!(root, EMPTY_TRIE_ROOT);
//! assert_eq!(merkle.root_hash(), root);
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
