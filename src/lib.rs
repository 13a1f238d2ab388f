// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! # bucket-trie: Authenticated Key-Value Tries over a Byte Store
//!
//! This crate implements the Ethereum Merkle Patricia Trie on top of any
//! key-value store that implements [storage::KvStore]. Every node is RLP
//! encoded and, unless its encoding is shorter than 32 bytes, stored under
//! the Keccak-256 hash of that encoding. The hash of the root node commits to
//! the whole key-value set, so two tries holding the same entries always have
//! the same root, no matter in which order the entries were written.
//!
//! ## Trie flavours
//!
//! - [merkle::Merkle] is the base trie. It reads nodes on demand from the
//!   store, writes every node it creates in one batch per operation, and never
//!   deletes nodes, so any earlier root stays readable.
//!
//! - [checkpoint::CheckpointTrie] stages writes in a scratch store after a
//!   checkpoint. Committing the outermost checkpoint flushes the scratch into
//!   the main store, reverting drops it and goes back to the saved root.
//!
//! - [secure::SecureTrie] hashes every key before it reaches the trie, which
//!   keeps paths a fixed 64 nibbles long.
//!
//! - [bucket::BucketTrie] stops growing the trie at a configured depth. Keys
//!   that would land deeper are kept directly in the store under their raw
//!   key and are not covered by the root hash.
//!
//! ## Proofs
//!
//! [merkle::Merkle::create_proof] collects the encoded nodes on the path to a
//! key. [merkle::verify_proof] replays such a proof against a root hash and
//! reports the proven value, or `None` when the proof shows the key is absent.
//!
//! ## Walking
//!
//! [merkle::Merkle::walk] visits every node reachable from a root, fetching
//! nodes on a rayon pool. Fetches are scheduled through
//! [executor::PrioritizedExecutor], deepest path first, which keeps the
//! number of pending nodes small on wide tries.
//!
#![warn(missing_debug_implementations, rust_2018_idioms)]

/// Traits shared by every trie flavour
pub mod api;

/// Depth-bounded trie that keeps deep keys outside the authenticated part
pub mod bucket;

/// Staged writes with commit and revert
pub mod checkpoint;

/// Trie and bucket configuration
pub mod config;

/// Bounded priority scheduling on a rayon pool
pub mod executor;

/// The base trie, its node codec, proofs and walker
pub mod merkle;

/// Nibble paths
pub mod nibbles;

/// Trie keyed by the hash of each key
pub mod secure;

/// Byte stores the tries persist into
pub mod storage;

pub use bucket::BucketTrie;
pub use checkpoint::CheckpointTrie;
pub use config::{BucketConfig, TrieConfig};
pub use merkle::{Merkle, MerkleError, Proof, ProofError, TrieHash, EMPTY_ROOT};
pub use secure::SecureTrie;
pub use storage::{Db, KvStore, MemStore};
