// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use crate::checkpoint::CheckpointTrie;
use crate::config::TrieConfig;
use crate::merkle::{verify_proof, MerkleError, Proof, ProofError, TrieHash};
use crate::storage::{Db, KvStore};

/// A checkpointable trie that keys every entry by the Keccak-256 hash of the
/// caller's key. Paths are always 64 nibbles, so an adversary cannot grow the
/// trie deep by picking keys.
#[derive(Debug)]
pub struct SecureTrie<S> {
    trie: CheckpointTrie<S>,
}

impl<S: KvStore> SecureTrie<S> {
    pub fn new(db: Db<S>) -> Self {
        Self {
            trie: CheckpointTrie::new(db),
        }
    }

    pub fn with_config(db: Db<S>, config: TrieConfig) -> Self {
        Self {
            trie: CheckpointTrie::with_config(db, config),
        }
    }

    pub fn from_root(db: Db<S>, root: &[u8]) -> Result<Self, MerkleError> {
        Ok(Self {
            trie: CheckpointTrie::from_root(db, root)?,
        })
    }

    /// The underlying trie, addressed by hashed keys.
    pub fn inner(&self) -> &CheckpointTrie<S> {
        &self.trie
    }

    pub fn root_hash(&self) -> TrieHash {
        self.trie.root_hash()
    }

    pub fn set_root(&self, root: &[u8]) -> Result<(), MerkleError> {
        self.trie.set_root(root)
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, MerkleError> {
        self.trie.get(&TrieHash::of(key)[..])
    }

    /// Stores `value` under the hash of `key`. An empty value deletes.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), MerkleError> {
        if value.is_empty() {
            return self.delete(key);
        }
        self.trie.put(&TrieHash::of(key)[..], value)
    }

    pub fn delete(&self, key: &[u8]) -> Result<(), MerkleError> {
        self.trie.delete(&TrieHash::of(key)[..])
    }

    pub fn checkpoint(&self) {
        self.trie.checkpoint()
    }

    pub fn commit(&self) -> Result<(), MerkleError> {
        self.trie.commit()
    }

    pub fn revert(&self) {
        self.trie.revert()
    }

    pub fn is_checkpoint(&self) -> bool {
        self.trie.is_checkpoint()
    }

    pub fn copy(&self, include_checkpoints: bool) -> Self {
        Self {
            trie: self.trie.copy(include_checkpoints),
        }
    }

    pub fn create_proof(&self, key: &[u8]) -> Result<Proof, MerkleError> {
        self.trie.create_proof(&TrieHash::of(key)[..])
    }

    /// Checks a proof made by [SecureTrie::create_proof] for the unhashed `key`.
    pub fn verify_proof(
        root: &[u8],
        key: &[u8],
        proof: &Proof,
    ) -> Result<Option<Vec<u8>>, ProofError> {
        verify_proof(root, &TrieHash::of(key)[..], proof)
    }
}

crate::api::forward_trie_api!(SecureTrie);
