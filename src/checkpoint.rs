// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! A trie whose writes can be staged and later committed or rolled back.
//!
//! The first [CheckpointTrie::checkpoint] switches every write into a
//! [ScratchStore] layered over the main store. Nested checkpoints share that
//! scratch and only remember the root to return to. Committing the outermost
//! checkpoint flushes the scratch into the main store in one batch; reverting
//! it throws the scratch away.

use crate::config::TrieConfig;
use crate::merkle::{Merkle, MerkleError, Proof, TriePath, TrieHash};
use crate::storage::{Db, KvStore, ScratchStore, StoreError, StoreOp};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Routes store traffic to the scratch while one is active, to the main
/// store otherwise.
#[derive(Debug)]
pub struct CheckpointStore<S> {
    main: Db<S>,
    scratch: RwLock<Option<ScratchStore<S>>>,
}

impl<S: KvStore> KvStore for CheckpointStore<S> {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self.scratch.read().as_ref() {
            Some(scratch) => scratch.get(key),
            None => self.main.store().get(key),
        }
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        match self.scratch.read().as_ref() {
            Some(scratch) => scratch.put(key, value),
            None => self.main.put(key, value),
        }
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        match self.scratch.read().as_ref() {
            Some(scratch) => scratch.delete(key),
            None => self.main.delete(key),
        }
    }

    fn batch(&self, ops: Vec<StoreOp>) -> Result<(), StoreError> {
        match self.scratch.read().as_ref() {
            Some(scratch) => scratch.batch(ops),
            None => self.main.batch(ops),
        }
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        match self.scratch.read().as_ref() {
            Some(scratch) => scratch.prefix_scan(prefix),
            None => self.main.prefix_scan(prefix),
        }
    }
}

#[derive(Debug)]
pub struct CheckpointTrie<S> {
    merkle: Merkle<CheckpointStore<S>>,
    // roots to return to, innermost last
    checkpoints: Mutex<Vec<TrieHash>>,
}

impl<S: KvStore> CheckpointTrie<S> {
    pub fn new(db: Db<S>) -> Self {
        Self::with_config(db, TrieConfig::default())
    }

    pub fn with_config(db: Db<S>, config: TrieConfig) -> Self {
        Self::from_parts(db, None, Vec::new(), config)
    }

    pub fn from_root(db: Db<S>, root: &[u8]) -> Result<Self, MerkleError> {
        let trie = Self::new(db);
        trie.set_root(root)?;
        Ok(trie)
    }

    fn from_parts(
        main: Db<S>,
        scratch: Option<ScratchStore<S>>,
        checkpoints: Vec<TrieHash>,
        config: TrieConfig,
    ) -> Self {
        let store = CheckpointStore {
            main,
            scratch: RwLock::new(scratch),
        };
        Self {
            merkle: Merkle::with_config(Db::new(store), config),
            checkpoints: Mutex::new(checkpoints),
        }
    }

    fn store(&self) -> &Arc<CheckpointStore<S>> {
        self.merkle.db().store()
    }

    /// The trie operating through the checkpoint-aware store.
    pub fn merkle(&self) -> &Merkle<CheckpointStore<S>> {
        &self.merkle
    }

    /// The store commits land in.
    pub fn main_db(&self) -> &Db<S> {
        &self.store().main
    }

    pub fn root_hash(&self) -> TrieHash {
        self.merkle.root_hash()
    }

    pub fn set_root(&self, root: &[u8]) -> Result<(), MerkleError> {
        self.merkle.set_root(root)
    }

    pub fn is_empty(&self) -> bool {
        self.merkle.is_empty()
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, MerkleError> {
        self.merkle.get(key)
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), MerkleError> {
        self.merkle.put(key, value)
    }

    pub fn delete(&self, key: &[u8]) -> Result<(), MerkleError> {
        self.merkle.delete(key)
    }

    pub fn find_path(&self, key: &[u8]) -> Result<TriePath, MerkleError> {
        self.merkle.find_path(key)
    }

    pub fn create_proof(&self, key: &[u8]) -> Result<Proof, MerkleError> {
        self.merkle.create_proof(key)
    }

    pub fn is_checkpoint(&self) -> bool {
        !self.checkpoints.lock().is_empty()
    }

    pub fn checkpoint_depth(&self) -> usize {
        self.checkpoints.lock().len()
    }

    /// Remembers the current root. The first checkpoint starts staging
    /// writes in a fresh scratch store.
    pub fn checkpoint(&self) {
        let _guard = self.merkle.write_lock();
        let mut checkpoints = self.checkpoints.lock();
        checkpoints.push(self.merkle.root_hash());

        if checkpoints.len() == 1 {
            let store = self.store();
            *store.scratch.write() = Some(ScratchStore::new(store.main.clone()));
            log::debug!("entered checkpoint mode at {}", self.merkle.root_hash());
        }
    }

    /// Keeps the changes since the last checkpoint. Leaving the outermost
    /// checkpoint writes every staged entry to the main store.
    pub fn commit(&self) -> Result<(), MerkleError> {
        let _guard = self.merkle.write_lock();
        let mut checkpoints = self.checkpoints.lock();
        checkpoints.pop().ok_or(MerkleError::NotCheckpointed)?;

        if checkpoints.is_empty() {
            let store = self.store();
            let mut scratch = store.scratch.write();
            if let Some(staged) = scratch.take() {
                let ops = staged.drain();
                log::debug!("committing {} staged entries", ops.len());
                store.main.batch(ops)?;
            }
        }
        Ok(())
    }

    /// Returns to the root of the last checkpoint. Does nothing when there
    /// is no checkpoint.
    pub fn revert(&self) {
        let _guard = self.merkle.write_lock();
        let mut checkpoints = self.checkpoints.lock();
        let Some(root) = checkpoints.pop() else {
            return;
        };
        self.merkle.reset_root(root);

        if checkpoints.is_empty() {
            *self.store().scratch.write() = None;
            log::debug!("reverted to {root}, left checkpoint mode");
        }
    }

    /// A new trie at the same root over the same main store. With
    /// `include_checkpoints` it also takes over the checkpoint stack and
    /// shares the staged entries.
    pub fn copy(&self, include_checkpoints: bool) -> Self {
        let checkpoints = self.checkpoints.lock();
        let store = self.store();

        let (scratch, checkpoints) = if include_checkpoints && !checkpoints.is_empty() {
            let scratch = store.scratch.read().as_ref().map(ScratchStore::copy);
            (scratch, checkpoints.clone())
        } else {
            (None, Vec::new())
        };

        let trie = Self::from_parts(
            store.main.clone(),
            scratch,
            checkpoints,
            self.merkle.config().clone(),
        );
        trie.merkle.reset_root(self.merkle.root_hash());
        trie
    }
}

crate::api::forward_trie_api!(CheckpointTrie);
