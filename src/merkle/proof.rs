// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use super::{DecodeError, Merkle, MerkleError, Node, TrieHash};
use crate::storage::{Db, KvStore, MemStore, StoreOp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProofError {
    #[error("invalid proof: {0}")]
    InvalidProof(#[source] DecodeError),
    #[error("invalid root hash of {len} bytes")]
    InvalidRootHash { len: usize },
    #[error("invalid node {0}")]
    InvalidNode(#[from] MerkleError),
}

/// The encoded nodes on the path from the root to a key, root first.
///
/// Proves presence when the path ends at the key's value and absence when it
/// ends anywhere else.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Proof(pub Vec<Vec<u8>>);

impl Proof {
    pub fn nodes(&self) -> &[Vec<u8>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Vec<u8>>> for Proof {
    fn from(nodes: Vec<Vec<u8>>) -> Self {
        Self(nodes)
    }
}

impl<S: KvStore> Merkle<S> {
    /// Builds a proof for `key`, whether or not the key is present.
    pub fn create_proof(&self, key: &[u8]) -> Result<Proof, MerkleError> {
        let path = self.find_path(key)?;
        Ok(Proof(path.stack.iter().map(Node::encode).collect()))
    }
}

impl Merkle<MemStore> {
    /// An in-memory trie holding just the proof nodes, each under its own
    /// hash. Without an explicit root the first node is taken as the root.
    pub fn from_proof(proof: &Proof, root: Option<TrieHash>) -> Result<Self, ProofError> {
        let mut ops = Vec::with_capacity(proof.len());
        for raw in proof.nodes() {
            Node::decode(raw).map_err(ProofError::InvalidProof)?;
            ops.push(StoreOp::Put {
                key: TrieHash::of(raw).to_vec(),
                value: raw.clone(),
            });
        }

        let root = root.or_else(|| proof.nodes().first().map(|raw| TrieHash::of(raw)));

        let db = Db::new(MemStore::new());
        db.batch(ops).map_err(MerkleError::from)?;

        let merkle = Merkle::new(db);
        if let Some(root) = root {
            merkle.set_root(&root[..])?;
        }
        Ok(merkle)
    }
}

/// Checks `proof` for `key` against `root`.
///
/// Returns the proven value, or `None` when the proof shows the key is absent
/// (or does not lead anywhere under this root).
pub fn verify_proof(root: &[u8], key: &[u8], proof: &Proof) -> Result<Option<Vec<u8>>, ProofError> {
    let root = TrieHash::try_from(root).map_err(|len| ProofError::InvalidRootHash { len })?;
    let merkle = Merkle::from_proof(proof, Some(root))?;
    Ok(merkle.get(key)?)
}
