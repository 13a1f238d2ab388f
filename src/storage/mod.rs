// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! The byte store a trie persists its nodes into.
//!
//! The trie only ever needs an opaque key/value store: nodes are written under
//! their own hash, and the bucket variant writes flat entries under the
//! original key. [`KvStore`] is that contract, [`Db`] is the thin wrapper the
//! tries hold (it turns a backend's "not found" into `Ok(None)` and is cheap to
//! copy), and [`MemStore`] is the in-memory implementation used for proofs and
//! tests.

use metrics::counter;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

pub mod scratch;

pub use scratch::ScratchStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend reported a missing key. [`Db`] never surfaces this.
    #[error("key not found")]
    NotFound,
    #[error("operation not supported by this store: {0}")]
    Unsupported(&'static str),
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A single write in a [`KvStore::batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl StoreOp {
    pub fn key(&self) -> &[u8] {
        match self {
            StoreOp::Put { key, .. } | StoreOp::Delete { key } => key,
        }
    }
}

/// The storage contract required by the tries.
///
/// Implementations may report a missing key either as `Err(StoreError::NotFound)`
/// (the leveldb convention) or any other way they like through `Backend`;
/// the trie only talks to a store through [`Db`], which normalizes the former.
pub trait KvStore: Debug + Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Applies every operation in order. Implementations must make the batch
    /// visible all at once.
    fn batch(&self, ops: Vec<StoreOp>) -> Result<(), StoreError>;

    /// Returns every entry whose key starts with `prefix`, in key order.
    fn prefix_scan(&self, _prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Err(StoreError::Unsupported("prefix_scan"))
    }
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn batch(&self, ops: Vec<StoreOp>) -> Result<(), StoreError> {
        (**self).batch(ops)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        (**self).prefix_scan(prefix)
    }
}

/// Shared handle over a [`KvStore`]. Cloning a `Db` copies the handle, never
/// the data: both handles read and write the same backing store.
#[derive(Debug)]
pub struct Db<S> {
    store: Arc<S>,
}

impl<S> Clone for Db<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> From<Arc<S>> for Db<S> {
    fn from(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: KvStore> Db<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Reads a raw value, `Ok(None)` when the key is absent.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.store.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.store.put(key, value)
    }

    pub fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        match self.store.delete(key) {
            Err(StoreError::NotFound) => Ok(()),
            other => other,
        }
    }

    pub fn batch(&self, ops: Vec<StoreOp>) -> Result<(), StoreError> {
        if ops.is_empty() {
            return Ok(());
        }
        self.store.batch(ops)
    }

    pub fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.store.prefix_scan(prefix)
    }

    /// Another handle over the same backing store.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

#[derive(Debug, Default)]
/// An in-memory, ordered implementation of [`KvStore`]
pub struct MemStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.read().contains_key(key)
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        counter!("bucket_trie.store.read", "from" => "memory").increment(1);
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn batch(&self, ops: Vec<StoreOp>) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        for op in ops {
            match op {
                StoreOp::Put { key, value } => {
                    entries.insert(key, value);
                }
                StoreOp::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(self
            .entries
            .read()
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_none() {
        let db = Db::new(MemStore::new());
        assert_eq!(db.get(b"nope").unwrap(), None);
        db.delete(b"nope").unwrap();
    }

    #[test]
    fn copies_share_backing_store() {
        let db = Db::new(MemStore::new());
        let other = db.copy();
        other.put(b"k", b"v").unwrap();
        assert_eq!(db.get(b"k").unwrap().as_deref(), Some(&b"v"[..]));
    }

    #[test]
    fn batch_applies_in_order() {
        let db = Db::new(MemStore::new());
        db.batch(vec![
            StoreOp::Put {
                key: b"a".to_vec(),
                value: b"1".to_vec(),
            },
            StoreOp::Put {
                key: b"b".to_vec(),
                value: b"2".to_vec(),
            },
            StoreOp::Delete { key: b"a".to_vec() },
        ])
        .unwrap();
        assert_eq!(db.get(b"a").unwrap(), None);
        assert_eq!(db.get(b"b").unwrap().as_deref(), Some(&b"2"[..]));
    }

    #[test]
    fn prefix_scan_is_ordered_and_bounded() {
        let store = MemStore::new();
        for key in [&b"ab"[..], b"aa", b"b", b"a", b"ac\xff"] {
            store.put(key, key).unwrap();
        }
        let keys: Vec<_> = store
            .prefix_scan(b"a")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(
            keys,
            vec![b"a".to_vec(), b"aa".to_vec(), b"ab".to_vec(), b"ac\xff".to_vec()]
        );
    }
}
