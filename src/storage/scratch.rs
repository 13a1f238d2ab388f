// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use super::{Db, KvStore, StoreError, StoreOp};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// An in-memory write layer over an upstream store.
///
/// Reads check the scratch entries first and fall through to the upstream
/// store on a miss. Writes never reach upstream until [ScratchStore::drain]
/// hands them back as a batch. A delete is kept as a tombstone so the key
/// stays hidden even if upstream still holds it.
pub struct ScratchStore<S> {
    upstream: Db<S>,
    // `None` is a tombstone
    entries: Arc<RwLock<BTreeMap<Vec<u8>, Option<Vec<u8>>>>>,
}

impl<S> Debug for ScratchStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchStore")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

impl<S: KvStore> ScratchStore<S> {
    pub fn new(upstream: Db<S>) -> Self {
        Self {
            upstream,
            entries: Default::default(),
        }
    }

    /// A second handle sharing both the upstream store and the scratch entries.
    pub fn copy(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            entries: Arc::clone(&self.entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Empties the scratch and returns its content as store operations,
    /// in key order.
    pub fn drain(&self) -> Vec<StoreOp> {
        std::mem::take(&mut *self.entries.write())
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => StoreOp::Put { key, value },
                None => StoreOp::Delete { key },
            })
            .collect()
    }
}

impl<S: KvStore> KvStore for ScratchStore<S> {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        if let Some(entry) = self.entries.read().get(key) {
            return entry.clone().ok_or(StoreError::NotFound);
        }
        self.upstream.get(key)?.ok_or(StoreError::NotFound)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.entries
            .write()
            .insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_vec(), None);
        Ok(())
    }

    fn batch(&self, ops: Vec<StoreOp>) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        for op in ops {
            match op {
                StoreOp::Put { key, value } => entries.insert(key, Some(value)),
                StoreOp::Delete { key } => entries.insert(key, None),
            };
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.upstream.prefix_scan(prefix)?.into_iter().collect();
        for (key, value) in self
            .entries
            .read()
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
        {
            match value {
                Some(value) => merged.insert(key.clone(), value.clone()),
                None => merged.remove(key),
            };
        }
        Ok(merged.into_iter().collect())
    }
}
