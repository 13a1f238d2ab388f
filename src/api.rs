// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use crate::merkle::{MerkleError, TrieHash};
use std::fmt::Debug;

/// A `KeyType` is something that can be cast to a u8 reference,
/// and can be sent and shared across threads.
pub trait KeyType: AsRef<[u8]> + Send + Sync + Debug {}

impl<T> KeyType for T where T: AsRef<[u8]> + Send + Sync + Debug {}

/// A `ValueType` is the same as a `KeyType`. However, these could
/// be a different type from the `KeyType` on a given API call.
pub trait ValueType: AsRef<[u8]> + Send + Sync + Debug {}

impl<T> ValueType for T where T: AsRef<[u8]> + Send + Sync + Debug {}

/// A key/value pair operation. Only put (upsert) and delete are
/// supported. A put with an empty value is a delete.
#[derive(Debug)]
pub enum BatchOp<K: KeyType, V: ValueType> {
    Put { key: K, value: V },
    Delete { key: K },
}

/// A list of operations applied in order
pub type Batch<K, V> = Vec<BatchOp<K, V>>;

/// A convenience implementation to convert a vector of key/value
/// pairs into a batch of insert operations
#[must_use]
pub fn vec_into_batch<K: KeyType, V: ValueType>(value: Vec<(K, V)>) -> Batch<K, V> {
    value
        .into_iter()
        .map(|(key, value)| BatchOp::Put { key, value })
        .collect()
}

/// Read access shared by every trie flavour.
pub trait TrieReader {
    fn get<K: KeyType>(&self, key: K) -> Result<Option<Vec<u8>>, MerkleError>;

    fn root_hash(&self) -> TrieHash;
}

/// Write access shared by every trie flavour.
pub trait TrieWriter: TrieReader {
    fn put<K: KeyType, V: ValueType>(&self, key: K, value: V) -> Result<(), MerkleError>;

    fn delete<K: KeyType>(&self, key: K) -> Result<(), MerkleError>;

    fn batch<K: KeyType, V: ValueType>(&self, ops: Batch<K, V>) -> Result<(), MerkleError> {
        for op in ops {
            match op {
                BatchOp::Put { key, value } => self.put(key, value)?,
                BatchOp::Delete { key } => self.delete(key)?,
            }
        }
        Ok(())
    }
}

/// Implements [TrieReader] and [TrieWriter] by forwarding to the inherent
/// byte-slice methods of the same name.
macro_rules! forward_trie_api {
    ($ty:ident) => {
        impl<S: $crate::storage::KvStore> $crate::api::TrieReader for $ty<S> {
            fn get<K: $crate::api::KeyType>(
                &self,
                key: K,
            ) -> Result<Option<Vec<u8>>, $crate::merkle::MerkleError> {
                $ty::get(self, key.as_ref())
            }

            fn root_hash(&self) -> $crate::merkle::TrieHash {
                $ty::root_hash(self)
            }
        }

        impl<S: $crate::storage::KvStore> $crate::api::TrieWriter for $ty<S> {
            fn put<K: $crate::api::KeyType, V: $crate::api::ValueType>(
                &self,
                key: K,
                value: V,
            ) -> Result<(), $crate::merkle::MerkleError> {
                $ty::put(self, key.as_ref(), value.as_ref())
            }

            fn delete<K: $crate::api::KeyType>(
                &self,
                key: K,
            ) -> Result<(), $crate::merkle::MerkleError> {
                $ty::delete(self, key.as_ref())
            }
        }
    };
}

pub(crate) use forward_trie_api;
