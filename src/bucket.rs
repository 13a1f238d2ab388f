// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! A trie that only authenticates its upper levels.
//!
//! Keys whose path would reach `max_height` nodes deep are not merged into
//! the trie at all. Their values land directly in the store under the raw
//! key, in the bucket hanging off the frontier node, and the root hash does
//! not move. Only the structure above the frontier is covered by the root.

use crate::config::BucketConfig;
use crate::merkle::{Merkle, MerkleError, TrieHash};
use crate::storage::{Db, KvStore, StoreOp};
use metrics::counter;

/// Bucket entries share the store with trie nodes, which are keyed by their
/// 32-byte hash. A 32-byte key equal to a node hash therefore reads back that
/// node's encoding past the frontier, and deleting it removes the node.
#[derive(Debug)]
pub struct BucketTrie<S> {
    merkle: Merkle<S>,
    max_height: usize,
}

impl<S: KvStore> BucketTrie<S> {
    pub fn new(db: Db<S>, config: BucketConfig) -> Self {
        Self {
            merkle: Merkle::with_config(db, config.trie),
            max_height: config.max_height,
        }
    }

    pub fn from_root(db: Db<S>, config: BucketConfig, root: &[u8]) -> Result<Self, MerkleError> {
        let trie = Self::new(db, config);
        trie.merkle.set_root(root)?;
        Ok(trie)
    }

    /// Depth at which keys stop being merged into the trie.
    pub fn max_height(&self) -> usize {
        self.max_height
    }

    /// The authenticated part of the trie.
    pub fn merkle(&self) -> &Merkle<S> {
        &self.merkle
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

    /// Looks in the bucket first once the search reaches the frontier, then
    /// falls back to a node that matches the key exactly.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, MerkleError> {
        let path = self.merkle.find_path(key)?;
        if path.depth >= self.max_height {
            if let Some(value) = self.merkle.db().get(key)? {
                return Ok(Some(value));
            }
        }
        Ok(path.value().map(|data| data.to_vec()))
    }

    /// Stores `value` under `key`. Above the frontier this is an ordinary
    /// trie insert; at or below it the value goes into the bucket and the
    /// root is left as it was. An empty value deletes.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), MerkleError> {
        if value.is_empty() {
            return self.delete(key);
        }
        let _guard = self.merkle.write_lock();

        // the first key always becomes the root leaf
        if self.merkle.is_empty() {
            return self.merkle.insert(key, value);
        }

        let path = self.merkle.find_path(key)?;
        if let Some(hash) = path.missing {
            return Err(MerkleError::MissingNode(hash));
        }

        if path.depth < self.max_height {
            return self.merkle.update_node(key, value, path);
        }

        counter!("bucket_trie.bucket.spill").increment(1);
        log::debug!("bucketing {} at depth {}", hex::encode(key), path.depth);
        let ops = vec![StoreOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }];
        self.merkle.save_path(key, path.stack, ops)
    }

    /// Drops the bucket entry for `key` when the search reaches the
    /// frontier, and removes any node holding the key from the trie.
    pub fn delete(&self, key: &[u8]) -> Result<(), MerkleError> {
        let _guard = self.merkle.write_lock();
        let path = self.merkle.find_path(key)?;
        if path.depth >= self.max_height {
            self.merkle.db().delete(key)?;
        }
        if path.value().is_some() {
            self.merkle.remove(key)?;
        }
        Ok(())
    }

    /// Bucket entries whose key starts with `prefix`, sorted by key. Trie
    /// nodes sharing the store are left out.
    pub fn bucket_entries(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, MerkleError> {
        let entries = self.merkle.db().prefix_scan(prefix)?;
        Ok(entries
            .into_iter()
            .filter(|(key, value)| TrieHash::of(value)[..] != key[..])
            .collect())
    }
}

crate::api::forward_trie_api!(BucketTrie);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrieConfig;
    use crate::storage::MemStore;
    use test_case::test_case;

    fn bucket(max_height: usize) -> BucketTrie<MemStore> {
        let config = BucketConfig::builder().max_height(max_height).build();
        BucketTrie::new(Db::new(MemStore::new()), config)
    }

    fn merkle_root(items: &[(&[u8], &[u8])]) -> TrieHash {
        let merkle = Merkle::new(Db::new(MemStore::new()));
        for (k, v) in items {
            merkle.put(k, v).unwrap();
        }
        merkle.root_hash()
    }

    const ITEMS: [(&[u8], &[u8]); 4] = [
        (b"do", b"verb"),
        (b"dog", b"puppy"),
        (b"doge", b"coin"),
        (b"horse", b"stallion"),
    ];

    #[test]
    fn tall_frontier_matches_plain_trie() {
        let trie = bucket(64);
        for (k, v) in ITEMS {
            trie.put(k, v).unwrap();
        }
        assert_eq!(trie.root_hash(), merkle_root(&ITEMS));
        assert!(trie.bucket_entries(b"").unwrap().is_empty());
    }

    #[test]
    fn keys_past_frontier_leave_root_alone() {
        let trie = bucket(1);
        trie.put(b"do", b"verb").unwrap();
        trie.put(b"dog", b"puppy").unwrap();
        let root = trie.root_hash();
        assert_eq!(root, merkle_root(&[(b"do", b"verb"), (b"dog", b"puppy")]));

        // extension, branch, leaf: found two levels below the root
        trie.put(b"doge", b"coin").unwrap();
        assert_eq!(trie.root_hash(), root);
        assert_eq!(trie.get(b"doge").unwrap().as_deref(), Some(&b"coin"[..]));
        assert_eq!(trie.get(b"dog").unwrap().as_deref(), Some(&b"puppy"[..]));
        assert_eq!(
            trie.bucket_entries(b"").unwrap(),
            vec![(b"doge".to_vec(), b"coin".to_vec())]
        );
    }

    #[test]
    fn zero_height_buckets_everything_after_root() {
        let trie = bucket(0);
        trie.put(b"a", b"1").unwrap();
        let root = trie.root_hash();
        trie.put(b"b", b"2").unwrap();
        trie.put(b"c", b"3").unwrap();
        assert_eq!(trie.root_hash(), root);
        assert_eq!(trie.get(b"a").unwrap().as_deref(), Some(&b"1"[..]));
        assert_eq!(trie.get(b"c").unwrap().as_deref(), Some(&b"3"[..]));
        assert_eq!(trie.bucket_entries(b"").unwrap().len(), 2);
    }

    #[test_case(b"doge" ; "bucketed key")]
    #[test_case(b"dog" ; "trie key past the frontier")]
    fn delete_past_frontier(key: &[u8]) {
        let trie = bucket(1);
        trie.put(b"do", b"verb").unwrap();
        trie.put(b"dog", b"puppy").unwrap();
        trie.put(b"doge", b"coin").unwrap();

        trie.delete(key).unwrap();
        assert_eq!(trie.get(key).unwrap(), None);
        assert_eq!(trie.get(b"do").unwrap().as_deref(), Some(&b"verb"[..]));
    }

    #[test]
    fn deleting_trie_key_restores_shape() {
        let trie = bucket(1);
        trie.put(b"do", b"verb").unwrap();
        trie.put(b"dog", b"puppy").unwrap();
        trie.delete(b"dog").unwrap();
        assert_eq!(trie.root_hash(), merkle_root(&[(b"do", b"verb")]));
    }

    #[test]
    fn bucket_entries_by_prefix() {
        let config = BucketConfig::builder()
            .max_height(0)
            .trie(TrieConfig::builder().walk_threads(1).build())
            .build();
        let trie = BucketTrie::new(Db::new(MemStore::new()), config);
        trie.put(b"root", b"r").unwrap();
        trie.put(b"ab1", b"x").unwrap();
        trie.put(b"ab2", b"y").unwrap();
        trie.put(b"b", b"z").unwrap();

        let keys: Vec<_> = trie
            .bucket_entries(b"ab")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"ab1".to_vec(), b"ab2".to_vec()]);
    }
}
