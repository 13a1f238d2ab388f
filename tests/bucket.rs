// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use bucket_trie::{BucketConfig, BucketTrie, Db, MemStore};
use test_case::test_case;

pub mod common;
use common::{merkle_of, random_items};

fn bucket(db: Db<MemStore>, max_height: usize) -> BucketTrie<MemStore> {
    BucketTrie::new(db, BucketConfig::builder().max_height(max_height).build())
}

#[test_case(0)]
#[test_case(1)]
#[test_case(2)]
#[test_case(3)]
fn every_key_readable(max_height: usize) {
    let items = random_items(31, 150);
    let trie = bucket(Db::new(MemStore::new()), max_height);
    for (k, v) in &items {
        trie.put(k, v).unwrap();
    }
    for (k, v) in &items {
        assert_eq!(trie.get(k).unwrap().as_ref(), Some(v), "{}", hex::encode(k));
    }
}

#[test]
fn unbounded_height_is_a_plain_trie() {
    let items = random_items(32, 150);
    let trie = bucket(Db::new(MemStore::new()), usize::MAX);
    for (k, v) in &items {
        trie.put(k, v).unwrap();
    }
    assert_eq!(trie.root_hash(), merkle_of(&items).root_hash());
    assert!(trie.bucket_entries(b"").unwrap().is_empty());
}

#[test]
fn bucketed_writes_keep_the_root() {
    let items = random_items(33, 150);
    let trie = bucket(Db::new(MemStore::new()), 2);
    for (k, v) in &items {
        trie.put(k, v).unwrap();
    }
    let root = trie.root_hash();
    let bucketed = trie.bucket_entries(b"").unwrap();
    assert!(!bucketed.is_empty());

    for (k, _) in &bucketed {
        trie.put(k, b"updated").unwrap();
        assert_eq!(trie.root_hash(), root);
        assert_eq!(trie.get(k).unwrap().as_deref(), Some(&b"updated"[..]));
    }
}

#[test]
fn reopened_bucket_trie() {
    let db = Db::new(MemStore::new());
    let items = random_items(34, 100);
    let trie = bucket(db.clone(), 2);
    for (k, v) in &items {
        trie.put(k, v).unwrap();
    }

    let config = BucketConfig::builder().max_height(2).build();
    let reopened = BucketTrie::from_root(db, config, &trie.root_hash()[..]).unwrap();
    for (k, v) in &items {
        assert_eq!(reopened.get(k).unwrap().as_ref(), Some(v));
    }
}
