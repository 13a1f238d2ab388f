// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

#![allow(dead_code)]

use bucket_trie::{Db, MemStore, Merkle};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn new_merkle() -> Merkle<MemStore> {
    Merkle::new(Db::new(MemStore::new()))
}

pub fn merkle_of<K: AsRef<[u8]>, V: AsRef<[u8]>>(items: &[(K, V)]) -> Merkle<MemStore> {
    let merkle = new_merkle();
    for (k, v) in items {
        merkle.put(k.as_ref(), v.as_ref()).unwrap();
    }
    merkle
}

/// Random items with distinct keys. Keys share short prefixes often enough
/// to produce extensions as well as branches.
pub fn random_items(seed: u64, count: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut items = std::collections::BTreeMap::new();
    while items.len() < count {
        let head = rng.random_range(1..4);
        let tail = rng.random_range(1..6);
        let mut key: Vec<u8> = (0..head).map(|_| rng.random_range(0..2)).collect();
        key.extend((0..tail).map(|_| rng.random::<u8>()));
        let len = rng.random_range(1..48);
        let value: Vec<u8> = (0..len).map(|_| rng.random::<u8>()).collect();
        items.insert(key, value);
    }
    items.into_iter().collect()
}
