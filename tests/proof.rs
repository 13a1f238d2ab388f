// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use bucket_trie::merkle::verify_proof;
use bucket_trie::{Merkle, Proof, ProofError};

pub mod common;
use common::{merkle_of, random_items};

#[test]
fn every_key_proves() {
    let items = random_items(21, 200);
    let merkle = merkle_of(&items);
    let root = merkle.root_hash();
    for (k, v) in &items {
        let proof = merkle.create_proof(k).unwrap();
        assert_eq!(verify_proof(&root[..], k, &proof).unwrap().as_ref(), Some(v));
    }
}

#[test]
fn absent_keys_prove_absence() {
    let items = random_items(22, 200);
    let (present, absent) = items.split_at(100);
    let merkle = merkle_of(present);
    let root = merkle.root_hash();
    for (k, _) in absent {
        let proof = merkle.create_proof(k).unwrap();
        assert_eq!(verify_proof(&root[..], k, &proof).unwrap(), None);
    }
}

#[test]
fn proof_against_other_root_finds_nothing() {
    let merkle = merkle_of(&[("do", "verb"), ("dog", "puppy")]);
    let other = merkle_of(&[("horse", "stallion")]);
    let proof = merkle.create_proof(b"dog").unwrap();
    assert_eq!(
        verify_proof(&other.root_hash()[..], b"dog", &proof).unwrap(),
        None
    );
}

#[test]
fn empty_proof_is_absence() {
    let merkle = merkle_of(&[("do", "verb")]);
    assert_eq!(
        verify_proof(&merkle.root_hash()[..], b"do", &Proof::default()).unwrap(),
        None
    );
}

#[test]
fn garbage_node_is_rejected() {
    let merkle = merkle_of(&[("do", "verb"), ("dog", "puppy")]);
    let mut proof = merkle.create_proof(b"dog").unwrap();
    // three items is neither a branch nor a short node
    proof.0.push(vec![0xc3, 0x80, 0x80, 0x80]);
    assert!(matches!(
        Merkle::from_proof(&proof, None),
        Err(ProofError::InvalidProof(_))
    ));
}
