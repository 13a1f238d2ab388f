// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use sha3::{Digest, Keccak256};
use std::fmt::{self, Debug, Display};

pub const TRIE_HASH_LEN: usize = 32;

/// Root of the empty trie, the Keccak-256 digest of the empty RLP string `0x80`.
pub const EMPTY_ROOT: TrieHash = TrieHash([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8,
    0x6e, 0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63,
    0xb4, 0x21,
]);

#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct TrieHash(pub [u8; TRIE_HASH_LEN]);

impl TrieHash {
    /// Keccak-256 of `data`.
    pub fn of(data: &[u8]) -> Self {
        Self(Keccak256::digest(data).into())
    }
}

impl std::ops::Deref for TrieHash {
    type Target = [u8; TRIE_HASH_LEN];
    fn deref(&self) -> &[u8; TRIE_HASH_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for TrieHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for TrieHash {
    type Error = usize;

    /// Fails with the offending length.
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        value.try_into().map(Self).map_err(|_| value.len())
    }
}

impl Debug for TrieHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Display for TrieHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", hex::encode(self.0))
    }
}
