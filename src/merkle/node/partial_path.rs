// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use super::{DecodeError, Flags};
use crate::nibbles::{pack_nibbles, Nibbles};
use smallvec::SmallVec;
use std::{
    fmt::{self, Debug},
    iter::once,
};

/// PartialPath keeps a list of nibbles to represent a path on the Trie.
///
/// Hashed keys are 64 nibbles long, so that is what fits inline.
#[derive(PartialEq, Eq, Clone, Default)]
pub struct PartialPath(pub SmallVec<[u8; 64]>);

impl Debug for PartialPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for nib in self.0.iter() {
            write!(f, "{:x}", *nib & 0xf)?;
        }
        Ok(())
    }
}

impl std::ops::Deref for PartialPath {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for PartialPath {
    fn from(value: Vec<u8>) -> Self {
        Self(SmallVec::from_vec(value))
    }
}

impl From<&[u8]> for PartialPath {
    fn from(value: &[u8]) -> Self {
        Self(SmallVec::from_slice(value))
    }
}

impl PartialPath {
    pub fn into_inner(self) -> Vec<u8> {
        self.0.into_vec()
    }

    /// Hex-prefix encoding: the flag nibble, a padding nibble when the path
    /// is even, then the path itself, packed two nibbles per byte.
    pub fn encode(&self, is_terminal: bool) -> Vec<u8> {
        let mut flags = Flags::empty();

        if is_terminal {
            flags.insert(Flags::TERMINAL);
        }

        let extra_nibble = if self.0.len() % 2 == 1 {
            flags.insert(Flags::ODD_LEN);
            None
        } else {
            Some(0)
        };

        let nibbles: Vec<u8> = once(flags.bits())
            .chain(extra_nibble)
            .chain(self.0.iter().copied())
            .collect();

        // the flag nibble always makes the total even
        pack_nibbles(&nibbles).unwrap_or_default()
    }

    /// returns a tuple of the decoded partial path and whether the path is terminal
    pub fn decode(raw: &[u8]) -> Result<(Self, bool), DecodeError> {
        let mut nibbles = Nibbles::new(raw).iter();
        let flag_nibble = nibbles.next().ok_or(DecodeError::EmptyPath)?;
        let flags = Flags::from_bits(flag_nibble).ok_or(DecodeError::InvalidPathFlags(flag_nibble))?;

        if !flags.contains(Flags::ODD_LEN) {
            let _ = nibbles.next();
        }

        Ok((Self(nibbles.collect()), flags.contains(Flags::TERMINAL)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(&[1, 2, 3, 4], true)]
    #[test_case(&[1, 2, 3], false)]
    #[test_case(&[0, 1, 2], false)]
    #[test_case(&[1, 2], true)]
    #[test_case(&[1], true)]
    #[test_case(&[], false)]
    fn test_encoding(steps: &[u8], term: bool) {
        let path = PartialPath::from(steps);
        let encoded = path.encode(term);

        assert_eq!(encoded.len(), steps.len() / 2 + 1);

        let (decoded, decoded_term) = PartialPath::decode(&encoded).unwrap();

        assert_eq!(&*decoded, steps);
        assert_eq!(decoded_term, term);
    }

    // vectors from the Ethereum yellow paper appendix C
    #[test_case(&[1, 2, 3, 4, 5], false, &[0x11, 0x23, 0x45])]
    #[test_case(&[0, 1, 2, 3, 4, 5], false, &[0x00, 0x01, 0x23, 0x45])]
    #[test_case(&[0, 0xf, 1, 0xc, 0xb, 8], true, &[0x20, 0x0f, 0x1c, 0xb8])]
    #[test_case(&[0xf, 1, 0xc, 0xb, 8], true, &[0x3f, 0x1c, 0xb8])]
    fn hex_prefix_vectors(steps: &[u8], term: bool, expected: &[u8]) {
        assert_eq!(PartialPath::from(steps).encode(term), expected);
    }

    #[test_case(&[], DecodeError::EmptyPath; "empty")]
    #[test_case(&[0x41], DecodeError::InvalidPathFlags(4); "bad flags")]
    fn rejects_malformed(raw: &[u8], expected: DecodeError) {
        assert_eq!(PartialPath::decode(raw).unwrap_err(), expected);
    }
}
