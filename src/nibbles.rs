// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use std::ops::Index;

static NIBBLES: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

/// Nibbles is a view over a byte slice that produces 4-bit nibbles,
/// high nibble first. It can be indexed using nib\[x\] or iterated
/// with iter().
///
/// # Examples
///
/// ```
/// # use bucket_trie::nibbles::Nibbles;
/// let nib = Nibbles::new(&[0x56, 0x78]);
/// assert_eq!(nib.iter().collect::<Vec<_>>(), [0x5, 0x6, 0x7, 0x8]);
///
/// // nibbles can be advanced without rendering the intermediate values
/// assert_eq!(nib.iter().skip(3).collect::<Vec<_>>(), [0x8]);
///
/// assert_eq!(nib[1], 0x6);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Nibbles<'a>(&'a [u8]);

impl<'a> Index<usize> for Nibbles<'a> {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        let byte = self.0[index / 2];
        if index % 2 == 0 {
            &NIBBLES[(byte >> 4) as usize]
        } else {
            &NIBBLES[(byte & 0xf) as usize]
        }
    }
}

impl<'a> Nibbles<'a> {
    pub const fn new(inner: &'a [u8]) -> Self {
        Nibbles(inner)
    }

    #[must_use]
    pub fn iter(&self) -> NibblesIterator<'a> {
        NibblesIterator {
            data: *self,
            pos: 0,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        2 * self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Collects every nibble into an owned buffer.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for Nibbles<'a> {
    type Item = u8;
    type IntoIter = NibblesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator returned by [Nibbles::iter]
#[derive(Debug, Clone)]
pub struct NibblesIterator<'a> {
    data: Nibbles<'a>,
    pos: usize,
}

impl<'a> Iterator for NibblesIterator<'a> {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let result = self.data[self.pos];
        self.pos += 1;
        Some(result)
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.pos = self.pos.saturating_add(n);
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.data.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for NibblesIterator<'_> {}

/// Length of the common prefix of two nibble sequences.
pub fn matching_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Packs pairs of nibbles back into bytes. Returns `None` for an odd number
/// of nibbles since the last byte would be ambiguous.
pub fn pack_nibbles(nibbles: &[u8]) -> Option<Vec<u8>> {
    if nibbles.len() % 2 != 0 {
        return None;
    }
    Some(
        nibbles
            .chunks_exact(2)
            .map(|pair| (pair[0] << 4) | (pair[1] & 0xf))
            .collect(),
    )
}
