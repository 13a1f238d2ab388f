// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use super::{Data, PartialPath};
use rlp::RlpStream;
use std::fmt::{Debug, Error as FmtError, Formatter};

pub const SIZE: usize = 2;

#[derive(PartialEq, Eq, Clone)]
pub struct LeafNode {
    pub(crate) path: PartialPath,
    pub(crate) data: Data,
}

impl Debug for LeafNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "[Leaf {:?} {}]", self.path, hex::encode(&*self.data))
    }
}

impl LeafNode {
    pub fn new<P: Into<PartialPath>, D: Into<Data>>(path: P, data: D) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
        }
    }

    pub const fn path(&self) -> &PartialPath {
        &self.path
    }

    pub const fn data(&self) -> &Data {
        &self.data
    }

    pub(super) fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(SIZE);
        stream.append(&self.path.encode(true).as_slice());
        stream.append(&&self.data[..]);
        stream.out().to_vec()
    }
}
