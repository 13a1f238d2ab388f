// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use super::{NodeRef, PartialPath, LEAF_NODE_SIZE};
use rlp::RlpStream;
use std::fmt::{Debug, Error as FmtError, Formatter};

#[derive(PartialEq, Eq, Clone)]
pub struct ExtNode {
    pub(crate) path: PartialPath,
    pub(crate) child: NodeRef,
}

impl Debug for ExtNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "[Extension {:?} {:?}]", self.path, self.child)
    }
}

impl ExtNode {
    pub fn new<P: Into<PartialPath>>(path: P, child: NodeRef) -> Self {
        Self {
            path: path.into(),
            child,
        }
    }

    pub const fn path(&self) -> &PartialPath {
        &self.path
    }

    pub const fn child(&self) -> &NodeRef {
        &self.child
    }

    pub(super) fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(LEAF_NODE_SIZE);
        stream.append(&self.path.encode(false).as_slice());
        self.child.append_to(&mut stream);
        stream.out().to_vec()
    }
}
