// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use super::{Data, DecodeError, NodeRef};
use rlp::{Rlp, RlpStream};
use std::fmt::{Debug, Error as FmtError, Formatter};

pub const MAX_CHILDREN: usize = 16;
/// Children plus the value slot.
pub const SIZE: usize = MAX_CHILDREN + 1;

#[derive(PartialEq, Eq, Clone, Default)]
pub struct BranchNode {
    pub(crate) children: [Option<NodeRef>; MAX_CHILDREN],
    pub(crate) value: Option<Data>,
}

impl Debug for BranchNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "[Branch")?;

        for (i, c) in self.children() {
            write!(f, " ({i:x} {c:?})")?;
        }

        write!(
            f,
            " v={}]",
            match &self.value {
                Some(v) => hex::encode(&**v),
                None => "nil".to_string(),
            }
        )
    }
}

impl BranchNode {
    pub const MAX_CHILDREN: usize = MAX_CHILDREN;

    pub const fn value(&self) -> Option<&Data> {
        self.value.as_ref()
    }

    pub fn child(&self, index: u8) -> Option<&NodeRef> {
        self.children.get(index as usize)?.as_ref()
    }

    /// Occupied slots in index order.
    pub fn children(&self) -> impl Iterator<Item = (u8, &NodeRef)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (i as u8, c)))
    }

    /// The only occupied slot, or `None` when there are zero or several.
    pub fn single_child(&self) -> Option<(u8, &NodeRef)> {
        let mut children = self.children();
        match (children.next(), children.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    pub(super) fn decode(rlp: &Rlp<'_>) -> Result<Self, DecodeError> {
        let mut branch = BranchNode::default();

        for (i, slot) in branch.children.iter_mut().enumerate() {
            *slot = NodeRef::decode(&rlp.at(i)?)?;
        }

        let value = rlp.at(MAX_CHILDREN)?.data()?;
        branch.value = Some(value)
            .filter(|value| !value.is_empty())
            .map(Data::from);

        Ok(branch)
    }

    pub(super) fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(SIZE);

        for child in &self.children {
            match child {
                Some(child) => child.append_to(&mut stream),
                None => {
                    stream.append_empty_data();
                }
            }
        }

        match &self.value {
            Some(val) => stream.append(&&val[..]),
            None => stream.append_empty_data(),
        };

        stream.out().to_vec()
    }
}
