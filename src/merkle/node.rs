// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use bitflags::bitflags;
use enum_as_inner::EnumAsInner;
use rlp::{Rlp, RlpStream};
use std::fmt::{self, Debug};
use thiserror::Error;

mod branch;
mod extension;
mod leaf;
mod partial_path;

pub use branch::{BranchNode, MAX_CHILDREN, SIZE as BRANCH_NODE_SIZE};
pub use extension::ExtNode;
pub use leaf::{LeafNode, SIZE as LEAF_NODE_SIZE};
pub use partial_path::PartialPath;

use super::{TrieHash, TRIE_HASH_LEN};

bitflags! {
    // should only ever be the size of a nibble
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Flags: u8 {
        const TERMINAL = 0b0010;
        const ODD_LEN  = 0b0001;
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DecodeError {
    #[error("malformed rlp: {0}")]
    Rlp(#[from] rlp::DecoderError),
    #[error("a node is a list of 2 or 17 items, got {0}")]
    InvalidItemCount(usize),
    #[error("child reference of {0} bytes is neither empty nor a hash")]
    InvalidChildRef(usize),
    #[error("invalid hex-prefix flag nibble {0:#x}")]
    InvalidPathFlags(u8),
    #[error("empty hex-prefix path")]
    EmptyPath,
}

#[derive(PartialEq, Eq, Clone, Default)]
pub struct Data(pub(crate) Vec<u8>);

impl std::ops::Deref for Data {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Data {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for Data {
    fn from(v: &[u8]) -> Self {
        Self(v.to_vec())
    }
}

impl Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// How a parent refers to a child: by the hash it is stored under, or by
/// embedding the child outright when its encoding is shorter than a hash.
#[derive(PartialEq, Eq, Clone, EnumAsInner)]
pub enum NodeRef {
    Hash(TrieHash),
    Inline(Box<Node>),
}

impl Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            NodeRef::Hash(hash) => write!(f, "{hash:?}"),
            NodeRef::Inline(node) => write!(f, "{node:?}"),
        }
    }
}

impl NodeRef {
    fn append_to(&self, stream: &mut RlpStream) {
        match self {
            NodeRef::Hash(hash) => stream.append(&&hash[..]),
            NodeRef::Inline(node) => stream.append_raw(&node.encode(), 1),
        };
    }

    /// Reads a child reference, `None` for an empty slot.
    fn decode(item: &Rlp<'_>) -> Result<Option<Self>, DecodeError> {
        if item.is_list() {
            let node = Node::decode(item.as_raw())?;
            return Ok(Some(NodeRef::Inline(Box::new(node))));
        }
        let data = item.data()?;
        match data.len() {
            0 => Ok(None),
            TRIE_HASH_LEN => TrieHash::try_from(data)
                .map(|hash| Some(NodeRef::Hash(hash)))
                .map_err(DecodeError::InvalidChildRef),
            len => Err(DecodeError::InvalidChildRef(len)),
        }
    }
}

#[derive(PartialEq, Eq, Clone, EnumAsInner)]
pub enum Node {
    Branch(Box<BranchNode>),
    Leaf(LeafNode),
    Extension(ExtNode),
}

impl Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Node::Branch(n) => write!(f, "{n:?}"),
            Node::Leaf(n) => write!(f, "{n:?}"),
            Node::Extension(n) => write!(f, "{n:?}"),
        }
    }
}

impl Node {
    pub fn decode(buf: &[u8]) -> Result<Node, DecodeError> {
        let rlp = Rlp::new(buf);

        match rlp.item_count()? {
            LEAF_NODE_SIZE => {
                let (path, term) = PartialPath::decode(rlp.at(0)?.data()?)?;
                let second = rlp.at(1)?;

                if term {
                    Ok(Node::Leaf(LeafNode::new(path, second.data()?.to_vec())))
                } else {
                    let child = NodeRef::decode(&second)?.ok_or(DecodeError::InvalidChildRef(0))?;
                    Ok(Node::Extension(ExtNode::new(path, child)))
                }
            }
            BRANCH_NODE_SIZE => Ok(Node::Branch(Box::new(BranchNode::decode(&rlp)?))),
            size => Err(DecodeError::InvalidItemCount(size)),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match &self {
            Node::Leaf(n) => n.encode(),
            Node::Extension(n) => n.encode(),
            Node::Branch(n) => n.encode(),
        }
    }

    pub fn hash(&self) -> TrieHash {
        TrieHash::of(&self.encode())
    }

    /// The nibbles this node consumes from a key, if any.
    pub fn path(&self) -> Option<&PartialPath> {
        match self {
            Node::Branch(_) => None,
            Node::Leaf(n) => Some(&n.path),
            Node::Extension(n) => Some(&n.path),
        }
    }

    pub fn path_mut(&mut self) -> Option<&mut PartialPath> {
        match self {
            Node::Branch(_) => None,
            Node::Leaf(n) => Some(&mut n.path),
            Node::Extension(n) => Some(&mut n.path),
        }
    }

    /// The value stored at the end of this node's own path.
    pub fn value(&self) -> Option<&Data> {
        match self {
            Node::Branch(n) => n.value.as_ref(),
            Node::Leaf(n) => Some(&n.data),
            Node::Extension(_) => None,
        }
    }

    /// Every child together with the nibbles that lead to it.
    pub fn children(&self) -> Vec<(Vec<u8>, &NodeRef)> {
        match self {
            Node::Branch(n) => n
                .children()
                .map(|(i, child)| (vec![i], child))
                .collect(),
            Node::Extension(n) => vec![(n.path.to_vec(), &n.child)],
            Node::Leaf(_) => Vec::new(),
        }
    }
}
