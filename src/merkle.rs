// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use crate::api::{Batch, BatchOp, KeyType, ValueType};
use crate::config::TrieConfig;
use crate::nibbles::{matching_len, Nibbles};
use crate::storage::{Db, KvStore, StoreError, StoreOp};
use metrics::counter;
use parking_lot::{Mutex, MutexGuard, RwLock};
use rayon::ThreadPool;
use std::fmt::{self, Debug};
use std::sync::Arc;
use thiserror::Error;

mod node;
pub mod proof;
mod trie_hash;
mod walk;

pub use node::{
    BranchNode, Data, DecodeError, ExtNode, LeafNode, Node, NodeRef, PartialPath, MAX_CHILDREN,
};
pub use proof::{verify_proof, Proof, ProofError};
pub use trie_hash::{TrieHash, EMPTY_ROOT, TRIE_HASH_LEN};
pub use walk::{Descend, TrieEntry, WalkItem};

#[derive(Debug, Error)]
pub enum MerkleError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("malformed node: {0}")]
    Decode(#[from] DecodeError),
    #[error("invalid root length {len}, roots are 32 bytes")]
    InvalidRoot { len: usize },
    #[error("stack underflow")]
    StackUnderflow,
    #[error("expected a branch node")]
    NotBranchNode,
    #[error("unexpected node shape on the key path")]
    UnexpectedNode,
    #[error("node {0:?} is missing from the store")]
    MissingNode(TrieHash),
    #[error("branch has no child at index {0:x}")]
    NoSuchChild(u8),
    #[error("trie is not checkpointed")]
    NotCheckpointed,
    #[error("value path has an odd number of nibbles")]
    OddKeyPath,
    #[error("cannot build the walk thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("walk interrupted before every node was visited")]
    WalkInterrupted,
}

/// The outcome of [Merkle::find_path].
#[derive(Debug, Default)]
pub struct TriePath {
    /// The node holding the key's value, set only on an exact match.
    pub node: Option<Node>,
    /// Key nibbles left over from the start of the last node on `stack`.
    pub remaining: Vec<u8>,
    /// Every node visited, root first.
    pub stack: Vec<Node>,
    /// Depth of the last node on `stack`, the root being 0.
    pub depth: usize,
    /// Set when the walk stopped at a node the store does not hold.
    pub missing: Option<TrieHash>,
}

impl TriePath {
    /// The value of the exact match, if any.
    pub fn value(&self) -> Option<&Data> {
        self.node.as_ref().and_then(Node::value)
    }
}

/// An Ethereum-compatible Merkle Patricia Trie over a [KvStore].
///
/// Nodes are content addressed: each one whose encoding reaches 32 bytes is
/// written under its Keccak-256 hash, shorter ones are embedded in their
/// parent. Nothing is ever removed from the store, so any earlier root stays
/// readable through [Merkle::set_root].
pub struct Merkle<S> {
    db: Db<S>,
    root: RwLock<TrieHash>,
    // serializes writers
    lock: Mutex<()>,
    config: TrieConfig,
    pool: Mutex<Option<Arc<ThreadPool>>>,
}

impl<S> Debug for Merkle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Merkle")
            .field("root", &*self.root.read())
            .field("config", &self.config)
            .finish()
    }
}

impl<S: KvStore> Merkle<S> {
    pub fn new(db: Db<S>) -> Self {
        Self::with_config(db, TrieConfig::default())
    }

    pub fn with_config(db: Db<S>, config: TrieConfig) -> Self {
        Self {
            db,
            root: RwLock::new(EMPTY_ROOT),
            lock: Mutex::new(()),
            config,
            pool: Mutex::new(None),
        }
    }

    /// Opens the trie at an existing root.
    pub fn from_root(db: Db<S>, root: &[u8]) -> Result<Self, MerkleError> {
        let merkle = Self::new(db);
        merkle.set_root(root)?;
        Ok(merkle)
    }

    pub fn db(&self) -> &Db<S> {
        &self.db
    }

    pub fn config(&self) -> &TrieConfig {
        &self.config
    }

    pub fn root_hash(&self) -> TrieHash {
        *self.root.read()
    }

    /// Moves the trie to another root. An empty slice resets to the empty trie.
    pub fn set_root(&self, root: &[u8]) -> Result<(), MerkleError> {
        let root = if root.is_empty() {
            EMPTY_ROOT
        } else {
            TrieHash::try_from(root).map_err(|len| MerkleError::InvalidRoot { len })?
        };
        self.reset_root(root);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.root_hash() == EMPTY_ROOT
    }

    /// Whether the store holds the node for `root`. The empty root always exists.
    pub fn check_root(&self, root: &TrieHash) -> Result<bool, MerkleError> {
        if *root == EMPTY_ROOT {
            return Ok(true);
        }
        Ok(self.read_node(root)?.is_some())
    }

    pub(crate) fn reset_root(&self, root: TrieHash) {
        *self.root.write() = root;
    }

    /// A second trie over the same store, starting at the current root.
    pub fn copy(&self) -> Self {
        let copy = Self::with_config(self.db.copy(), self.config.clone());
        copy.reset_root(self.root_hash());
        copy
    }

    pub(crate) fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, MerkleError> {
        let path = self.find_path(key)?;
        Ok(path.value().map(|data| data.to_vec()))
    }

    /// Stores `value` under `key`. An empty value deletes the key.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), MerkleError> {
        if value.is_empty() {
            return self.delete(key);
        }
        let _guard = self.lock.lock();
        self.insert(key, value)
    }

    pub fn delete(&self, key: &[u8]) -> Result<(), MerkleError> {
        let _guard = self.lock.lock();
        self.remove(key)
    }

    /// Applies the operations in order, stopping at the first failure.
    pub fn batch<K: KeyType, V: ValueType>(&self, ops: Batch<K, V>) -> Result<(), MerkleError> {
        for op in ops {
            match op {
                BatchOp::Put { key, value } => self.put(key.as_ref(), value.as_ref())?,
                BatchOp::Delete { key } => self.delete(key.as_ref())?,
            }
        }
        Ok(())
    }

    /// Inserts with the write lock already held.
    pub(crate) fn insert(&self, key: &[u8], value: &[u8]) -> Result<(), MerkleError> {
        counter!("bucket_trie.merkle.insert").increment(1);

        if self.is_empty() {
            let leaf = Node::Leaf(LeafNode::new(Nibbles::new(key).to_vec(), value));
            return self.save_stack(&[], vec![leaf], Vec::new());
        }

        let path = self.find_path(key)?;
        if let Some(hash) = path.missing {
            return Err(MerkleError::MissingNode(hash));
        }
        self.update_node(key, value, path)
    }

    /// Removes with the write lock already held.
    pub(crate) fn remove(&self, key: &[u8]) -> Result<(), MerkleError> {
        let path = self.find_path(key)?;
        if path.value().is_none() {
            return Ok(());
        }
        counter!("bucket_trie.merkle.remove").increment(1);
        self.delete_node(key, path.stack)
    }

    /// Walks from the root towards `key`, collecting every node on the way.
    pub fn find_path(&self, key: &[u8]) -> Result<TriePath, MerkleError> {
        enum Step {
            Found,
            Diverged,
            Descend(NodeRef, usize),
        }

        let key = Nibbles::new(key).to_vec();
        let mut path = TriePath::default();

        let root = self.root_hash();
        if root == EMPTY_ROOT {
            path.remaining = key;
            return Ok(path);
        }

        let mut next = NodeRef::Hash(root);
        // nibbles consumed by the nodes above the current one
        let mut consumed = 0;

        loop {
            let rest = &key[consumed..];
            let Some(node) = self.lookup(&next)? else {
                path.missing = next.as_hash().copied();
                path.remaining = rest.to_vec();
                return Ok(path);
            };

            let step = match &node {
                Node::Branch(branch) => match rest.first() {
                    None => Step::Found,
                    Some(&index) => match branch.child(index) {
                        Some(child) => Step::Descend(child.clone(), 1),
                        None => Step::Diverged,
                    },
                },
                Node::Leaf(leaf) if *leaf.path == *rest => Step::Found,
                Node::Leaf(_) => Step::Diverged,
                Node::Extension(ext) if rest.starts_with(&ext.path) => {
                    Step::Descend(ext.child.clone(), ext.path.len())
                }
                Node::Extension(_) => Step::Diverged,
            };

            path.depth = path.stack.len();
            match step {
                Step::Found => {
                    path.node = Some(node.clone());
                    path.stack.push(node);
                    return Ok(path);
                }
                Step::Diverged => {
                    path.remaining = rest.to_vec();
                    path.stack.push(node);
                    return Ok(path);
                }
                Step::Descend(child, len) => {
                    path.stack.push(node);
                    consumed += len;
                    next = child;
                }
            }
        }
    }

    pub(crate) fn update_node(
        &self,
        key: &[u8],
        value: &[u8],
        path: TriePath,
    ) -> Result<(), MerkleError> {
        let key = Nibbles::new(key).to_vec();
        let TriePath {
            node: found,
            remaining,
            mut stack,
            ..
        } = path;

        let last = stack.pop().ok_or(MerkleError::StackUnderflow)?;
        let start = consumed_len(&stack);
        let mut ops = Vec::new();

        let updated = match (found.is_some(), last) {
            (true, Node::Leaf(mut leaf)) => {
                leaf.data = value.into();
                Node::Leaf(leaf)
            }
            (true, Node::Branch(mut branch)) => {
                branch.value = Some(value.into());
                Node::Branch(branch)
            }
            (false, Node::Branch(mut branch)) => {
                let (&index, rest) = remaining
                    .split_first()
                    .ok_or(MerkleError::StackUnderflow)?;
                let leaf = Node::Leaf(LeafNode::new(rest, value));
                branch.children[index as usize] = Some(self.format_node(leaf, false, &mut ops));
                Node::Branch(branch)
            }
            (_, last) => self.split_node(last, &remaining, value, &mut ops)?,
        };

        log::trace!("update {updated:?} at depth {}", stack.len());
        stack.push(updated);
        self.save_stack(&key[..start], stack, ops)
    }

    /// Splits a leaf or extension whose path diverges from `remaining`,
    /// returning the node that takes its place.
    fn split_node(
        &self,
        last: Node,
        remaining: &[u8],
        value: &[u8],
        ops: &mut Vec<StoreOp>,
    ) -> Result<Node, MerkleError> {
        let old_path = last.path().ok_or(MerkleError::UnexpectedNode)?.clone();
        let common = matching_len(&old_path, remaining);
        let mut branch = BranchNode::default();

        match (old_path[common..].split_first(), last) {
            (None, Node::Leaf(leaf)) => branch.value = Some(leaf.data),
            (Some((&index, rest)), Node::Leaf(leaf)) => {
                let leaf = Node::Leaf(LeafNode::new(rest, leaf.data));
                branch.children[index as usize] = Some(self.format_node(leaf, false, ops));
            }
            // a one-nibble remainder is just the slot itself
            (Some((&index, [])), Node::Extension(ext)) => {
                branch.children[index as usize] = Some(ext.child);
            }
            (Some((&index, rest)), Node::Extension(ext)) => {
                let ext = Node::Extension(ExtNode::new(rest, ext.child));
                branch.children[index as usize] = Some(self.format_node(ext, false, ops));
            }
            _ => return Err(MerkleError::UnexpectedNode),
        }

        match remaining[common..].split_first() {
            None => branch.value = Some(value.into()),
            Some((&index, rest)) => {
                let leaf = Node::Leaf(LeafNode::new(rest, value));
                branch.children[index as usize] = Some(self.format_node(leaf, false, ops));
            }
        }

        let branch = Node::Branch(Box::new(branch));
        if common == 0 {
            return Ok(branch);
        }
        let child = self.format_node(branch, false, ops);
        Ok(Node::Extension(ExtNode::new(&old_path[..common], child)))
    }

    fn delete_node(&self, key: &[u8], mut stack: Vec<Node>) -> Result<(), MerkleError> {
        let key = Nibbles::new(key).to_vec();
        let ops = Vec::new();

        let (mut branch, mut start) = match stack.pop().ok_or(MerkleError::StackUnderflow)? {
            Node::Branch(mut branch) => {
                branch.value = None;
                (branch, consumed_len(&stack))
            }
            Node::Leaf(_) => {
                let Some(parent) = stack.pop() else {
                    // the root leaf was the last entry
                    return self.save_stack(&[], Vec::new(), ops);
                };
                let mut branch = parent
                    .into_branch()
                    .map_err(|_| MerkleError::NotBranchNode)?;
                let start = consumed_len(&stack);
                let index = *key.get(start).ok_or(MerkleError::StackUnderflow)?;
                branch.children[index as usize] = None;
                (branch, start)
            }
            Node::Extension(_) => return Err(MerkleError::UnexpectedNode),
        };

        let parent = stack.pop();
        let only_child = branch
            .single_child()
            .map(|(index, child)| (index, child.clone()));

        match (only_child, branch.value.take()) {
            (None, Some(value)) if branch.children().next().is_none() => {
                // a bare value becomes a leaf, absorbing an extension above it
                let path = match parent {
                    Some(Node::Extension(ext)) => {
                        start -= ext.path.len();
                        ext.path.into_inner()
                    }
                    parent => {
                        stack.extend(parent);
                        Vec::new()
                    }
                };
                stack.push(Node::Leaf(LeafNode::new(path, value)));
            }
            (Some((index, child_ref)), None) => {
                let mut path = match parent {
                    Some(Node::Extension(ext)) => {
                        start -= ext.path.len();
                        ext.path.into_inner()
                    }
                    parent => {
                        stack.extend(parent);
                        Vec::new()
                    }
                };
                path.push(index);

                match self.fetch(&child_ref)? {
                    Node::Branch(_) => {
                        stack.push(Node::Extension(ExtNode::new(path, child_ref)));
                    }
                    mut child => {
                        let child_path = child.path_mut().ok_or(MerkleError::UnexpectedNode)?;
                        path.extend_from_slice(child_path);
                        *child_path = path.into();
                        stack.push(child);
                    }
                }
            }
            (_, value) => {
                branch.value = value;
                stack.extend(parent);
                stack.push(Node::Branch(branch));
            }
        }

        log::trace!("delete collapsed to {:?}", stack.last());
        self.save_stack(&key[..start], stack, ops)
    }

    /// Saves a stack taken from [Merkle::find_path] for `key`, with `ops`
    /// written in the same batch.
    pub(crate) fn save_path(
        &self,
        key: &[u8],
        stack: Vec<Node>,
        ops: Vec<StoreOp>,
    ) -> Result<(), MerkleError> {
        let key = Nibbles::new(key).to_vec();
        let start = stack
            .split_last()
            .map_or(0, |(_, above)| consumed_len(above));
        self.save_stack(&key[..start], stack, ops)
    }

    /// Re-encodes `stack` bottom-up, wiring each node into its parent, then
    /// writes everything in one batch and swaps the root.
    ///
    /// `prefix` is the key path leading to the last node on the stack.
    pub(crate) fn save_stack(
        &self,
        prefix: &[u8],
        mut stack: Vec<Node>,
        mut ops: Vec<StoreOp>,
    ) -> Result<(), MerkleError> {
        let mut prefix = prefix.to_vec();
        let mut last: Option<NodeRef> = None;

        while let Some(mut node) = stack.pop() {
            if let Some(child) = last.take() {
                match &mut node {
                    Node::Branch(branch) => {
                        let index = prefix.pop().ok_or(MerkleError::StackUnderflow)?;
                        branch.children[index as usize] = Some(child);
                    }
                    Node::Extension(ext) => {
                        let len = prefix
                            .len()
                            .checked_sub(ext.path.len())
                            .ok_or(MerkleError::StackUnderflow)?;
                        prefix.truncate(len);
                        ext.child = child;
                    }
                    Node::Leaf(_) => return Err(MerkleError::NotBranchNode),
                }
            }
            last = Some(self.format_node(node, stack.is_empty(), &mut ops));
        }

        let root = match last {
            Some(NodeRef::Hash(hash)) => hash,
            _ => EMPTY_ROOT,
        };

        self.db.batch(ops)?;
        self.reset_root(root);
        log::trace!("new root {root}");
        Ok(())
    }

    /// Turns a node into the reference its parent stores, queueing a write
    /// when the node is referenced by hash. The root is always hashed.
    fn format_node(&self, node: Node, top_level: bool, ops: &mut Vec<StoreOp>) -> NodeRef {
        let encoded = node.encode();
        if encoded.len() < TRIE_HASH_LEN && !top_level {
            return NodeRef::Inline(Box::new(node));
        }
        let hash = TrieHash::of(&encoded);
        ops.push(StoreOp::Put {
            key: hash.to_vec(),
            value: encoded,
        });
        NodeRef::Hash(hash)
    }

    /// Resolves a reference, `None` when the store lacks the node.
    pub(crate) fn lookup(&self, node_ref: &NodeRef) -> Result<Option<Node>, MerkleError> {
        lookup(&self.db, node_ref)
    }

    fn fetch(&self, node_ref: &NodeRef) -> Result<Node, MerkleError> {
        match node_ref {
            NodeRef::Inline(node) => Ok((**node).clone()),
            NodeRef::Hash(hash) => self.read_node(hash)?.ok_or(MerkleError::MissingNode(*hash)),
        }
    }

    fn read_node(&self, hash: &TrieHash) -> Result<Option<Node>, MerkleError> {
        read_node(&self.db, hash)
    }
}

crate::api::forward_trie_api!(Merkle);

pub(crate) fn lookup<S: KvStore>(
    db: &Db<S>,
    node_ref: &NodeRef,
) -> Result<Option<Node>, MerkleError> {
    match node_ref {
        NodeRef::Inline(node) => Ok(Some((**node).clone())),
        NodeRef::Hash(hash) => read_node(db, hash),
    }
}

fn read_node<S: KvStore>(db: &Db<S>, hash: &TrieHash) -> Result<Option<Node>, MerkleError> {
    counter!("bucket_trie.node.read").increment(1);
    match db.get(&hash[..])? {
        Some(raw) => Ok(Some(Node::decode(&raw)?)),
        None => Ok(None),
    }
}

/// Key nibbles consumed by walking through every node of `stack`.
fn consumed_len(stack: &[Node]) -> usize {
    stack
        .iter()
        .map(|node| node.path().map_or(1, |path| path.len()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_case::test_case;

    fn merkle() -> Merkle<MemStore> {
        Merkle::new(Db::new(MemStore::new()))
    }

    /// Counts the batches written through it.
    #[derive(Debug, Default)]
    struct CountingStore {
        inner: MemStore,
        batches: AtomicUsize,
    }

    impl KvStore for CountingStore {
        fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
            self.inner.get(key)
        }

        fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
            self.inner.put(key, value)
        }

        fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
            self.inner.delete(key)
        }

        fn batch(&self, ops: Vec<StoreOp>) -> Result<(), StoreError> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            self.inner.batch(ops)
        }
    }

    fn root_of(items: &[(&[u8], &[u8])]) -> TrieHash {
        let merkle = merkle();
        for (k, v) in items {
            merkle.put(k, v).unwrap();
        }
        merkle.root_hash()
    }

    #[test]
    fn empty_trie() {
        let merkle = merkle();
        assert!(merkle.is_empty());
        assert_eq!(merkle.root_hash(), EMPTY_ROOT);
        assert_eq!(merkle.get(b"anything").unwrap(), None);
        merkle.delete(b"anything").unwrap();
        assert_eq!(merkle.root_hash(), EMPTY_ROOT);
    }

    #[test]
    fn single_leaf_root() {
        let merkle = merkle();
        merkle.put(b"a", b"b").unwrap();
        let expected = Node::Leaf(LeafNode::new(Nibbles::new(b"a").to_vec(), &b"b"[..]));
        assert_eq!(merkle.root_hash(), expected.hash());
        assert_eq!(merkle.get(b"a").unwrap().as_deref(), Some(&b"b"[..]));
    }

    #[test]
    fn known_root() {
        let root = root_of(&[
            (b"do", b"verb"),
            (b"dog", b"puppy"),
            (b"doge", b"coin"),
            (b"horse", b"stallion"),
        ]);
        assert_eq!(
            root.to_string(),
            "5991bb8c6514148a29db676a14ac506cd2cd5775ace63c30a4fe457715e9ac84"
        );
    }

    #[test_case(&[(b"a", b"1"), (b"b", b"2")], b"b"; "leaf beside leaf")]
    #[test_case(&[(b"do", b"verb"), (b"dog", b"puppy")], b"dog"; "value on branch")]
    #[test_case(&[(b"do", b"verb"), (b"dog", b"puppy")], b"do"; "drop branch value")]
    #[test_case(&[(b"abc", b"1"), (b"abd", b"2"), (b"x", b"3")], b"x"; "merge extension")]
    #[test_case(&[(b"abc", b"1"), (b"abd", b"2"), (b"x", b"3")], b"abd"; "collapse to leaf")]
    fn delete_restores_canonical_shape(items: &[(&[u8], &[u8])], removed: &[u8]) {
        let merkle = merkle();
        for (k, v) in items {
            merkle.put(k, v).unwrap();
        }
        merkle.delete(removed).unwrap();

        let rest: Vec<_> = items
            .iter()
            .copied()
            .filter(|(k, _)| *k != removed)
            .collect();
        assert_eq!(merkle.root_hash(), root_of(&rest));
        assert_eq!(merkle.get(removed).unwrap(), None);
        for (k, v) in rest {
            assert_eq!(merkle.get(k).unwrap().as_deref(), Some(v));
        }
    }

    #[test]
    fn delete_at_valueless_branch_writes_nothing() {
        let merkle = Merkle::new(Db::new(CountingStore::default()));
        merkle.put(&[0x12, 0x34], b"a").unwrap();
        merkle.put(&[0x12, 0x56], b"b").unwrap();
        let root = merkle.root_hash();
        let batches = merkle.db().store().batches.load(Ordering::SeqCst);

        // the key ends exactly at the branch below the extension
        let path = merkle.find_path(&[0x12]).unwrap();
        assert!(path.node.as_ref().is_some_and(|node| node.is_branch()));
        assert!(path.value().is_none());

        merkle.delete(&[0x12]).unwrap();
        assert_eq!(merkle.db().store().batches.load(Ordering::SeqCst), batches);
        assert_eq!(merkle.root_hash(), root);
    }

    #[test]
    fn delete_last_key_empties() {
        let merkle = merkle();
        merkle.put(b"key", b"value").unwrap();
        merkle.delete(b"key").unwrap();
        assert!(merkle.is_empty());
    }

    #[test]
    fn put_empty_value_deletes() {
        let merkle = merkle();
        merkle.put(b"a", b"1").unwrap();
        merkle.put(b"b", b"2").unwrap();
        merkle.put(b"b", b"").unwrap();
        assert_eq!(merkle.root_hash(), root_of(&[(b"a", b"1")]));
    }

    #[test]
    fn overwrite_keeps_single_entry() {
        let merkle = merkle();
        merkle.put(b"dog", b"puppy").unwrap();
        merkle.put(b"dog", b"hound").unwrap();
        assert_eq!(merkle.root_hash(), root_of(&[(b"dog", b"hound")]));
    }

    #[test]
    fn set_root_rejects_bad_length() {
        let merkle = merkle();
        assert!(matches!(
            merkle.set_root(&[0u8; 31]),
            Err(MerkleError::InvalidRoot { len: 31 })
        ));
        merkle.set_root(&[]).unwrap();
        assert!(merkle.is_empty());
    }

    #[test]
    fn old_roots_stay_readable() {
        let merkle = merkle();
        merkle.put(b"key", b"old").unwrap();
        let old = merkle.root_hash();
        merkle.put(b"key", b"new").unwrap();
        assert!(merkle.check_root(&old).unwrap());

        merkle.set_root(&old[..]).unwrap();
        assert_eq!(merkle.get(b"key").unwrap().as_deref(), Some(&b"old"[..]));
        assert!(!merkle.check_root(&TrieHash::of(b"nope")).unwrap());
    }

    #[test]
    fn missing_root_node() {
        let merkle = merkle();
        let absent = TrieHash::of(b"absent");
        merkle.set_root(&absent[..]).unwrap();

        assert_eq!(merkle.get(b"key").unwrap(), None);
        let path = merkle.find_path(b"key").unwrap();
        assert_eq!(path.missing, Some(absent));
        assert!(matches!(
            merkle.put(b"key", b"value"),
            Err(MerkleError::MissingNode(hash)) if hash == absent
        ));
    }

    #[test]
    fn find_path_reports_depth() {
        let merkle = merkle();
        merkle.put(b"do", b"verb").unwrap();
        merkle.put(b"dog", b"puppy").unwrap();

        let path = merkle.find_path(b"dog").unwrap();
        assert!(path.node.is_some());
        assert_eq!(path.depth, path.stack.len() - 1);
        assert!(path.remaining.is_empty());

        let path = merkle.find_path(b"cat").unwrap();
        assert!(path.node.is_none());
        assert_eq!(path.depth, 0);
    }

    #[test]
    fn copy_shares_store() {
        let merkle = merkle();
        merkle.put(b"a", b"1").unwrap();
        let copy = merkle.copy();
        copy.put(b"b", b"2").unwrap();

        assert_eq!(merkle.get(b"b").unwrap(), None);
        merkle.set_root(&copy.root_hash()[..]).unwrap();
        assert_eq!(merkle.get(b"b").unwrap().as_deref(), Some(&b"2"[..]));
    }
}
