// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use super::{lookup, Merkle, MerkleError, Node, NodeRef, TrieHash, EMPTY_ROOT};
use crate::executor::PrioritizedExecutor;
use crate::nibbles::{pack_nibbles, Nibbles};
use crate::storage::KvStore;
use crossbeam_channel::{unbounded, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A node reached by [Merkle::walk].
#[derive(Debug, Clone)]
pub struct WalkItem {
    pub node_ref: NodeRef,
    pub node: Node,
    /// Nibbles leading to this node, not including its own path.
    pub path: Vec<u8>,
    pub depth: usize,
}

/// Which children of a visited node the walk continues into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    All,
    /// Only the given slot of a branch.
    Only(u8),
    Stop,
}

/// A stored key/value pair together with the depth of the node holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub depth: usize,
}

type Fetched = Result<Option<WalkItem>, MerkleError>;

impl<S: KvStore + 'static> Merkle<S> {
    /// Visits the trie under `root` (the current root when `None`).
    ///
    /// Node fetches run concurrently on the walk pool, deepest path first
    /// once `walk_pool_size` fetches are in flight. `visit` runs on the
    /// calling thread, one node at a time, and decides where to go next.
    /// Nodes missing from the store are skipped.
    pub fn walk<F>(&self, root: Option<TrieHash>, mut visit: F) -> Result<(), MerkleError>
    where
        F: FnMut(&WalkItem) -> Result<Descend, MerkleError>,
    {
        let root = root.unwrap_or_else(|| self.root_hash());
        if root == EMPTY_ROOT {
            return Ok(());
        }

        let executor = PrioritizedExecutor::new(self.walk_pool()?, self.config.walk_pool_size);
        let (tx, rx) = unbounded::<Fetched>();
        let mut outstanding = 0usize;
        let mut visited = 0usize;

        self.schedule(&executor, &tx, NodeRef::Hash(root), Vec::new(), 0);
        outstanding += 1;

        while outstanding > 0 {
            let fetched = rx.recv().map_err(|_| MerkleError::WalkInterrupted)?;
            outstanding -= 1;

            let Some(item) = fetched? else {
                continue;
            };
            visited += 1;

            let children: Vec<(Vec<u8>, NodeRef)> = match visit(&item)? {
                Descend::Stop => Vec::new(),
                Descend::All => item
                    .node
                    .children()
                    .into_iter()
                    .map(|(nibbles, child)| (nibbles, child.clone()))
                    .collect(),
                Descend::Only(index) => {
                    let branch = item.node.as_branch().ok_or(MerkleError::NotBranchNode)?;
                    let child = branch.child(index).ok_or(MerkleError::NoSuchChild(index))?;
                    vec![(vec![index], child.clone())]
                }
            };

            for (nibbles, child) in children {
                let mut path = item.path.clone();
                path.extend(nibbles);
                self.schedule(&executor, &tx, child, path, item.depth + 1);
                outstanding += 1;
            }
        }

        log::debug!("walk from {root} visited {visited} nodes");
        Ok(())
    }

    fn schedule(
        &self,
        executor: &PrioritizedExecutor,
        tx: &Sender<Fetched>,
        node_ref: NodeRef,
        path: Vec<u8>,
        depth: usize,
    ) {
        if let NodeRef::Inline(node) = &node_ref {
            let item = WalkItem {
                node: (**node).clone(),
                node_ref,
                path,
                depth,
            };
            // the receiver lives on this thread
            let _ = tx.send(Ok(Some(item)));
            return;
        }

        let db = self.db.clone();
        let tx = tx.clone();
        executor.execute(path.len(), move || {
            // a fetch that panics still answers, so the walk does not wait on it
            let fetched = panic::catch_unwind(AssertUnwindSafe(|| lookup(&db, &node_ref)))
                .unwrap_or(Err(MerkleError::WalkInterrupted));
            let fetched = fetched.map(|node| {
                node.map(|node| WalkItem {
                    node_ref,
                    node,
                    path,
                    depth,
                })
            });
            let _ = tx.send(fetched);
        });
    }

    fn walk_pool(&self) -> Result<Arc<ThreadPool>, MerkleError> {
        let mut pool = self.pool.lock();
        if let Some(pool) = pool.as_ref() {
            return Ok(Arc::clone(pool));
        }
        let built = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(self.config.walk_threads)
                .thread_name(|i| format!("trie-walk-{i}"))
                .build()?,
        );
        *pool = Some(Arc::clone(&built));
        Ok(built)
    }

    /// Every stored key/value pair, sorted by key.
    pub fn entries(&self) -> Result<Vec<TrieEntry>, MerkleError> {
        self.entries_with_prefix(&[])
    }

    /// Every stored pair whose key starts with `prefix`, sorted by key. Only
    /// the part of the trie under the prefix is fetched.
    pub fn entries_with_prefix(&self, prefix: &[u8]) -> Result<Vec<TrieEntry>, MerkleError> {
        let prefix = Nibbles::new(prefix).to_vec();
        let mut entries = Vec::new();

        self.walk(None, |item| {
            let mut full = item.path.clone();
            if let Some(path) = item.node.path() {
                full.extend_from_slice(path);
            }
            let overlap = full.len().min(prefix.len());
            if full[..overlap] != prefix[..overlap] {
                return Ok(Descend::Stop);
            }

            if let Some(value) = item.node.value() {
                if full.len() >= prefix.len() {
                    let key = pack_nibbles(&full).ok_or(MerkleError::OddKeyPath)?;
                    entries.push(TrieEntry {
                        key,
                        value: value.to_vec(),
                        depth: item.depth,
                    });
                }
            }

            match &item.node {
                Node::Branch(branch) if full.len() < prefix.len() => {
                    let index = prefix[full.len()];
                    Ok(match branch.child(index) {
                        Some(_) => Descend::Only(index),
                        None => Descend::Stop,
                    })
                }
                _ => Ok(Descend::All),
            }
        })?;

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    /// Every node reachable from the current root with its depth, in path
    /// order.
    pub fn nodes(&self) -> Result<Vec<WalkItem>, MerkleError> {
        let mut nodes = Vec::new();
        self.walk(None, |item| {
            nodes.push(item.clone());
            Ok(Descend::All)
        })?;
        nodes.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(nodes)
    }

    /// Human readable listing of every node, one per line, depth first.
    pub fn dump(&self) -> Result<String, MerkleError> {
        let mut lines = Vec::new();
        self.walk(None, |item| {
            let path: String = item.path.iter().map(|nib| format!("{nib:x}")).collect();
            let line = format!("{}{path} {:?}", "  ".repeat(item.depth), item.node);
            lines.push((item.path.clone(), line));
            Ok(Descend::All)
        })?;

        // a parent's path prefixes its children's, so path order is depth first
        lines.sort();
        Ok(lines
            .into_iter()
            .map(|(_, line)| line + "\n")
            .collect())
    }
}
