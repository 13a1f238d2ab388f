// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use typed_builder::TypedBuilder;

/// Trie configuration.
#[derive(Clone, TypedBuilder, Debug, PartialEq, Eq)]
pub struct TrieConfig {
    /// Maximum number of node fetches a walk keeps in flight. Further fetches
    /// wait in a priority queue, deepest path first.
    #[builder(default = 500)]
    pub walk_pool_size: usize,
    /// Worker threads backing the walk. Zero lets rayon pick one per core.
    #[builder(default = 0)]
    pub walk_threads: usize,
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Config for a depth-bounded bucket trie.
#[derive(Clone, TypedBuilder, Debug, PartialEq, Eq)]
pub struct BucketConfig {
    /// Depth at which the trie stops growing nodes and stores entries
    /// directly under their key.
    pub max_height: usize,
    #[builder(default = TrieConfig::builder().build())]
    pub trie: TrieConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TrieConfig::default();
        assert_eq!(config.walk_pool_size, 500);
        assert_eq!(config.walk_threads, 0);

        let bucket = BucketConfig::builder().max_height(3).build();
        assert_eq!(bucket.max_height, 3);
        assert_eq!(bucket.trie, config);
    }
}
