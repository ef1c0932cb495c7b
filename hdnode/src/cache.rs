//! Memoized multi-step private derivation.
//!
//! The cache is a side table from (starting node identity, index prefix) to the
//! node reached after walking that prefix. A lookup for `indices` reuses the
//! longest cached prefix of `indices[..len - 1]` and derives the rest; the
//! parent of the leaf is stored so that scanning sibling leaves costs a single
//! derivation each.
//!
//! Entries hold private keys. They are bounded by [`CacheConfig::capacity`],
//! evicted least-recently-used first, and wiped when evicted or when the cache
//! is dropped.

use crate::{
    error::{HdNodeError, Result},
    node::HdNode,
};
use crypto_utils::hash::sha256;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;
use zeroize::Zeroizing;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached nodes. 0 disables caching.
    pub capacity: usize,
    /// Longest index prefix that is cached; deeper paths bypass the cache.
    pub max_depth: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            capacity: 10,
            max_depth: 8,
        }
    }
}

/// Opaque identity of a starting node. Covers every field that influences
/// derivation, so distinct nodes never share entries.
type RootId = [u8; 32];

fn root_id(node: &HdNode) -> RootId {
    let mut buf = Zeroizing::new(Vec::<u8>::with_capacity(128));
    buf.extend_from_slice(node.curve.name.as_bytes());
    buf.push(0);
    buf.extend_from_slice(&node.depth.to_be_bytes());
    buf.extend_from_slice(&node.fingerprint.to_be_bytes());
    buf.extend_from_slice(&node.child_num.to_be_bytes());
    buf.extend_from_slice(&node.chain_code);
    buf.extend_from_slice(&node.private_key);
    sha256(&buf)
}

struct Entry {
    root: RootId,
    path: Vec<u32>,
    node: HdNode,
}

#[derive(Default)]
struct Inner {
    /// Most recently used first.
    entries: VecDeque<Entry>,
    hits: u64,
    misses: u64,
}

pub struct DerivationCache {
    config: CacheConfig,
    inner: Mutex<Inner>,
}

impl Default for DerivationCache {
    fn default() -> Self {
        DerivationCache::new(CacheConfig::default())
    }
}

impl DerivationCache {
    pub fn new(config: CacheConfig) -> Self {
        DerivationCache {
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.inner.lock().hits
    }

    pub fn misses(&self) -> u64 {
        self.inner.lock().misses
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Longest cached prefix of `path` for `root`, with the node it leads to.
    fn lookup(&self, root: &RootId, path: &[u32]) -> Option<(usize, HdNode)> {
        let mut inner = self.inner.lock();
        let best = inner
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.root == *root && path.starts_with(&e.path))
            .max_by_key(|(_, e)| e.path.len())
            .map(|(pos, _)| pos);

        match best {
            Some(pos) => {
                inner.hits += 1;
                let entry = inner.entries.remove(pos)?;
                let found = (entry.path.len(), entry.node.clone());
                inner.entries.push_front(entry);
                Some(found)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    fn fill(&self, root: RootId, path: &[u32], node: &HdNode) {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner
            .entries
            .iter()
            .position(|e| e.root == root && e.path == path)
        {
            // Another caller filled the same slot meanwhile; keep one copy.
            inner.entries.remove(pos);
        }
        inner.entries.push_front(Entry {
            root,
            path: path.to_vec(),
            node: node.clone(),
        });
        while inner.entries.len() > self.config.capacity {
            if let Some(evicted) = inner.entries.pop_back() {
                debug!(depth = evicted.path.len(), "evicting cached derivation");
            }
        }
    }
}

impl HdNode {
    /// Derive along `indices` like repeated [`HdNode::private_ckd`], reusing
    /// intermediate nodes from `cache`.
    ///
    /// The result is identical to the uncached walk. On error the node is left
    /// untouched.
    pub fn private_ckd_cached(&mut self, cache: &DerivationCache, indices: &[u32]) -> Result<()> {
        let Some((&leaf, prefix)) = indices.split_last() else {
            return Ok(());
        };
        if !self.has_private_key() {
            return Err(HdNodeError::NoPrivateKey);
        }

        let config = cache.config();
        if prefix.is_empty() || config.capacity == 0 || prefix.len() > config.max_depth {
            let mut node = self.clone();
            for &index in indices {
                node.private_ckd(index)?;
            }
            *self = node;
            return Ok(());
        }

        let root = root_id(self);
        let (reused, mut node) = match cache.lookup(&root, prefix) {
            Some((len, node)) => {
                debug!(reused = len, requested = prefix.len(), "derivation cache hit");
                (len, node)
            }
            None => {
                debug!(requested = prefix.len(), "derivation cache miss");
                (0, self.clone())
            }
        };

        for &index in &prefix[reused..] {
            node.private_ckd(index)?;
        }
        if reused < prefix.len() {
            cache.fill(root, prefix, &node);
        }
        node.private_ckd(leaf)?;
        *self = node;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::HARDENED_OFFSET;
    use hex_literal::hex;

    const SEED1: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");
    const H: u32 = HARDENED_OFFSET;

    fn master(seed: &[u8]) -> HdNode {
        HdNode::from_seed(seed, "secp256k1").unwrap()
    }

    fn uncached(mut node: HdNode, indices: &[u32]) -> HdNode {
        for &i in indices {
            node.private_ckd(i).unwrap();
        }
        node
    }

    #[test]
    fn matches_uncached_and_repeats() {
        let cache = DerivationCache::default();
        let path = [44 | H, H, H, 0, 3];
        let expected = uncached(master(&SEED1), &path);

        let mut first = master(&SEED1);
        first.private_ckd_cached(&cache, &path).unwrap();
        let mut second = master(&SEED1);
        second.private_ckd_cached(&cache, &path).unwrap();

        assert_eq!(first, expected);
        assert_eq!(second, expected);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn siblings_share_parent_entry() {
        let cache = DerivationCache::default();
        for i in 0..20 {
            let path = [44 | H, H, H, 0, i];
            let mut node = master(&SEED1);
            node.private_ckd_cached(&cache, &path).unwrap();
            assert_eq!(node, uncached(master(&SEED1), &path));
        }
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hits(), 19);
    }

    #[test]
    fn longer_path_extends_cached_prefix() {
        let cache = DerivationCache::default();
        let mut a = master(&SEED1);
        a.private_ckd_cached(&cache, &[H, 1, 2]).unwrap();

        let path = [H, 1, 5, 9];
        let mut b = master(&SEED1);
        b.private_ckd_cached(&cache, &path).unwrap();
        assert_eq!(b, uncached(master(&SEED1), &path));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn different_roots_never_collide() {
        let cache = DerivationCache::default();
        let path = [H, 1, 2];
        let other_seed = hex!("0f0e0d0c0b0a09080706050403020100");

        let mut a = master(&SEED1);
        a.private_ckd_cached(&cache, &path).unwrap();
        let mut b = master(&other_seed);
        b.private_ckd_cached(&cache, &path).unwrap();

        assert_eq!(b, uncached(master(&other_seed), &path));
        assert_ne!(a, b);
        assert_eq!(cache.hits(), 0);

        // Same keys at a different position in the tree are a different root too.
        let mut shifted = master(&SEED1);
        shifted.child_num = 1;
        shifted.depth = 1;
        let mut c = shifted.clone();
        c.private_ckd_cached(&cache, &path).unwrap();
        assert_eq!(c, uncached(shifted, &path));
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn eviction_bounds_size_not_results() {
        let cache = DerivationCache::new(CacheConfig {
            capacity: 2,
            max_depth: 8,
        });
        for round in 0..2 {
            for account in 0..5 {
                let path = [account | H, 0, round];
                let mut node = master(&SEED1);
                node.private_ckd_cached(&cache, &path).unwrap();
                assert_eq!(node, uncached(master(&SEED1), &path));
                assert!(cache.len() <= 2);
            }
        }
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = DerivationCache::new(CacheConfig {
            capacity: 2,
            max_depth: 8,
        });
        let walk = |account: u32| {
            let mut node = master(&SEED1);
            node.private_ckd_cached(&cache, &[account | H, 0, 7]).unwrap();
        };

        walk(0);
        walk(1);
        walk(0);
        assert_eq!(cache.hits(), 1);
        walk(2);
        assert_eq!(cache.len(), 2);

        let hits = cache.hits();
        walk(0);
        assert_eq!(cache.hits(), hits + 1, "recently used entry survives");

        let misses = cache.misses();
        walk(1);
        assert_eq!(cache.misses(), misses + 1, "stalest entry was evicted");
    }

    #[test]
    fn bypasses_cache_when_disabled_or_too_deep() {
        let disabled = DerivationCache::new(CacheConfig {
            capacity: 0,
            max_depth: 8,
        });
        let path = [H, 1, 2];
        let mut node = master(&SEED1);
        node.private_ckd_cached(&disabled, &path).unwrap();
        assert_eq!(node, uncached(master(&SEED1), &path));
        assert!(disabled.is_empty());

        let shallow = DerivationCache::new(CacheConfig {
            capacity: 4,
            max_depth: 1,
        });
        let mut node = master(&SEED1);
        node.private_ckd_cached(&shallow, &path).unwrap();
        assert_eq!(node, uncached(master(&SEED1), &path));
        assert!(shallow.is_empty());
    }

    #[test]
    fn empty_path_is_noop() {
        let cache = DerivationCache::default();
        let mut node = master(&SEED1);
        node.private_ckd_cached(&cache, &[]).unwrap();
        assert_eq!(node, master(&SEED1));
    }

    #[test]
    fn errors_leave_node_and_cache_clean() {
        let cache = DerivationCache::default();

        let mut ed = HdNode::from_seed(&SEED1, "ed25519").unwrap();
        let before = ed.clone();
        assert!(matches!(
            ed.private_ckd_cached(&cache, &[H, 1, H]),
            Err(HdNodeError::UnsupportedDerivation { .. })
        ));
        assert_eq!(ed, before);
        assert!(cache.is_empty());

        let mut public = master(&SEED1);
        public.neuter();
        assert!(matches!(
            public.private_ckd_cached(&cache, &[H, 1]),
            Err(HdNodeError::NoPrivateKey)
        ));
    }

    #[test]
    fn ed25519_hardened_paths_are_cached() {
        let cache = DerivationCache::default();
        let path = [44 | H, 501 | H, H, H];
        let start = HdNode::from_seed(&SEED1, "ed25519").unwrap();
        for _ in 0..2 {
            let mut node = start.clone();
            node.private_ckd_cached(&cache, &path).unwrap();
            assert_eq!(node, uncached(start.clone(), &path));
        }
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn concurrent_callers_agree() {
        let cache = DerivationCache::default();
        let expected: Vec<HdNode> = (0..8)
            .map(|i| uncached(master(&SEED1), &[44 | H, H, H, 0, i]))
            .collect();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for (i, want) in expected.iter().enumerate() {
                        let mut node = master(&SEED1);
                        node.private_ckd_cached(&cache, &[44 | H, H, H, 0, i as u32])
                            .unwrap();
                        assert_eq!(&node, want);
                    }
                });
            }
        });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.max_depth, 8);
    }
}
