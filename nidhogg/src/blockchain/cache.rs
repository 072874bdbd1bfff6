//! object that stores recently seen blocks in a bounded cache.
//!
//! The cache is never authoritative: every block in it is also in the
//! storage, and eviction only costs a later storage read.

use crate::blockcfg::{Block, Hash};
use lru::LruCache;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub struct BlockCache {
    inner: Arc<Mutex<LruCache<Hash, Arc<Block>>>>,
}

impl BlockCache {
    /// create a new `BlockCache` holding at most `cap` blocks; the
    /// least recently used block is evicted on overflow.
    pub fn new(cap: usize) -> Self {
        BlockCache {
            inner: Arc::new(Mutex::new(LruCache::new(cap))),
        }
    }

    /// get a block from the cache.
    ///
    /// `None` does not mean the block is unknown to the node, only
    /// that it has not been seen _recently_; the storage may still
    /// have it.
    pub fn get(&self, hash: &Hash) -> Option<Arc<Block>> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.get(hash).map(Arc::clone)
    }

    /// insert the block unless it is already cached; an insert may
    /// evict the least recently used entry.
    pub fn contains_or_add(&self, block: Arc<Block>) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !guard.contains(block.hash()) {
            guard.put(*block.hash(), block);
        }
    }

    pub fn len(&self) -> usize {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
