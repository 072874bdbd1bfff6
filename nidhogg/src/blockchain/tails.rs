//! object that tracks the leaves of the known non-canonical forks,
//! for the fork choice to pick its candidates from.
//!
//! The set is bounded: when too many forks are alive at once the
//! least recently touched leaf is forgotten, and that branch stops
//! being considered by the fork choice.

use crate::blockcfg::{Block, Hash};
use lru::LruCache;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub struct DetachedTails {
    inner: Arc<Mutex<LruCache<Hash, Arc<Block>>>>,
}

impl DetachedTails {
    pub fn new(cap: usize) -> Self {
        DetachedTails {
            inner: Arc::new(Mutex::new(LruCache::new(cap))),
        }
    }

    /// insert the block as a fork leaf unless it is already tracked.
    pub fn contains_or_add(&self, block: Arc<Block>) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !guard.contains(block.hash()) {
            guard.put(*block.hash(), block);
        }
    }

    /// drop a block from the set; called when the block stopped being
    /// a leaf because a child got accepted.
    pub fn remove(&self, hash: &Hash) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.pop(hash);
    }

    /// all currently tracked fork leaves, in no particular order.
    pub fn tails(&self) -> Vec<Arc<Block>> {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.iter().map(|(_, block)| Arc::clone(block)).collect()
    }

    pub fn len(&self) -> usize {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::blockcfg::{Address, BlockHeader};

    fn block(height: u64) -> Arc<Block> {
        Arc::new(Block::new(
            BlockHeader {
                chain_id: 1,
                parent_hash: Hash::zero(),
                coinbase: Address::zero(),
                timestamp: 0,
                height,
                state_root: Hash::zero(),
            },
            vec![],
        ))
    }

    #[test]
    fn tracks_and_removes_leaves() {
        let tails = DetachedTails::new(8);
        let a = block(1);
        let b = block(2);
        tails.contains_or_add(Arc::clone(&a));
        tails.contains_or_add(Arc::clone(&b));
        assert_eq!(tails.len(), 2);

        tails.remove(a.hash());
        let remaining = tails.tails();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].hash(), b.hash());
    }

    #[test]
    fn removing_an_unknown_leaf_is_a_no_op() {
        let tails = DetachedTails::new(8);
        tails.remove(block(1).hash());
        assert!(tails.is_empty());
    }

    #[test]
    fn capacity_is_bounded() {
        let tails = DetachedTails::new(4);
        for height in 0..16 {
            tails.contains_or_add(block(height));
        }
        assert_eq!(tails.len(), 4);
    }
}
