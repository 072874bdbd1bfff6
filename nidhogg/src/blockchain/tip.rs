//! Shared handle on the current canonical tail block.
//!
//! Readers may hold a clone of this handle on any thread; the only
//! writer is the chain's tail switch, which publishes the new block
//! after its persistence steps succeeded.

use crate::blockcfg::Block;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Clone)]
pub struct Tip {
    inner: Arc<RwLock<Arc<Block>>>,
}

impl Tip {
    pub fn new(block: Arc<Block>) -> Self {
        Tip {
            inner: Arc::new(RwLock::new(block)),
        }
    }

    /// the block the tip currently points to.
    pub fn block(&self) -> Arc<Block> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// point the tip at a new block, returning the previous one.
    pub(super) fn update(&self, block: Arc<Block>) -> Arc<Block> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, block)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::blockcfg::{Address, BlockHeader, Hash};

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
    fn update_publishes_to_every_clone() {
        let tip = Tip::new(block(0));
        let reader = tip.clone();

        let new_tail = block(1);
        let previous = tip.update(Arc::clone(&new_tail));

        assert_eq!(previous.height(), 0);
        assert_eq!(reader.block().hash(), new_tail.hash());
    }
}
