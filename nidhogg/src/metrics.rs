//! Counters published by the chain for the stats endpoints.
//!
//! Everything here is observational: the chain behaves the same with
//! a freshly created (all-zero) handle.

use crate::blockcfg::Block;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct ChainMetrics {
    stats: Arc<ChainMetricsImpl>,
}

#[derive(Debug, Default)]
struct ChainMetricsImpl {
    tail_height: AtomicU64,
    tail_hash_digest: AtomicU64,
    reverted_blocks: AtomicU64,
    revert_events: AtomicU64,
    blocks_on_chain: AtomicU64,
    block_latency_secs: AtomicU64,
    txs_on_chain: AtomicU64,
    tx_latency_secs: AtomicU64,
}

impl ChainMetrics {
    /// Record the new canonical tail.
    pub fn set_tail_block(&self, block: &Block) {
        self.stats
            .tail_height
            .store(block.height(), Ordering::Relaxed);
        self.stats
            .tail_hash_digest
            .store(block.hash().prefix_u64(), Ordering::Relaxed);
    }

    /// Record one revert episode covering `count` blocks.
    pub fn add_reverted_blocks(&self, count: u64) {
        self.stats.reverted_blocks.fetch_add(count, Ordering::Relaxed);
        self.stats.revert_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a block accepted on chain, with the seconds elapsed
    /// between its creation and its acceptance.
    pub fn block_on_chain(&self, latency_secs: u64) {
        self.stats.blocks_on_chain.fetch_add(1, Ordering::Relaxed);
        self.stats
            .block_latency_secs
            .fetch_add(latency_secs, Ordering::Relaxed);
    }

    /// Record a transaction accepted on chain, with the seconds
    /// elapsed between its submission and its acceptance.
    pub fn transaction_on_chain(&self, latency_secs: u64) {
        self.stats.txs_on_chain.fetch_add(1, Ordering::Relaxed);
        self.stats
            .tx_latency_secs
            .fetch_add(latency_secs, Ordering::Relaxed);
    }

    pub fn tail_height(&self) -> u64 {
        self.stats.tail_height.load(Ordering::Relaxed)
    }

    pub fn tail_hash_digest(&self) -> u64 {
        self.stats.tail_hash_digest.load(Ordering::Relaxed)
    }

    pub fn reverted_blocks(&self) -> u64 {
        self.stats.reverted_blocks.load(Ordering::Relaxed)
    }

    pub fn revert_events(&self) -> u64 {
        self.stats.revert_events.load(Ordering::Relaxed)
    }

    pub fn blocks_on_chain(&self) -> u64 {
        self.stats.blocks_on_chain.load(Ordering::Relaxed)
    }

    pub fn block_latency_secs(&self) -> u64 {
        self.stats.block_latency_secs.load(Ordering::Relaxed)
    }

    pub fn txs_on_chain(&self) -> u64 {
        self.stats.txs_on_chain.load(Ordering::Relaxed)
    }

    pub fn tx_latency_secs(&self) -> u64 {
        self.stats.tx_latency_secs.load(Ordering::Relaxed)
    }
}
