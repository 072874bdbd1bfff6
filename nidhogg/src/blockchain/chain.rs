//! The canonical chain and its tail reconciliation.
//!
//! Blocks form a tree through their parent hashes; the canonical
//! chain is the path from the genesis block to the current tail,
//! materialized by the height index of the storage. Moving the tail
//! to a block on another branch is a reorg: the abandoned blocks give
//! their transactions back to the pool, the height index is rebuilt
//! along the new branch, and the tail pointer is rewritten last.
//!
//! The fork choice runs outside of this module: it enumerates
//! [`Blockchain::detached_tails`] and calls [`Blockchain::set_tail`]
//! with whichever candidate its rules prefer.

use super::cache::BlockCache;
use super::storage::{self, Storage};
use super::tails::DetachedTails;
use super::tip::Tip;
use crate::blockcfg::transaction::{DEFAULT_GAS_PRICE, MAX_GAS, MAX_GAS_PRICE};
use crate::blockcfg::{Address, Block, BlockHeader, GenesisConfig, Hash, Transaction};
use crate::intercom::{Event, EventEmitter, TransactionPool};
use crate::metrics::ChainMetrics;
use chain_storage::KeyValueStore;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// How many recently seen blocks are kept decoded in memory.
pub const BLOCK_CACHE_CAPACITY: usize = 1024;

/// How many fork leaves are tracked for the fork choice.
pub const DETACHED_TAILS_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] storage::Error),

    #[error("missing a block from the storage while walking the chain: `{0}`")]
    MissingParentBlock(Hash),

    #[error("the tail pointer references block `{0}` which is not in the storage")]
    MissingTailBlock(Hash),

    #[error("no block in the canonical chain at height {0}")]
    CannotFindBlockAtGivenHeight(u64),

    #[error(
        "genesis block in storage was made for chain id {stored}, \
         the node is configured for chain id {configured}"
    )]
    GenesisConfNotMatch { configured: u32, stored: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;

/// The blockchain of the node: the persisted block tree, the
/// canonical chain over it, and the bounded in-memory companions
/// (block cache and fork leaves).
///
/// The object can be cloned and shared across threads for the
/// read-only operations. [`Blockchain::set_tail`] is the single
/// writer and must not run concurrently with itself; readers running
/// during a tail switch may observe heights already reindexed to the
/// new branch while the tail still points at the old one.
#[derive(Clone)]
pub struct Blockchain {
    chain_id: u32,
    genesis_block: Arc<Block>,
    tail: Tip,
    storage: Storage,
    cached_blocks: BlockCache,
    detached_tails: DetachedTails,
    tx_pool: Option<Arc<dyn TransactionPool>>,
    event_emitter: Option<Arc<dyn EventEmitter>>,
    metrics: ChainMetrics,
}

impl Blockchain {
    /// Open the chain over the given backend.
    ///
    /// On a fresh backend this persists the genesis block built from
    /// `genesis` and points the tail at it. On a pre-existing backend
    /// the stored genesis must have been built for the same chain id,
    /// and the tail is reloaded from the stored pointer.
    pub fn new(
        genesis: GenesisConfig,
        store: Arc<dyn KeyValueStore>,
        tx_pool: Option<Arc<dyn TransactionPool>>,
        event_emitter: Option<Arc<dyn EventEmitter>>,
        metrics: ChainMetrics,
    ) -> Result<Self> {
        let storage = Storage::new(store);
        let genesis_block = Self::load_genesis(&storage, &genesis)?;
        let tail_block = Self::load_tail(&storage, &genesis_block, event_emitter.as_deref())?;

        tracing::info!("tail block {}", tail_block);
        metrics.set_tail_block(&tail_block);

        Ok(Blockchain {
            chain_id: genesis.chain_id,
            genesis_block,
            tail: Tip::new(tail_block),
            storage,
            cached_blocks: BlockCache::new(BLOCK_CACHE_CAPACITY),
            detached_tails: DetachedTails::new(DETACHED_TAILS_CAPACITY),
            tx_pool,
            event_emitter,
            metrics,
        })
    }

    pub fn chain_id(&self) -> u32 {
        self.chain_id
    }

    pub fn genesis_block(&self) -> Arc<Block> {
        Arc::clone(&self.genesis_block)
    }

    /// The current tail (head) of the canonical chain.
    pub fn tail_block(&self) -> Arc<Block> {
        self.tail.block()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn metrics(&self) -> &ChainMetrics {
        &self.metrics
    }

    /// Get the block of the given hash, from the cache or from the
    /// storage.
    ///
    /// A block loaded from storage is not admitted into the cache;
    /// admissions happen only when verified blocks are accepted.
    pub fn get_block(&self, hash: &Hash) -> Result<Option<Arc<Block>>> {
        if let Some(block) = self.cached_blocks.get(hash) {
            return Ok(Some(block));
        }
        Self::load_block(&self.storage, self.event_emitter.as_deref(), hash)
    }

    /// Get the block at the given height of the canonical chain.
    pub fn get_block_by_height(&self, height: u64) -> Result<Option<Arc<Block>>> {
        match self.storage.get_height_index(height)? {
            None => Ok(None),
            Some(hash) => self.get_block(&hash),
        }
    }

    /// Get a transaction by hash.
    ///
    /// Only the tail block is searched: historical lookups need a
    /// transaction index, which is a separate subsystem.
    pub fn get_transaction(&self, hash: &Hash) -> Option<Transaction> {
        self.tail
            .block()
            .transactions()
            .iter()
            .find(|tx| tx.hash() == hash)
            .cloned()
    }

    /// Accept a batch of verified blocks descending from `parent`,
    /// with `tails` being the leaves among them.
    ///
    /// The blocks are persisted before `parent` stops being listed as
    /// a fork leaf, so the fork choice never enumerates a leaf whose
    /// block is absent from the storage.
    pub fn put_verified_new_blocks(
        &self,
        parent: &Block,
        all_blocks: &[Arc<Block>],
        tail_blocks: &[Arc<Block>],
    ) -> Result<()> {
        let now = now_secs();
        for block in all_blocks {
            self.cached_blocks.contains_or_add(Arc::clone(block));
            self.storage.put_block(block)?;

            tracing::info!("accepted the new block {} on chain", block);

            self.metrics
                .block_on_chain(now.saturating_sub(block.timestamp()));
            for tx in block.transactions() {
                self.metrics
                    .transaction_on_chain(now.saturating_sub(tx.timestamp()));
            }
        }
        for tail in tail_blocks {
            self.detached_tails.contains_or_add(Arc::clone(tail));
        }
        self.detached_tails.remove(parent.hash());
        Ok(())
    }

    /// The leaves of the known non-canonical forks, for the fork
    /// choice to compare against the current tail.
    pub fn detached_tails(&self) -> Vec<Arc<Block>> {
        self.detached_tails.tails()
    }

    /// Create a new block template on top of the current tail.
    pub fn new_block(&self, coinbase: Address) -> Block {
        self.new_block_from_parent(coinbase, &self.tail.block())
    }

    /// Create a new block template on top of the given parent block.
    pub fn new_block_from_parent(&self, coinbase: Address, parent: &Block) -> Block {
        Block::new(
            BlockHeader {
                chain_id: self.chain_id,
                parent_hash: *parent.hash(),
                coinbase,
                timestamp: now_secs(),
                height: parent.height() + 1,
                state_root: *parent.state_root(),
            },
            Vec::new(),
        )
    }

    /// Find the common ancestor of the given block and the current
    /// tail: the highest block that is on the path from either of
    /// them back to genesis.
    ///
    /// The given block does not have to be in the storage itself as
    /// long as its parent is; fails with `MissingParentBlock` when
    /// neither is known, or when a parent link dangles mid-walk.
    pub fn find_common_ancestor_with_tail(&self, block: &Block) -> Result<Arc<Block>> {
        let mut tail = self.tail.block();

        // fast check if the block is already on the canonical chain
        if tail.height() >= block.height() {
            if let Some(local) = self.get_block_by_height(block.height())? {
                if local.hash() == block.hash() {
                    return Ok(local);
                }
            }
        }

        // anchor the walk on a block we know locally
        let mut target = match self.get_block(block.hash())? {
            Some(target) => target,
            None => self
                .get_block(block.parent_hash())?
                .ok_or(Error::MissingParentBlock(*block.parent_hash()))?,
        };

        while tail.height() > target.height() {
            tail = self.parent_block(&tail)?;
        }
        while tail.height() < target.height() {
            target = self.parent_block(&target)?;
        }
        while tail.hash() != target.hash() {
            tail = self.parent_block(&tail)?;
            target = self.parent_block(&target)?;
        }
        Ok(target)
    }

    /// Switch the canonical tail to `new_tail`.
    ///
    /// The blocks between the common ancestor and the old tail return
    /// their transactions to the pool, the height index is rebuilt
    /// between the ancestor and `new_tail`, the tail pointer is
    /// persisted and finally published in memory. On error the
    /// in-memory tail is left unchanged; a partially rebuilt height
    /// index is tolerated, the next successful switch overwrites it.
    ///
    /// Not reentrant: this is the single writer of the chain.
    pub fn set_tail(&self, new_tail: Arc<Block>) -> Result<()> {
        let old_tail = self.tail.block();

        let ancestor = match self.find_common_ancestor_with_tail(&new_tail) {
            Ok(ancestor) => ancestor,
            Err(err) => {
                tracing::error!(
                    "failed to find the common ancestor of {} and the tail {}: {}",
                    new_tail,
                    old_tail,
                    err
                );
                return Err(err);
            }
        };

        // revert errors can be skipped: the walked blocks are off the
        // canonical chain either way
        if let Err(err) = self.revert_blocks(&ancestor, &old_tail) {
            tracing::error!(
                "failed to revert the blocks between {} and {}: {}",
                ancestor,
                old_tail,
                err
            );
        }

        if let Err(err) = self.build_height_index(&ancestor, &new_tail) {
            tracing::error!(
                "failed to rebuild the height index between {} and {}: {}",
                ancestor,
                new_tail,
                err
            );
            return Err(err);
        }

        self.storage.put_tail_hash(new_tail.hash())?;

        tracing::info!("switching tail from {} to {}", old_tail, new_tail);
        self.metrics.set_tail_block(&new_tail);
        self.tail.update(new_tail);
        Ok(())
    }

    /// Fetch up to `limit` blocks of the canonical chain strictly
    /// after the given block, towards the current tail.
    pub fn fetch_descendants(&self, block: &Block, limit: usize) -> Result<Vec<Arc<Block>>> {
        let tail_height = self.tail.block().height();
        let mut descendants = Vec::new();
        let mut height = block.height() + 1;
        while height <= tail_height && descendants.len() < limit {
            let descendant = self.get_block_by_height(height)?.ok_or_else(|| {
                tracing::error!("no block in the canonical chain at height {}", height);
                Error::CannotFindBlockAtGivenHeight(height)
            })?;
            descendants.push(descendant);
            height += 1;
        }
        Ok(descendants)
    }

    /// The lowest gas price among the transactions of the nearest
    /// ancestor of the tail that carries any, or the default price if
    /// the chain is empty of transactions.
    pub fn gas_price(&self) -> u64 {
        let mut block = self.tail.block();
        while !block.is_genesis() && block.transactions().is_empty() {
            match self.get_block(block.parent_hash()) {
                Ok(Some(parent)) => block = parent,
                _ => break,
            }
        }

        if block.transactions().is_empty() {
            DEFAULT_GAS_PRICE
        } else {
            block
                .transactions()
                .iter()
                .fold(MAX_GAS_PRICE, |price, tx| price.min(tx.gas_price()))
        }
    }

    /// Estimate the gas the transaction will consume: its declared
    /// minimum cost, capped by the per-transaction gas ceiling.
    /// Execution may charge more, never less.
    pub fn estimate_gas(&self, tx: &Transaction) -> u64 {
        tx.min_gas().min(MAX_GAS)
    }

    /// Render the last `count` blocks of the canonical chain, newest
    /// first, as a bracketed list.
    pub fn dump(&self, count: usize) -> String {
        if count == 0 {
            return "[]".to_string();
        }
        let mut entries = Vec::new();
        let mut block = self.tail.block();
        entries.push(block.to_string());
        for _ in 1..count {
            if block.is_genesis() {
                break;
            }
            match self.get_block(block.parent_hash()) {
                Ok(Some(parent)) => {
                    entries.push(parent.to_string());
                    block = parent;
                }
                _ => break,
            }
        }
        format!("[{}]", entries.join(","))
    }

    fn parent_block(&self, block: &Block) -> Result<Arc<Block>> {
        self.get_block(block.parent_hash())?
            .ok_or(Error::MissingParentBlock(*block.parent_hash()))
    }

    /// Walk from `from` down to `ancestor` (excluded) and return the
    /// transactions of every walked block to the pool.
    fn revert_blocks(&self, ancestor: &Block, from: &Arc<Block>) -> Result<()> {
        let mut reverted = Arc::clone(from);
        let mut revert_count = 0u64;
        while reverted.hash() != ancestor.hash() {
            if let Some(pool) = &self.tx_pool {
                for tx in reverted.transactions() {
                    pool.return_transaction(tx.clone());
                }
            }
            tracing::warn!("reverted block {}", reverted);
            revert_count += 1;

            reverted = self.parent_block(&reverted)?;
        }
        if revert_count > 0 {
            self.metrics.add_reverted_blocks(revert_count);
        }
        Ok(())
    }

    /// Walk from `to` down to `ancestor` (excluded) and point the
    /// height index at every walked block.
    fn build_height_index(&self, ancestor: &Block, to: &Arc<Block>) -> Result<()> {
        let mut cursor = Arc::clone(to);
        while cursor.hash() != ancestor.hash() {
            self.storage.put_height_index(cursor.height(), cursor.hash())?;
            cursor = self.parent_block(&cursor)?;
        }
        Ok(())
    }

    fn load_block(
        storage: &Storage,
        emitter: Option<&dyn EventEmitter>,
        hash: &Hash,
    ) -> Result<Option<Arc<Block>>> {
        let block = match storage.get_block(hash)? {
            None => return Ok(None),
            Some(block) => Arc::new(block),
        };
        if let Some(emitter) = emitter {
            let event = Event::BlockLoaded {
                hash: *block.hash(),
                height: block.height(),
            };
            if let Err(err) = emitter.emit(event) {
                tracing::warn!("cannot emit chain event: {}", err);
            }
        }
        Ok(Some(block))
    }

    fn load_genesis(storage: &Storage, config: &GenesisConfig) -> Result<Arc<Block>> {
        match storage.get_genesis()? {
            Some(stored) => {
                if stored.chain_id() != config.chain_id {
                    tracing::error!(
                        "genesis block {} in storage was made for chain id {}, \
                         the node is configured for chain id {}",
                        stored,
                        stored.chain_id(),
                        config.chain_id
                    );
                    return Err(Error::GenesisConfNotMatch {
                        configured: config.chain_id,
                        stored: stored.chain_id(),
                    });
                }
                Ok(Arc::new(stored))
            }
            None => {
                let genesis = config.build_block();
                storage.put_block(&genesis)?;
                storage.put_genesis(&genesis)?;
                storage.put_height_index(genesis.height(), genesis.hash())?;
                tracing::info!("created the genesis block {}", genesis);
                Ok(Arc::new(genesis))
            }
        }
    }

    fn load_tail(
        storage: &Storage,
        genesis_block: &Arc<Block>,
        emitter: Option<&dyn EventEmitter>,
    ) -> Result<Arc<Block>> {
        match storage.get_tail_hash()? {
            None => {
                storage.put_tail_hash(genesis_block.hash())?;
                Ok(Arc::clone(genesis_block))
            }
            Some(hash) => Self::load_block(storage, emitter, &hash)?
                .ok_or(Error::MissingTailBlock(hash)),
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
