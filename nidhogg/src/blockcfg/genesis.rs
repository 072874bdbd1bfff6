//! Genesis configuration and the construction of the genesis block.

use super::block::{Block, BlockHeader};
use super::key::{Address, Hash};
use serde::{Deserialize, Serialize};

/// Height of the genesis block; the height index covers
/// `[GENESIS_HEIGHT, tail.height]`.
pub const GENESIS_HEIGHT: u64 = 0;

/// The part of the node configuration that pins down which chain this
/// node is on. Loaded from the node's configuration file; two nodes
/// agree on a chain if and only if they agree on this structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub chain_id: u32,
    pub timestamp: u64,
}

impl GenesisConfig {
    /// Build the genesis block this configuration describes. The
    /// result is deterministic: the same configuration always builds
    /// a block with the same hash.
    pub fn build_block(&self) -> Block {
        Block::new(
            BlockHeader {
                chain_id: self.chain_id,
                parent_hash: Hash::zero(),
                coinbase: Address::zero(),
                timestamp: self.timestamp,
                height: GENESIS_HEIGHT,
                state_root: Hash::zero(),
            },
            Vec::new(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn genesis_block_is_genesis() {
        let config = GenesisConfig {
            chain_id: 1,
            timestamp: 0,
        };
        let block = config.build_block();
        assert!(block.is_genesis());
        assert_eq!(block.height(), GENESIS_HEIGHT);
        assert!(block.parent_hash().is_zero());
        assert!(block.transactions().is_empty());
    }

    #[test]
    fn same_config_same_hash() {
        let config = GenesisConfig {
            chain_id: 1,
            timestamp: 1_522_377_345,
        };
        assert_eq!(config.build_block().hash(), config.build_block().hash());

        let other = GenesisConfig {
            chain_id: 2,
            timestamp: 1_522_377_345,
        };
        assert_ne!(config.build_block().hash(), other.build_block().hash());
    }
}
