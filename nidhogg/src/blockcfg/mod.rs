//! The blockchain data model: hashes, addresses, transactions, blocks
//! and the genesis configuration, along with their canonical binary
//! representation.

pub mod block;
pub mod genesis;
pub mod key;
pub mod transaction;

pub use self::{
    block::{Block, BlockHeader},
    genesis::GenesisConfig,
    key::{Address, Hash},
    transaction::Transaction,
};
