mod cache;
mod chain;
pub mod storage;
mod tails;
mod tip;

pub use self::{
    cache::BlockCache,
    chain::{Blockchain, Error, Result, BLOCK_CACHE_CAPACITY, DETACHED_TAILS_CAPACITY},
    storage::Storage,
    tails::DetachedTails,
    tip::Tip,
};
