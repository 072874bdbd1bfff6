//! Persistence of the chain on top of the raw key-value store.
//!
//! Four disjoint keyspaces share the flat namespace of the backend:
//!
//! * 32-byte block hash -> encoded block (content addressed records);
//! * 8-byte big-endian height -> 32-byte block hash (the canonical
//!   height index);
//! * `"blockchain_tail"` -> 32-byte hash of the canonical tail block;
//! * `"genesis"` -> encoded genesis block (fixed anchor).
//!
//! A `KeyNotFound` from the backend is a miss and comes back as
//! `Ok(None)`; every other backend failure is surfaced unchanged. A
//! record that is present but does not decode is data corruption and
//! is always an error.

use crate::blockcfg::{Block, Hash};
use chain_core::property::{Block as _, Deserialize as _};
use chain_storage::KeyValueStore;
use std::sync::Arc;
use thiserror::Error;

/// Key under which the hash of the canonical tail block is stored.
const TAIL_KEY: &[u8] = b"blockchain_tail";

/// Key under which the encoded genesis block is anchored.
const GENESIS_KEY: &[u8] = b"genesis";

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage backend error")]
    Backend(#[source] chain_storage::Error),

    #[error("stored block `{0}` cannot be decoded")]
    BlockCorrupted(Hash),

    #[error("stored genesis block cannot be decoded")]
    GenesisCorrupted,

    #[error("height index entry at height {0} is not a valid hash")]
    IndexCorrupted(u64),

    #[error("stored tail pointer is not a valid hash")]
    TailCorrupted,
}

/// Handle on the persisted chain. Cloning is cheap and all clones
/// talk to the same backend.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Storage { inner }
    }

    fn height_key(height: u64) -> [u8; 8] {
        height.to_be_bytes()
    }

    pub fn put_block(&self, block: &Block) -> Result<(), Error> {
        self.inner
            .put(block.id().as_ref(), &block.to_bytes())
            .map_err(Error::Backend)
    }

    pub fn get_block(&self, hash: &Hash) -> Result<Option<Block>, Error> {
        match self.inner.get(hash.as_ref()) {
            Ok(bytes) => Block::deserialize(&bytes[..])
                .map(Some)
                .map_err(|_| Error::BlockCorrupted(*hash)),
            Err(chain_storage::Error::KeyNotFound) => Ok(None),
            Err(err) => Err(Error::Backend(err)),
        }
    }

    pub fn block_exists(&self, hash: &Hash) -> Result<bool, Error> {
        self.inner.contains(hash.as_ref()).map_err(Error::Backend)
    }

    pub fn put_height_index(&self, height: u64, hash: &Hash) -> Result<(), Error> {
        self.inner
            .put(&Self::height_key(height), hash.as_ref())
            .map_err(Error::Backend)
    }

    pub fn get_height_index(&self, height: u64) -> Result<Option<Hash>, Error> {
        match self.inner.get(&Self::height_key(height)) {
            Ok(bytes) => Hash::try_from_slice(&bytes)
                .map(Some)
                .ok_or(Error::IndexCorrupted(height)),
            Err(chain_storage::Error::KeyNotFound) => Ok(None),
            Err(err) => Err(Error::Backend(err)),
        }
    }

    pub fn put_tail_hash(&self, hash: &Hash) -> Result<(), Error> {
        self.inner.put(TAIL_KEY, hash.as_ref()).map_err(Error::Backend)
    }

    pub fn get_tail_hash(&self) -> Result<Option<Hash>, Error> {
        match self.inner.get(TAIL_KEY) {
            Ok(bytes) => Hash::try_from_slice(&bytes)
                .map(Some)
                .ok_or(Error::TailCorrupted),
            Err(chain_storage::Error::KeyNotFound) => Ok(None),
            Err(err) => Err(Error::Backend(err)),
        }
    }

    pub fn put_genesis(&self, block: &Block) -> Result<(), Error> {
        self.inner
            .put(GENESIS_KEY, &block.to_bytes())
            .map_err(Error::Backend)
    }

    pub fn get_genesis(&self) -> Result<Option<Block>, Error> {
        match self.inner.get(GENESIS_KEY) {
            Ok(bytes) => Block::deserialize(&bytes[..])
                .map(Some)
                .map_err(|_| Error::GenesisCorrupted),
            Err(chain_storage::Error::KeyNotFound) => Ok(None),
            Err(err) => Err(Error::Backend(err)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::blockcfg::{Address, BlockHeader, GenesisConfig};
    use chain_storage::MemoryStore;

    fn storage() -> (Storage, MemoryStore) {
        let backend = MemoryStore::new();
        (Storage::new(Arc::new(backend.clone())), backend)
    }

    fn block(height: u64, parent_hash: Hash) -> Block {
        Block::new(
            BlockHeader {
                chain_id: 1,
                parent_hash,
                coinbase: Address::zero(),
                timestamp: 0,
                height,
                state_root: Hash::zero(),
            },
            vec![],
        )
    }

    #[test]
    fn block_round_trip() {
        let (storage, _) = storage();
        let block = block(1, Hash::hash_bytes(b"parent"));

        assert!(storage.get_block(block.hash()).unwrap().is_none());
        storage.put_block(&block).unwrap();
        assert_eq!(storage.get_block(block.hash()).unwrap().unwrap(), block);
        assert!(storage.block_exists(block.hash()).unwrap());
    }

    #[test]
    fn height_index_round_trip() {
        let (storage, _) = storage();
        let hash = Hash::hash_bytes(b"block");

        assert!(storage.get_height_index(7).unwrap().is_none());
        storage.put_height_index(7, &hash).unwrap();
        assert_eq!(storage.get_height_index(7).unwrap(), Some(hash));

        // overwriting is how a reorg reclaims a height
        let other = Hash::hash_bytes(b"other");
        storage.put_height_index(7, &other).unwrap();
        assert_eq!(storage.get_height_index(7).unwrap(), Some(other));
    }

    #[test]
    fn tail_pointer_round_trip() {
        let (storage, _) = storage();
        let hash = Hash::hash_bytes(b"tail");

        assert!(storage.get_tail_hash().unwrap().is_none());
        storage.put_tail_hash(&hash).unwrap();
        assert_eq!(storage.get_tail_hash().unwrap(), Some(hash));
    }

    #[test]
    fn genesis_anchor_round_trip() {
        let (storage, _) = storage();
        let genesis = GenesisConfig {
            chain_id: 1,
            timestamp: 0,
        }
        .build_block();

        assert!(storage.get_genesis().unwrap().is_none());
        storage.put_genesis(&genesis).unwrap();
        assert_eq!(storage.get_genesis().unwrap().unwrap(), genesis);
    }

    #[test]
    fn garbage_block_record_is_corruption() {
        use chain_storage::KeyValueStore as _;

        let (storage, backend) = storage();
        let hash = Hash::hash_bytes(b"block");
        backend.put(hash.as_ref(), b"garbage").unwrap();

        assert!(matches!(
            storage.get_block(&hash),
            Err(Error::BlockCorrupted(h)) if h == hash
        ));
    }

    #[test]
    fn garbage_index_entry_is_corruption() {
        use chain_storage::KeyValueStore as _;

        let (storage, backend) = storage();
        backend.put(&9u64.to_be_bytes(), b"not-a-hash").unwrap();

        assert!(matches!(
            storage.get_height_index(9),
            Err(Error::IndexCorrupted(9))
        ));
    }
}
