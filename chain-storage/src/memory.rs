use super::error::Error;
use super::store::KeyValueStore;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory storage backend.
///
/// Cloning yields another handle on the same map, so a store can be
/// handed both to the chain and to a test harness inspecting it.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>, Error> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or(Error::KeyNotFound)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn put_get() {
        let store = MemoryStore::new();

        assert!(matches!(store.get(b"tip"), Err(Error::KeyNotFound)));

        store.put(b"tip", b"0000").unwrap();
        assert_eq!(store.get(b"tip").unwrap(), b"0000");

        store.put(b"tip", b"0001").unwrap();
        assert_eq!(store.get(b"tip").unwrap(), b"0001");
    }

    #[test]
    fn contains() {
        let store = MemoryStore::new();
        assert!(!store.contains(b"genesis").unwrap());
        store.put(b"genesis", &[]).unwrap();
        assert!(store.contains(b"genesis").unwrap());
    }

    #[test]
    fn clones_share_the_map() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.put(&[1, 2, 3], &[4]).unwrap();
        assert_eq!(other.get(&[1, 2, 3]).unwrap(), [4]);
    }
}
