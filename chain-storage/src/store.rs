use super::error::Error;

/// Contract of the storage backend the chain is persisted in.
///
/// The store is a flat byte-keyed namespace; the chain layers its own
/// keyspaces on top of it. Implementations are shared between the
/// chain tasks, so they take `&self` and are expected to provide
/// their own interior synchronization.
pub trait KeyValueStore: Send + Sync {
    /// Write a value under the given key, overwriting any previous
    /// value stored there.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error>;

    /// Fetch the value stored under the given key.
    ///
    /// Returns `Error::KeyNotFound` when the key has no entry.
    fn get(&self, key: &[u8]) -> Result<Vec<u8>, Error>;

    /// Check whether a key has an entry.
    fn contains(&self, key: &[u8]) -> Result<bool, Error> {
        match self.get(key) {
            Ok(_) => Ok(true),
            Err(Error::KeyNotFound) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
