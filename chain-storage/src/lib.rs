mod error;
mod memory;
mod store;

pub use self::{error::Error, memory::MemoryStore, store::KeyValueStore};
