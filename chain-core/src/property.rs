//! chain core properties
//!
//! define the different properties a _supported_ chain object needs to
//! implement to work in our models.
//!
//! # Block
//!
//! The Block is the atomic element that composes a chain. The
//! [`Block`] trait gives access to the identifier of a block, to the
//! identifier of its parent and to its position in the chain: all the
//! chain-management models need to navigate the tree of blocks.
//!
//! # Serialize and Deserialize
//!
//! The central contract is the canonical binary representation: every
//! object that ends up in the storage implements [`Serialize`] and
//! [`Deserialize`], and decoding the encoded bytes yields the original
//! object back (see `testing::serialization_bijection`).

use std::fmt::Debug;
use std::hash::Hash;
use std::io::{BufRead, Write};

/// Define that an object can be written to a `Write` object in its
/// canonical binary representation.
pub trait Serialize {
    type Error: std::error::Error + From<std::io::Error>;

    fn serialize<W: Write>(&self, writer: W) -> Result<(), Self::Error>;

    /// Convenience method to serialize into a byte vector.
    fn serialize_as_vec(&self) -> Result<Vec<u8>, Self::Error> {
        let mut data = vec![];
        self.serialize(&mut data)?;
        Ok(data)
    }
}

/// Define that an object can be read from a `BufRead` object holding
/// its canonical binary representation.
pub trait Deserialize: Sized {
    type Error: std::error::Error + From<std::io::Error>;

    fn deserialize<R: BufRead>(reader: R) -> Result<Self, Self::Error>;
}

/// Block property
///
/// a block is part of a chain of blocks called Blockchain.
/// the chaining is done via one block pointing to another block,
/// the parent block (the previous block).
///
/// This means that a blockchain is a link-list, ordered from the most
/// recent block to the furthest/oldest block.
///
/// The Oldest block is called the Genesis Block.
pub trait Block {
    /// the Block identifier. It must be unique. This mean that
    /// 2 different blocks have 2 different identifiers.
    type Id: BlockId;

    /// return the Block's identifier.
    fn id(&self) -> Self::Id;

    /// get the parent block identifier (the previous block in the
    /// blockchain).
    fn parent_id(&self) -> Self::Id;

    /// get the position of the block relative to the genesis block
    /// of the chain.
    fn height(&self) -> u64;
}

pub trait BlockId: Eq + Clone + Debug + Hash + AsRef<[u8]> {
    /// the identifier no real block carries: the parent identifier
    /// of the genesis block.
    fn zero() -> Self;
}

/// accessor to the transactions within a block
pub trait HasTransactions {
    type Transaction;

    /// returns an iterator over the Transactions
    fn transactions(&self) -> std::slice::Iter<'_, Self::Transaction>;
}

#[cfg(feature = "property-test-api")]
pub mod testing {
    use super::*;
    use quickcheck::{Arbitrary, TestResult};
    use std::io::Cursor;

    /// test that any arbitrary given object can serialize and deserialize
    /// back into itself (i.e. it is a bijection, or a one to one match
    /// between the serialized bytes and the object)
    pub fn serialization_bijection<T>(t: T) -> TestResult
    where
        T: Arbitrary + Serialize + Deserialize + Eq,
    {
        let vec = match t.serialize_as_vec() {
            Err(error) => return TestResult::error(format!("serialization: {}", error)),
            Ok(v) => v,
        };
        let decoded_t = match T::deserialize(Cursor::new(vec)) {
            Err(error) => return TestResult::error(format!("deserialization: {}", error)),
            Ok(v) => v,
        };
        TestResult::from_bool(decoded_t == t)
    }
}
