//! Hashes and addresses used to identify the various chain components.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use chain_core::property;
use std::fmt;

pub const HASH_LENGTH: usize = 32;
pub const ADDRESS_LENGTH: usize = 20;

type Blake2b256 = Blake2b<U32>;

/// Hash that is used as an address of the various components
/// (blocks, transactions). Content derived: two different objects
/// have two different hashes.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; HASH_LENGTH]);

impl Hash {
    pub fn hash_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Blake2b256::new();
        hasher.update(bytes);
        let mut out = [0u8; HASH_LENGTH];
        out.copy_from_slice(&hasher.finalize());
        Hash(out)
    }

    /// The all-zero hash, used as the parent of the genesis block.
    pub fn zero() -> Self {
        Hash([0u8; HASH_LENGTH])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LENGTH]
    }

    pub fn try_from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != HASH_LENGTH {
            return None;
        }
        let mut out = [0u8; HASH_LENGTH];
        out.copy_from_slice(slice);
        Some(Hash(out))
    }

    /// Fold the hash down to a 64-bit value, for gauges that cannot
    /// carry the full digest.
    pub fn prefix_u64(&self) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(buf)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_LENGTH]> for Hash {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Hash(bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash(0x{})", hex::encode(self.0))
    }
}

impl property::BlockId for Hash {
    fn zero() -> Self {
        Hash::zero()
    }
}

/// Account address, credited with the block reward when used as a
/// block's coinbase.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub fn zero() -> Self {
        Address([0u8; ADDRESS_LENGTH])
    }

    pub fn try_from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != ADDRESS_LENGTH {
            return None;
        }
        let mut out = [0u8; ADDRESS_LENGTH];
        out.copy_from_slice(slice);
        Some(Address(out))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(self.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    impl Arbitrary for Hash {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            let mut bytes = [0u8; HASH_LENGTH];
            for byte in bytes.iter_mut() {
                *byte = Arbitrary::arbitrary(g);
            }
            Hash(bytes)
        }
    }

    impl Arbitrary for Address {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            let mut bytes = [0u8; ADDRESS_LENGTH];
            for byte in bytes.iter_mut() {
                *byte = Arbitrary::arbitrary(g);
            }
            Address(bytes)
        }
    }

    #[test]
    fn hash_is_content_derived() {
        assert_eq!(Hash::hash_bytes(b"a"), Hash::hash_bytes(b"a"));
        assert_ne!(Hash::hash_bytes(b"a"), Hash::hash_bytes(b"b"));
    }

    #[test]
    fn zero_hash_is_zero() {
        assert!(Hash::zero().is_zero());
        assert!(!Hash::hash_bytes(b"").is_zero());
    }

    #[test]
    fn try_from_slice_checks_length() {
        assert!(Hash::try_from_slice(&[0u8; HASH_LENGTH]).is_some());
        assert!(Hash::try_from_slice(&[0u8; HASH_LENGTH - 1]).is_none());
        assert!(Address::try_from_slice(&[0u8; ADDRESS_LENGTH + 1]).is_none());
    }
}
