//! Transactions as the chain manager sees them: opaque payloads with
//! the accounting fields needed for gas pricing and pool management.
//! Verification and execution happen elsewhere.

use super::key::{Address, Hash};
use chain_core::packer::Codec;
use chain_core::property::{self, Serialize as _};
use std::fmt;
use std::io::{BufRead, Write};

/// Gas charged for any transaction, independently of its payload.
pub const MIN_GAS_PER_TRANSACTION: u64 = 20_000;
/// Additional gas charged per byte of payload.
pub const GAS_PER_BYTE: u64 = 1;
/// Gas price assumed when the chain holds no transaction to price from.
pub const DEFAULT_GAS_PRICE: u64 = 1_000_000;
/// Upper bound on the gas price the chain will ever quote.
pub const MAX_GAS_PRICE: u64 = 1_000_000_000;
/// Upper bound on the gas a single transaction may consume.
pub const MAX_GAS: u64 = 50_000_000_000;

#[derive(Clone, PartialEq, Eq)]
pub struct Transaction {
    hash: Hash,
    chain_id: u32,
    from: Address,
    to: Address,
    value: u64,
    nonce: u64,
    timestamp: u64,
    gas_price: u64,
    gas_limit: u64,
    payload: Vec<u8>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain_id: u32,
        from: Address,
        to: Address,
        value: u64,
        nonce: u64,
        timestamp: u64,
        gas_price: u64,
        gas_limit: u64,
        payload: Vec<u8>,
    ) -> Self {
        let mut tx = Transaction {
            hash: Hash::zero(),
            chain_id,
            from,
            to,
            value,
            nonce,
            timestamp,
            gas_price,
            gas_limit,
            payload,
        };
        tx.hash = Hash::hash_bytes(&tx.content_bytes());
        tx
    }

    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    pub fn chain_id(&self) -> u32 {
        self.chain_id
    }

    pub fn from(&self) -> &Address {
        &self.from
    }

    pub fn to(&self) -> &Address {
        &self.to
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn gas_price(&self) -> u64 {
        self.gas_price
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The minimum amount of gas this transaction can consume: the
    /// flat per-transaction charge plus the per-byte payload charge.
    pub fn min_gas(&self) -> u64 {
        MIN_GAS_PER_TRANSACTION + GAS_PER_BYTE * self.payload.len() as u64
    }

    fn content_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.serialize(&mut bytes)
            .expect("serialization into memory never fails");
        bytes
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("hash", &self.hash)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("value", &self.value)
            .field("nonce", &self.nonce)
            .finish()
    }
}

impl property::Serialize for Transaction {
    type Error = std::io::Error;

    fn serialize<W: Write>(&self, writer: W) -> Result<(), Self::Error> {
        let mut codec = Codec::from(writer);
        codec.put_u32(self.chain_id)?;
        codec.put_bytes(self.from.as_ref())?;
        codec.put_bytes(self.to.as_ref())?;
        codec.put_u64(self.value)?;
        codec.put_u64(self.nonce)?;
        codec.put_u64(self.timestamp)?;
        codec.put_u64(self.gas_price)?;
        codec.put_u64(self.gas_limit)?;
        codec.put_u32(self.payload.len() as u32)?;
        codec.put_bytes(&self.payload)?;
        Ok(())
    }
}

impl property::Deserialize for Transaction {
    type Error = std::io::Error;

    fn deserialize<R: BufRead>(reader: R) -> Result<Self, Self::Error> {
        use super::key::ADDRESS_LENGTH;
        use std::io::Read;

        let mut codec = Codec::from(reader);
        let chain_id = codec.get_u32()?;
        let mut from = [0u8; ADDRESS_LENGTH];
        codec.read_exact(&mut from)?;
        let mut to = [0u8; ADDRESS_LENGTH];
        codec.read_exact(&mut to)?;
        let value = codec.get_u64()?;
        let nonce = codec.get_u64()?;
        let timestamp = codec.get_u64()?;
        let gas_price = codec.get_u64()?;
        let gas_limit = codec.get_u64()?;
        let payload_len = codec.get_u32()? as usize;
        let payload = codec.get_bytes(payload_len)?;

        Ok(Transaction::new(
            chain_id,
            Address::from(from),
            Address::from(to),
            value,
            nonce,
            timestamp,
            gas_price,
            gas_limit,
            payload,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chain_core::property::testing;
    use quickcheck::{quickcheck, Arbitrary, Gen, TestResult};

    quickcheck! {
        fn transaction_serialization_bijection(tx: Transaction) -> TestResult {
            testing::serialization_bijection(tx)
        }
    }

    impl Arbitrary for Transaction {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            Transaction::new(
                Arbitrary::arbitrary(g),
                Arbitrary::arbitrary(g),
                Arbitrary::arbitrary(g),
                Arbitrary::arbitrary(g),
                Arbitrary::arbitrary(g),
                Arbitrary::arbitrary(g),
                Arbitrary::arbitrary(g),
                Arbitrary::arbitrary(g),
                Arbitrary::arbitrary(g),
            )
        }
    }

    #[test]
    fn min_gas_counts_payload_bytes() {
        let tx = Transaction::new(
            1,
            Address::zero(),
            Address::zero(),
            10,
            0,
            0,
            DEFAULT_GAS_PRICE,
            MAX_GAS,
            vec![0u8; 16],
        );
        assert_eq!(tx.min_gas(), MIN_GAS_PER_TRANSACTION + 16 * GAS_PER_BYTE);
    }

    #[test]
    fn hash_covers_the_content() {
        let tx = |nonce| {
            Transaction::new(
                1,
                Address::zero(),
                Address::zero(),
                10,
                nonce,
                0,
                DEFAULT_GAS_PRICE,
                MAX_GAS,
                vec![],
            )
        };
        assert_eq!(tx(0).hash(), tx(0).hash());
        assert_ne!(tx(0).hash(), tx(1).hash());
    }
}
