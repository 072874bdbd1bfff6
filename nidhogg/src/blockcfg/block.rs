//! Representation of the blocks in the chain.

use super::key::{Address, Hash, ADDRESS_LENGTH, HASH_LENGTH};
use super::transaction::Transaction;
use chain_core::packer::Codec;
use chain_core::property::{self, Deserialize as _, Serialize as _};
use std::fmt;
use std::io::{BufRead, Read, Write};

/// `BlockHeader` carries the linking and accounting information of a
/// block; everything needed to place the block in the chain without
/// touching its transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// chain this block belongs to; must match the node configuration.
    pub chain_id: u32,
    /// hash of the predecessor block, zero for the genesis block.
    pub parent_hash: Hash,
    /// address credited with the block reward.
    pub coinbase: Address,
    /// seconds since the epoch at block creation.
    pub timestamp: u64,
    /// position of the block in the chain; the genesis block is at 0
    /// and every other block is at `parent.height + 1`.
    pub height: u64,
    /// root of the account state after this block, computed by the
    /// execution layer.
    pub state_root: Hash,
}

/// `Block` is an element of the blockchain. It contains an ordered
/// sequence of transactions and a reference to the parent block,
/// alongside its own content-derived hash.
///
/// The hash is computed at construction (and at decoding), so a
/// `Block` in memory is always consistent with its identity; there is
/// no way to mutate the content from outside.
#[derive(Clone, PartialEq, Eq)]
pub struct Block {
    hash: Hash,
    header: BlockHeader,
    transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        let mut block = Block {
            hash: Hash::zero(),
            header,
            transactions,
        };
        block.hash = Hash::hash_bytes(&block.content_bytes());
        block
    }

    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn chain_id(&self) -> u32 {
        self.header.chain_id
    }

    pub fn parent_hash(&self) -> &Hash {
        &self.header.parent_hash
    }

    pub fn coinbase(&self) -> &Address {
        &self.header.coinbase
    }

    pub fn timestamp(&self) -> u64 {
        self.header.timestamp
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn state_root(&self) -> &Hash {
        &self.header.state_root
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The genesis block is the only block at height 0 and the only
    /// block whose parent is the zero hash.
    pub fn is_genesis(&self) -> bool {
        self.header.height == 0 && self.header.parent_hash.is_zero()
    }

    /// Canonical binary representation of the block.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.content_bytes()
    }

    fn content_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.serialize(&mut bytes)
            .expect("serialization into memory never fails");
        bytes
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"height\": {}, \"hash\": \"{}\", \"parent\": \"{}\", \"transactions\": {}}}",
            self.header.height,
            self.hash,
            self.header.parent_hash,
            self.transactions.len(),
        )
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("hash", &self.hash)
            .field("header", &self.header)
            .field("transactions", &self.transactions.len())
            .finish()
    }
}

impl property::Block for Block {
    type Id = Hash;

    fn id(&self) -> Hash {
        self.hash
    }

    fn parent_id(&self) -> Hash {
        self.header.parent_hash
    }

    fn height(&self) -> u64 {
        self.header.height
    }
}

impl property::HasTransactions for Block {
    type Transaction = Transaction;

    fn transactions(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }
}

impl property::Serialize for BlockHeader {
    type Error = std::io::Error;

    fn serialize<W: Write>(&self, writer: W) -> Result<(), Self::Error> {
        let mut codec = Codec::from(writer);
        codec.put_u32(self.chain_id)?;
        codec.put_bytes(self.parent_hash.as_ref())?;
        codec.put_bytes(self.coinbase.as_ref())?;
        codec.put_u64(self.timestamp)?;
        codec.put_u64(self.height)?;
        codec.put_bytes(self.state_root.as_ref())?;
        Ok(())
    }
}

impl property::Deserialize for BlockHeader {
    type Error = std::io::Error;

    fn deserialize<R: BufRead>(reader: R) -> Result<Self, Self::Error> {
        let mut codec = Codec::from(reader);
        let chain_id = codec.get_u32()?;
        let mut parent_hash = [0u8; HASH_LENGTH];
        codec.read_exact(&mut parent_hash)?;
        let mut coinbase = [0u8; ADDRESS_LENGTH];
        codec.read_exact(&mut coinbase)?;
        let timestamp = codec.get_u64()?;
        let height = codec.get_u64()?;
        let mut state_root = [0u8; HASH_LENGTH];
        codec.read_exact(&mut state_root)?;

        Ok(BlockHeader {
            chain_id,
            parent_hash: Hash::from(parent_hash),
            coinbase: Address::from(coinbase),
            timestamp,
            height,
            state_root: Hash::from(state_root),
        })
    }
}

impl property::Serialize for Block {
    type Error = std::io::Error;

    fn serialize<W: Write>(&self, writer: W) -> Result<(), Self::Error> {
        let mut codec = Codec::from(writer);
        self.header.serialize(&mut codec)?;
        codec.put_u16(self.transactions.len() as u16)?;
        for t in self.transactions.iter() {
            t.serialize(&mut codec)?;
        }
        Ok(())
    }
}

impl property::Deserialize for Block {
    type Error = std::io::Error;

    fn deserialize<R: BufRead>(reader: R) -> Result<Self, Self::Error> {
        let mut codec = Codec::from(reader);
        let header = BlockHeader::deserialize(&mut codec)?;
        let num_transactions = codec.get_u16()? as usize;
        let mut transactions = Vec::with_capacity(num_transactions);
        for _ in 0..num_transactions {
            transactions.push(Transaction::deserialize(&mut codec)?);
        }
        Ok(Block::new(header, transactions))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chain_core::property::testing;
    use quickcheck::{quickcheck, Arbitrary, Gen, TestResult};

    quickcheck! {
        fn block_serialization_bijection(b: Block) -> TestResult {
            testing::serialization_bijection(b)
        }
    }

    impl Arbitrary for BlockHeader {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            BlockHeader {
                chain_id: Arbitrary::arbitrary(g),
                parent_hash: Arbitrary::arbitrary(g),
                coinbase: Arbitrary::arbitrary(g),
                timestamp: Arbitrary::arbitrary(g),
                height: Arbitrary::arbitrary(g),
                state_root: Arbitrary::arbitrary(g),
            }
        }
    }

    impl Arbitrary for Block {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            Block::new(Arbitrary::arbitrary(g), Arbitrary::arbitrary(g))
        }
    }

    #[test]
    fn hash_covers_header_and_transactions() {
        let header = |height| BlockHeader {
            chain_id: 1,
            parent_hash: Hash::zero(),
            coinbase: Address::zero(),
            timestamp: 7,
            height,
            state_root: Hash::zero(),
        };
        let a = Block::new(header(1), vec![]);
        let b = Block::new(header(1), vec![]);
        let c = Block::new(header(2), vec![]);
        assert_eq!(a.hash(), b.hash());
        assert_ne!(a.hash(), c.hash());
    }

    #[test]
    fn block_properties_expose_the_chain_links() {
        use chain_core::property::Block as _;

        let parent = Hash::hash_bytes(b"parent");
        let block = Block::new(
            BlockHeader {
                chain_id: 1,
                parent_hash: parent,
                coinbase: Address::zero(),
                timestamp: 0,
                height: 4,
                state_root: Hash::zero(),
            },
            vec![],
        );

        assert_eq!(block.id(), *block.hash());
        assert_eq!(block.parent_id(), parent);
        assert_eq!(property::HasTransactions::transactions(&block).count(), 0);
        assert_eq!(<Hash as property::BlockId>::zero(), Hash::zero());
    }

    #[test]
    fn decoding_restores_the_hash() {
        let block = Block::new(
            BlockHeader {
                chain_id: 1,
                parent_hash: Hash::hash_bytes(b"parent"),
                coinbase: Address::zero(),
                timestamp: 42,
                height: 3,
                state_root: Hash::hash_bytes(b"state"),
            },
            vec![],
        );
        let bytes = block.serialize_as_vec().unwrap();
        let decoded = Block::deserialize(&bytes[..]).unwrap();
        assert_eq!(decoded.hash(), block.hash());
    }
}
