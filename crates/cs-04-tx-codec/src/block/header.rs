//! 80-byte block headers.

use cs_01_binary_codec::{ByteReader, ByteWriter, CodecError};
use primitive_types::U256;
use shared_crypto::sha256d;
use shared_types::{display_hash, BlockHash, ChainType, Hash};

use super::work::{target_from_compact, Work};
use crate::error::ParseError;

/// Serialized header length.
pub const HEADER_SIZE: usize = 80;

/// A block header tagged with the chain it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Header {
    chain: ChainType,
    version: i32,
    previous: BlockHash,
    merkle_root: Hash,
    timestamp: u32,
    nbits: u32,
    nonce: u32,
    hash: BlockHash,
}

impl Header {
    pub fn new(
        chain: ChainType,
        version: i32,
        previous: BlockHash,
        merkle_root: Hash,
        timestamp: u32,
        nbits: u32,
        nonce: u32,
    ) -> Self {
        let mut header = Self {
            chain,
            version,
            previous,
            merkle_root,
            timestamp,
            nbits,
            nonce,
            hash: [0u8; 32],
        };
        header.hash = sha256d(&header.serialize());
        header
    }

    /// Parse a standalone header; the buffer must be exactly 80 bytes.
    pub fn parse(chain: ChainType, bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() != HEADER_SIZE {
            return Err(ParseError::InvalidHeaderSize(bytes.len()));
        }
        Self::read(chain, &mut ByteReader::new(bytes))
    }

    pub(crate) fn read(chain: ChainType, reader: &mut ByteReader<'_>) -> Result<Self, ParseError> {
        let (version, previous, merkle_root, timestamp, nbits, nonce) =
            read_fields(reader).map_err(ParseError::codec("block header"))?;
        Ok(Self::new(chain, version, previous, merkle_root, timestamp, nbits, nonce))
    }

    pub fn serialize(&self) -> [u8; HEADER_SIZE] {
        let mut writer = ByteWriter::with_capacity(HEADER_SIZE);
        writer
            .put_i32_le(self.version)
            .put_bytes(&self.previous)
            .put_bytes(&self.merkle_root)
            .put_u32_le(self.timestamp)
            .put_u32_le(self.nbits)
            .put_u32_le(self.nonce);
        let mut out = [0u8; HEADER_SIZE];
        out.copy_from_slice(writer.as_slice());
        out
    }

    pub fn chain(&self) -> ChainType {
        self.chain
    }

    pub fn hash(&self) -> BlockHash {
        self.hash
    }

    pub fn previous(&self) -> BlockHash {
        self.previous
    }

    pub fn merkle_root(&self) -> Hash {
        self.merkle_root
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn nbits(&self) -> u32 {
        self.nbits
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    pub fn target(&self) -> Option<U256> {
        target_from_compact(self.nbits)
    }

    /// Work contributed by this header alone.
    pub fn work(&self) -> Work {
        Work::from_nbits(self.chain, self.nbits)
    }

    /// Hash, read as a little-endian number, is at or below the target.
    pub fn check_pow(&self) -> bool {
        match self.target() {
            Some(target) => U256::from_little_endian(&self.hash) <= target,
            None => false,
        }
    }

    pub fn display_hash(&self) -> String {
        display_hash(&self.hash)
    }
}

type HeaderFields = (i32, BlockHash, Hash, u32, u32, u32);

fn read_fields(reader: &mut ByteReader<'_>) -> Result<HeaderFields, CodecError> {
    Ok((
        reader.read_i32_le("header version")?,
        reader.read_array::<32>("previous block hash")?,
        reader.read_array::<32>("merkle root")?,
        reader.read_u32_le("timestamp")?,
        reader.read_u32_le("nbits")?,
        reader.read_u32_le("nonce")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::parse_display_hash;

    const GENESIS: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c";

    #[test]
    fn test_mainnet_genesis() {
        let bytes = hex::decode(GENESIS).unwrap();
        let header = Header::parse(ChainType::Bitcoin, &bytes).unwrap();
        assert_eq!(
            header.hash(),
            parse_display_hash("000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f").unwrap()
        );
        assert_eq!(header.nbits(), 0x1d00ffff);
        assert_eq!(header.timestamp(), 1231006505);
        assert_eq!(header.work(), Work::from_u256(U256::one()));
        assert!(header.check_pow());
        assert_eq!(header.serialize().to_vec(), bytes);
    }

    #[test]
    fn test_size_checked() {
        let bytes = hex::decode(GENESIS).unwrap();
        assert_eq!(
            Header::parse(ChainType::Bitcoin, &bytes[..79]),
            Err(ParseError::InvalidHeaderSize(79))
        );
    }

    #[test]
    fn test_invalid_bits_fail_pow() {
        let header = Header::new(ChainType::UnitTest, 1, [0u8; 32], [0u8; 32], 0, 0x04923456, 0);
        assert!(header.work().is_zero());
        assert!(!header.check_pow());
    }
}
