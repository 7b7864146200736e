//! # Core Domain Entities
//!
//! Hash aliases, chain positions and the outpoint type shared by every
//! subsystem.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::errors::TypeError;

/// A 32-byte hash in internal (wire) byte order.
pub type Hash = [u8; 32];

/// Transaction identifier.
pub type Txid = Hash;

/// Block identifier.
pub type BlockHash = Hash;

/// Height relative to a chain's first header.
pub type Height = i64;

/// Sentinel for "height not known".
pub const UNKNOWN_HEIGHT: Height = -1;

/// The all-zero hash, used as the parent of a genesis header.
pub const NULL_HASH: Hash = [0u8; 32];

/// Render a hash the way block explorers do (byte-reversed hex).
pub fn display_hash(hash: &Hash) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}

/// Parse a byte-reversed hex string back into an internal-order hash.
pub fn parse_display_hash(text: &str) -> Result<Hash, TypeError> {
    let bytes = hex::decode(text).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    let mut hash: Hash = bytes
        .as_slice()
        .try_into()
        .map_err(|_| TypeError::InvalidLength {
            what: "hash",
            expected: 32,
            actual: bytes.len(),
        })?;
    hash.reverse();
    Ok(hash)
}

// =============================================================================
// Position
// =============================================================================

/// A `(height, hash)` pair identifying a block on some chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Block height.
    pub height: Height,
    /// Block hash.
    pub hash: BlockHash,
}

impl Position {
    /// Create a position.
    pub fn new(height: Height, hash: BlockHash) -> Self {
        Self { height, hash }
    }

    /// The "nowhere" position: unknown height, null hash.
    pub fn unknown() -> Self {
        Self {
            height: UNKNOWN_HEIGHT,
            hash: NULL_HASH,
        }
    }

    /// True unless this is the sentinel position.
    pub fn is_known(&self) -> bool {
        self.height > UNKNOWN_HEIGHT
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.height, display_hash(&self.hash))
    }
}

// =============================================================================
// Chain and filter identifiers
// =============================================================================

/// Supported Bitcoin-family chains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChainType {
    Bitcoin,
    BitcoinTestnet3,
    BitcoinCash,
    BitcoinCashTestnet3,
    Litecoin,
    LitecoinTestnet4,
    /// Regtest-style chain with a trivial proof-of-work limit.
    UnitTest,
}

impl ChainType {
    /// All chains, in tag order.
    pub const ALL: [ChainType; 7] = [
        ChainType::Bitcoin,
        ChainType::BitcoinTestnet3,
        ChainType::BitcoinCash,
        ChainType::BitcoinCashTestnet3,
        ChainType::Litecoin,
        ChainType::LitecoinTestnet4,
        ChainType::UnitTest,
    ];

    /// Compact encoding of the chain's proof-of-work limit (`maxTarget`).
    pub fn max_target_bits(&self) -> u32 {
        match self {
            ChainType::Bitcoin
            | ChainType::BitcoinTestnet3
            | ChainType::BitcoinCash
            | ChainType::BitcoinCashTestnet3 => 0x1d00_ffff,
            ChainType::Litecoin | ChainType::LitecoinTestnet4 => 0x1e0f_ffff,
            ChainType::UnitTest => 0x207f_ffff,
        }
    }

    /// Whether the chain accepts segregated-witness serialization.
    pub fn supports_segwit(&self) -> bool {
        !matches!(
            self,
            ChainType::BitcoinCash | ChainType::BitcoinCashTestnet3
        )
    }

    /// Filter type this chain's compact block filters are built with.
    pub fn default_filter_type(&self) -> FilterType {
        match self {
            ChainType::BitcoinCash | ChainType::BitcoinCashTestnet3 => FilterType::BasicBchVariant,
            _ => FilterType::BasicBip158,
        }
    }

    /// Stable one-byte tag used in persisted records.
    pub fn tag(&self) -> u8 {
        match self {
            ChainType::Bitcoin => 1,
            ChainType::BitcoinTestnet3 => 2,
            ChainType::BitcoinCash => 3,
            ChainType::BitcoinCashTestnet3 => 4,
            ChainType::Litecoin => 5,
            ChainType::LitecoinTestnet4 => 6,
            ChainType::UnitTest => 255,
        }
    }

    /// Inverse of [`ChainType::tag`].
    pub fn from_tag(tag: u8) -> Result<Self, TypeError> {
        Self::ALL
            .into_iter()
            .find(|chain| chain.tag() == tag)
            .ok_or(TypeError::UnknownChain(tag))
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ChainType::Bitcoin => "bitcoin",
            ChainType::BitcoinTestnet3 => "bitcoin-testnet3",
            ChainType::BitcoinCash => "bitcoin-cash",
            ChainType::BitcoinCashTestnet3 => "bitcoin-cash-testnet3",
            ChainType::Litecoin => "litecoin",
            ChainType::LitecoinTestnet4 => "litecoin-testnet4",
            ChainType::UnitTest => "unit-test",
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compact block filter flavours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterType {
    /// BIP158 basic filter: output scripts and spent previous-output scripts.
    BasicBip158,
    /// Bitcoin Cash flavour: output scripts and consumed outpoints.
    BasicBchVariant,
    /// Extended filter: normalized push-data chunks and outpoints.
    Es,
}

impl FilterType {
    /// Wire tag.
    pub fn tag(&self) -> u8 {
        match self {
            FilterType::BasicBip158 => 0x00,
            FilterType::BasicBchVariant => 0x01,
            FilterType::Es => 0x58,
        }
    }

    /// Inverse of [`FilterType::tag`].
    pub fn from_tag(tag: u8) -> Result<Self, TypeError> {
        match tag {
            0x00 => Ok(FilterType::BasicBip158),
            0x01 => Ok(FilterType::BasicBchVariant),
            0x58 => Ok(FilterType::Es),
            other => Err(TypeError::UnknownFilterType(other)),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterType::BasicBip158 => "basic",
            FilterType::BasicBchVariant => "basic-bch",
            FilterType::Es => "extended",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Outpoint
// =============================================================================

/// Size of an outpoint on the wire.
pub const OUTPOINT_SIZE: usize = 36;

/// Reference to one output of one transaction.
///
/// Ordering compares the 36-byte wire layout (txid bytes, then the
/// little-endian index bytes) as raw memory, so index 256 sorts before
/// index 1 within the same transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outpoint {
    /// Transaction id in internal byte order.
    pub txid: Txid,
    /// Output index.
    pub index: u32,
}

impl Outpoint {
    /// Create an outpoint.
    pub fn new(txid: Txid, index: u32) -> Self {
        Self { txid, index }
    }

    /// The null outpoint referenced by coinbase inputs.
    pub fn null() -> Self {
        Self {
            txid: NULL_HASH,
            index: u32::MAX,
        }
    }

    /// True for the coinbase marker outpoint.
    pub fn is_null(&self) -> bool {
        self.txid == NULL_HASH && self.index == u32::MAX
    }

    /// Wire layout: txid followed by the little-endian index.
    pub fn to_bytes(&self) -> [u8; OUTPOINT_SIZE] {
        let mut out = [0u8; OUTPOINT_SIZE];
        out[..32].copy_from_slice(&self.txid);
        out[32..].copy_from_slice(&self.index.to_le_bytes());
        out
    }

    /// Parse the 36-byte wire layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() != OUTPOINT_SIZE {
            return Err(TypeError::InvalidLength {
                what: "outpoint",
                expected: OUTPOINT_SIZE,
                actual: bytes.len(),
            });
        }
        let mut txid = [0u8; 32];
        txid.copy_from_slice(&bytes[..32]);
        let mut index = [0u8; 4];
        index.copy_from_slice(&bytes[32..]);
        Ok(Self {
            txid,
            index: u32::from_le_bytes(index),
        })
    }
}

impl Ord for Outpoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl PartialOrd for Outpoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", display_hash(&self.txid), self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_outpoint_bytes_layout() {
        let op = Outpoint::new([0xAA; 32], 0x0102_0304);
        let bytes = op.to_bytes();
        assert_eq!(&bytes[..32], &[0xAA; 32]);
        assert_eq!(&bytes[32..], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(Outpoint::from_bytes(&bytes).unwrap(), op);
    }

    #[test]
    fn test_outpoint_from_bytes_wrong_length() {
        assert!(Outpoint::from_bytes(&[0u8; 35]).is_err());
        assert!(Outpoint::from_bytes(&[0u8; 37]).is_err());
    }

    #[test]
    fn test_outpoint_raw_order_differs_from_display_order() {
        // Internal bytes 01 00..00 vs 00 .. 02: raw order puts `b` first,
        // while the byte-reversed display string puts `a` first.
        let mut a_txid = [0u8; 32];
        a_txid[0] = 0x01;
        let mut b_txid = [0u8; 32];
        b_txid[31] = 0x02;
        let a = Outpoint::new(a_txid, 0);
        let b = Outpoint::new(b_txid, 0);

        assert!(b < a);
        assert!(display_hash(&a.txid) < display_hash(&b.txid));
    }

    #[test]
    fn test_outpoint_index_compares_little_endian_bytes() {
        let txid = [7u8; 32];
        let one = Outpoint::new(txid, 1);
        let two_fifty_six = Outpoint::new(txid, 256);
        assert!(two_fifty_six < one);
    }

    #[test]
    fn test_null_outpoint() {
        assert!(Outpoint::null().is_null());
        assert!(!Outpoint::new(NULL_HASH, 0).is_null());
    }

    #[test]
    fn test_display_hash_roundtrip() {
        let mut hash = [0u8; 32];
        hash[0] = 0x6f;
        hash[31] = 0x01;
        let text = display_hash(&hash);
        assert!(text.starts_with("01"));
        assert!(text.ends_with("6f"));
        assert_eq!(parse_display_hash(&text).unwrap(), hash);
    }

    #[test]
    fn test_chain_tags_roundtrip() {
        for chain in ChainType::ALL {
            assert_eq!(ChainType::from_tag(chain.tag()).unwrap(), chain);
        }
        assert!(ChainType::from_tag(0).is_err());
    }

    #[test]
    fn test_filter_type_tags() {
        for ft in [FilterType::BasicBip158, FilterType::BasicBchVariant, FilterType::Es] {
            assert_eq!(FilterType::from_tag(ft.tag()).unwrap(), ft);
        }
        assert!(matches!(
            FilterType::from_tag(0x42),
            Err(TypeError::UnknownFilterType(0x42))
        ));
    }

    #[test]
    fn test_position_sentinel() {
        assert!(!Position::unknown().is_known());
        assert!(Position::new(0, [1; 32]).is_known());
    }

    #[test]
    fn test_position_serde_bincode() {
        let pos = Position::new(42, [9; 32]);
        let bytes = bincode::serialize(&pos).unwrap();
        let back: Position = bincode::deserialize(&bytes).unwrap();
        assert_eq!(pos, back);
    }

    proptest! {
        #[test]
        fn prop_outpoint_order_matches_bytes(
            a in proptest::array::uniform32(any::<u8>()),
            b in proptest::array::uniform32(any::<u8>()),
            ia in any::<u32>(),
            ib in any::<u32>(),
        ) {
            let x = Outpoint::new(a, ia);
            let y = Outpoint::new(b, ib);
            prop_assert_eq!(x.cmp(&y), x.to_bytes().cmp(&y.to_bytes()));
        }
    }
}
