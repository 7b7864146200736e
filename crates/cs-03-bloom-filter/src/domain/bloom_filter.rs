//! Core Bloom Filter implementation
//!
//! INVARIANTS:
//! - No false negatives: if inserted, `test()` MUST return true
//! - Bit vector length and hash count never exceed 36,000 bytes / 50 rounds

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use cs_01_binary_codec::{ByteReader, ByteWriter};

use super::config::BloomConfig;
use super::hash_functions::bloom_hash;
use super::parameters::{
    expected_fp_rate, filter_bytes, hash_function_count, MAX_FILTER_BYTES, MAX_HASH_FUNCTIONS,
};
use crate::error::BloomError;

/// Size of the local serialization trailer: tweak u32, flags u8, count u8.
pub const TRAILER_SIZE: usize = 6;

/// How a remote peer should update the filter when a match is found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloomUpdateFlag {
    /// Never update.
    #[default]
    None,
    /// Add the outpoint of every matched output.
    All,
    /// Add outpoints only for pay-to-pubkey and multisig outputs.
    PubkeyOnly,
}

impl BloomUpdateFlag {
    pub fn to_u8(self) -> u8 {
        match self {
            BloomUpdateFlag::None => 0,
            BloomUpdateFlag::All => 1,
            BloomUpdateFlag::PubkeyOnly => 2,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self, BloomError> {
        match value {
            0 => Ok(BloomUpdateFlag::None),
            1 => Ok(BloomUpdateFlag::All),
            2 => Ok(BloomUpdateFlag::PubkeyOnly),
            other => Err(BloomError::InvalidUpdateFlag(other)),
        }
    }
}

/// Bloom filter for probabilistic membership testing
///
/// False positives are possible, false negatives are not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomFilter {
    /// Seed offset applied to every hash round
    tweak: u32,
    /// Remote update behaviour
    flags: BloomUpdateFlag,
    /// Number of hash rounds (k)
    function_count: u8,
    /// Bit array storing the filter state
    #[serde(with = "bitvec_serde")]
    bits: BitVec<u8, Lsb0>,
}

/// Serde support for BitVec
mod bitvec_serde {
    use bitvec::prelude::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bits: &BitVec<u8, Lsb0>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bits.as_raw_slice().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec<u8, Lsb0>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        Ok(BitVec::<u8, Lsb0>::from_vec(bytes))
    }
}

impl BloomFilter {
    /// Create an empty filter sized for `targets` elements at `fp_rate`.
    pub fn new(
        targets: usize,
        fp_rate: f64,
        tweak: u32,
        flags: BloomUpdateFlag,
    ) -> Result<Self, BloomError> {
        if !(fp_rate > 0.0 && fp_rate < 1.0) {
            return Err(BloomError::InvalidFalsePositiveRate { rate: fp_rate });
        }
        let bytes = filter_bytes(targets, fp_rate);
        let k = hash_function_count(bytes, targets);
        tracing::debug!(targets, fp_rate, bytes, k, "bloom filter sized");
        Ok(Self {
            tweak,
            flags,
            // hash_function_count clamps to MAX_HASH_FUNCTIONS (50)
            function_count: k as u8,
            bits: BitVec::<u8, Lsb0>::from_vec(vec![0u8; bytes]),
        })
    }

    /// Create an empty filter from a validated configuration.
    pub fn from_config(config: &BloomConfig) -> Result<Self, BloomError> {
        config.validate()?;
        Self::new(
            config.target_elements,
            config.fp_rate,
            config.tweak,
            config.update_flag,
        )
    }

    fn from_parts(
        data: &[u8],
        tweak: u32,
        flags: BloomUpdateFlag,
        function_count: usize,
    ) -> Result<Self, BloomError> {
        if data.is_empty() {
            return Err(BloomError::EmptyFilter);
        }
        if data.len() > MAX_FILTER_BYTES {
            return Err(BloomError::FilterTooLarge {
                size: data.len(),
                max: MAX_FILTER_BYTES,
            });
        }
        if function_count > MAX_HASH_FUNCTIONS {
            return Err(BloomError::TooManyHashFunctions {
                count: function_count,
                max: MAX_HASH_FUNCTIONS,
            });
        }
        Ok(Self {
            tweak,
            flags,
            function_count: function_count as u8,
            bits: BitVec::<u8, Lsb0>::from_vec(data.to_vec()),
        })
    }

    /// Insert an element.
    pub fn add_element(&mut self, element: &[u8]) {
        let len = self.bits.len();
        for round in 0..u32::from(self.function_count) {
            let index = bloom_hash(element, round, self.tweak, len);
            self.bits.set(index, true);
        }
    }

    /// Test whether `element` may have been inserted.
    pub fn test(&self, element: &[u8]) -> bool {
        let len = self.bits.len();
        (0..u32::from(self.function_count))
            .all(|round| self.bits[bloom_hash(element, round, self.tweak, len)])
    }

    /// Reset every bit.
    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// True if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Bit-vector length in bits.
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Bit-vector length in bytes.
    pub fn byte_len(&self) -> usize {
        self.bits.as_raw_slice().len()
    }

    pub fn function_count(&self) -> usize {
        usize::from(self.function_count)
    }

    pub fn tweak(&self) -> u32 {
        self.tweak
    }

    pub fn flags(&self) -> BloomUpdateFlag {
        self.flags
    }

    /// Raw bit-vector bytes, LSB-first within each byte.
    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }

    /// Expected false-positive rate after `elements` insertions.
    pub fn expected_fp_rate(&self, elements: usize) -> f64 {
        expected_fp_rate(self.bit_len(), elements, self.function_count())
    }

    /// Local format: bit-vector bytes, then tweak (u32 LE), flags, count.
    pub fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(self.byte_len() + TRAILER_SIZE);
        w.put_bytes(self.as_bytes())
            .put_u32_le(self.tweak)
            .put_u8(self.flags.to_u8())
            .put_u8(self.function_count);
        w.into_inner()
    }

    /// Inverse of [`BloomFilter::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self, BloomError> {
        if bytes.len() < TRAILER_SIZE {
            return Err(BloomError::TruncatedTrailer {
                len: bytes.len(),
                trailer: TRAILER_SIZE,
            });
        }
        let (data, trailer) = bytes.split_at(bytes.len() - TRAILER_SIZE);
        let mut r = ByteReader::new(trailer);
        let tweak = r.read_u32_le("bloom tweak")?;
        let flags = BloomUpdateFlag::from_u8(r.read_u8("bloom flags")?)?;
        let count = r.read_u8("bloom function count")?;
        Self::from_parts(data, tweak, flags, usize::from(count))
    }

    /// BIP37 `filterload` payload:
    /// `CompactSize(len) || bits || nHashFuncs u32 || nTweak u32 || nFlags u8`.
    pub fn filterload_payload(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(self.byte_len() + 12);
        w.put_var_bytes(self.as_bytes())
            .put_u32_le(u32::from(self.function_count))
            .put_u32_le(self.tweak)
            .put_u8(self.flags.to_u8());
        w.into_inner()
    }

    /// Parse a BIP37 `filterload` payload.
    pub fn from_filterload(payload: &[u8]) -> Result<Self, BloomError> {
        let mut r = ByteReader::new(payload);
        let data = r.read_var_bytes("filterload bits")?;
        let count = r.read_u32_le("filterload nHashFuncs")?;
        let tweak = r.read_u32_le("filterload nTweak")?;
        let flags = BloomUpdateFlag::from_u8(r.read_u8("filterload nFlags")?)?;
        r.finish()?;
        Self::from_parts(data, tweak, flags, count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unhex(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[test]
    fn test_parameter_derivation_ten_targets() {
        let filter = BloomFilter::new(10, 0.01, 0, BloomUpdateFlag::None).unwrap();
        assert_eq!(filter.byte_len(), 11);
        assert_eq!(filter.bit_len(), 88);
        assert_eq!(filter.function_count(), 6);
        assert!(filter.byte_len() <= MAX_FILTER_BYTES);
        assert!(filter.function_count() <= MAX_HASH_FUNCTIONS);
    }

    #[test]
    fn test_hard_maxima() {
        let filter = BloomFilter::new(100_000_000, 0.000_000_1, 0, BloomUpdateFlag::None).unwrap();
        assert_eq!(filter.byte_len(), MAX_FILTER_BYTES);
        assert!(filter.function_count() <= MAX_HASH_FUNCTIONS);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        for rate in [0.0, 1.0, -0.5, 2.0, f64::NAN] {
            assert!(BloomFilter::new(10, rate, 0, BloomUpdateFlag::None).is_err());
        }
    }

    #[test]
    fn test_bip37_reference_vector() {
        let mut filter = BloomFilter::new(3, 0.01, 0, BloomUpdateFlag::All).unwrap();
        filter.add_element(&unhex("99108ad8ed9bb6274d3980bab5a85c048f0950c8"));
        assert!(filter.test(&unhex("99108ad8ed9bb6274d3980bab5a85c048f0950c8")));
        assert!(!filter.test(&unhex("19108ad8ed9bb6274d3980bab5a85c048f0950c8")));
        filter.add_element(&unhex("b5a2c786d9ef4658287ced5914b37a1b4aa32eee"));
        filter.add_element(&unhex("b9300670b4c5366e95b2699e8b18bc75e5f729c5"));

        assert_eq!(
            hex::encode(filter.filterload_payload()),
            "03614e9b050000000000000001"
        );
    }

    #[test]
    fn test_bip37_reference_vector_with_tweak() {
        let mut filter = BloomFilter::new(3, 0.01, 2_147_483_649, BloomUpdateFlag::All).unwrap();
        filter.add_element(&unhex("99108ad8ed9bb6274d3980bab5a85c048f0950c8"));
        filter.add_element(&unhex("b5a2c786d9ef4658287ced5914b37a1b4aa32eee"));
        filter.add_element(&unhex("b9300670b4c5366e95b2699e8b18bc75e5f729c5"));

        assert_eq!(
            hex::encode(filter.filterload_payload()),
            "03ce4299050000000100008001"
        );
    }

    #[test]
    fn test_local_serialization_trailer() {
        let mut filter = BloomFilter::new(10, 0.01, 0xDEAD_BEEF, BloomUpdateFlag::PubkeyOnly).unwrap();
        filter.add_element(b"abc");
        let bytes = filter.serialize();
        assert_eq!(bytes.len(), 11 + TRAILER_SIZE);
        assert_eq!(&bytes[11..15], &0xDEAD_BEEFu32.to_le_bytes());
        assert_eq!(bytes[15], 2);
        assert_eq!(bytes[16], 6);

        let back = BloomFilter::deserialize(&bytes).unwrap();
        assert_eq!(back, filter);
        assert!(back.test(b"abc"));
    }

    #[test]
    fn test_deserialize_short_buffer_fails() {
        assert_eq!(
            BloomFilter::deserialize(&[0u8; 5]),
            Err(BloomError::TruncatedTrailer { len: 5, trailer: 6 })
        );
        // Trailer present but no bit vector.
        assert_eq!(
            BloomFilter::deserialize(&[0u8; 6]),
            Err(BloomError::EmptyFilter)
        );
    }

    #[test]
    fn test_deserialize_rejects_bad_trailer_values() {
        let mut bytes = vec![0u8; 4];
        bytes.extend_from_slice(&[0, 0, 0, 0, 9, 5]);
        assert_eq!(
            BloomFilter::deserialize(&bytes),
            Err(BloomError::InvalidUpdateFlag(9))
        );

        let mut bytes = vec![0u8; 4];
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 51]);
        assert!(matches!(
            BloomFilter::deserialize(&bytes),
            Err(BloomError::TooManyHashFunctions { count: 51, .. })
        ));
    }

    #[test]
    fn test_filterload_rejects_oversized() {
        let mut w = ByteWriter::new();
        w.put_var_bytes(&vec![0u8; MAX_FILTER_BYTES + 1])
            .put_u32_le(1)
            .put_u32_le(0)
            .put_u8(0);
        assert!(matches!(
            BloomFilter::from_filterload(w.as_slice()),
            Err(BloomError::FilterTooLarge { .. })
        ));
    }

    #[test]
    fn test_clear() {
        let mut filter = BloomFilter::new(10, 0.01, 0, BloomUpdateFlag::None).unwrap();
        filter.add_element(b"x");
        assert!(!filter.is_empty());
        filter.clear();
        assert!(filter.is_empty());
    }

    #[test]
    fn test_serde_json_roundtrip() {
        let mut filter = BloomFilter::new(20, 0.05, 3, BloomUpdateFlag::All).unwrap();
        filter.add_element(b"element");
        let json = serde_json::to_string(&filter).unwrap();
        let back: BloomFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, filter);
    }

    proptest! {
        #[test]
        fn prop_no_false_negatives(
            elements in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 1..100),
            tweak in any::<u32>(),
        ) {
            let mut filter = BloomFilter::new(elements.len(), 0.01, tweak, BloomUpdateFlag::None).unwrap();
            for e in &elements {
                filter.add_element(e);
            }
            for e in &elements {
                prop_assert!(filter.test(e));
            }
        }
    }
}
