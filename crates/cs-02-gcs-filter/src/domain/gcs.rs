//! # GCS Filters (Golomb-Coded Sets)
//!
//! A filter is held either as its sorted hashed values or as the Golomb-Rice
//! compressed stream. Whichever form is missing is derived on first use and
//! kept for the life of the filter.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use cs_01_binary_codec::{ByteReader, CompactSize};
use shared_crypto::SipKey;
use shared_types::{FilterType, Hash};

use super::golomb::{golomb_decode, golomb_encode};
use super::hashing::{hash_to_range, hashed_set, key_from_block_hash};
use super::header::{filter_hash, filter_header};
use super::params::FilterParams;
use crate::error::GcsError;

/// Golomb-coded set filter.
#[derive(Debug, Clone)]
pub struct GcsFilter {
    params: FilterParams,
    count: u32,
    key: SipKey,
    compressed: OnceLock<Vec<u8>>,
    elements: OnceLock<Result<Vec<u64>, GcsError>>,
}

fn check_key(key: &[u8]) -> Result<SipKey, GcsError> {
    key.try_into()
        .map_err(|_| GcsError::InvalidKeySize(key.len()))
}

impl GcsFilter {
    /// Build a filter from raw elements.
    ///
    /// Duplicate elements are collapsed before hashing, so `count()` is the
    /// number of distinct elements.
    pub fn new<T: AsRef<[u8]>>(
        params: FilterParams,
        key: &[u8],
        elements: &[T],
    ) -> Result<Self, GcsError> {
        let key = check_key(key)?;
        let unique: BTreeSet<&[u8]> = elements.iter().map(|e| e.as_ref()).collect();
        let count = u32::try_from(unique.len()).map_err(|_| GcsError::TooManyElements(unique.len()))?;
        let unique: Vec<&[u8]> = unique.into_iter().collect();

        let mut values = hashed_set(&key, &unique, params.range(count));
        values.sort_unstable();

        let compressed = golomb_encode(params.bits, &values)?;
        Ok(Self {
            params,
            count,
            key,
            compressed: OnceLock::from(compressed),
            elements: OnceLock::from(Ok(values)),
        })
    }

    /// Build a block filter keyed by the block hash.
    pub fn for_block<T: AsRef<[u8]>>(
        filter_type: FilterType,
        block_hash: &Hash,
        elements: &[T],
    ) -> Result<Self, GcsError> {
        let key = key_from_block_hash(block_hash);
        Self::new(FilterParams::for_type(filter_type), &key, elements)
    }

    /// Wrap an already-compressed stream; decompression is deferred.
    pub fn from_compressed(
        params: FilterParams,
        key: &[u8],
        count: u32,
        compressed: Vec<u8>,
    ) -> Result<Self, GcsError> {
        let key = check_key(key)?;
        if params.bits > super::params::MAX_BITS {
            return Err(GcsError::InvalidParameter(params.bits));
        }
        Ok(Self {
            params,
            count,
            key,
            compressed: OnceLock::from(compressed),
            elements: OnceLock::new(),
        })
    }

    /// Wrap an already-hashed, sorted set; compression is deferred.
    pub fn from_hashed(
        params: FilterParams,
        key: &[u8],
        mut hashed: Vec<u64>,
    ) -> Result<Self, GcsError> {
        let key = check_key(key)?;
        if params.bits > super::params::MAX_BITS {
            return Err(GcsError::InvalidParameter(params.bits));
        }
        let count = u32::try_from(hashed.len()).map_err(|_| GcsError::TooManyElements(hashed.len()))?;
        hashed.sort_unstable();
        Ok(Self {
            params,
            count,
            key,
            compressed: OnceLock::new(),
            elements: OnceLock::from(Ok(hashed)),
        })
    }

    /// Parse the wire form `CompactSize(N) || bitstream`.
    pub fn decode(params: FilterParams, key: &[u8], encoded: &[u8]) -> Result<Self, GcsError> {
        let mut reader = ByteReader::new(encoded);
        let count = reader.read_length("filter element count", u32::MAX as usize)?;
        let stream = reader.read_bytes(reader.remaining(), "filter bitstream")?;
        // read_length bounded the value by u32::MAX
        Self::from_compressed(params, key, count as u32, stream.to_vec())
    }

    /// Parse a block filter received for `block_hash`.
    pub fn decode_for_block(
        filter_type: FilterType,
        block_hash: &Hash,
        encoded: &[u8],
    ) -> Result<Self, GcsError> {
        let key = key_from_block_hash(block_hash);
        Self::decode(FilterParams::for_type(filter_type), &key, encoded)
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    /// Number of elements `N`.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn key(&self) -> &SipKey {
        &self.key
    }

    /// Golomb-Rice bitstream, compressing on first call if needed.
    pub fn compressed(&self) -> &[u8] {
        self.compressed.get_or_init(|| {
            match self.elements.get() {
                Some(Ok(values)) => golomb_encode(self.params.bits, values).unwrap_or_default(),
                _ => Vec::new(),
            }
        })
    }

    /// Sorted hashed values, decompressing on first call if needed.
    pub fn elements(&self) -> Result<&[u64], GcsError> {
        let decoded = self.elements.get_or_init(|| {
            let stream = self.compressed.get().map(Vec::as_slice).unwrap_or_default();
            let result = golomb_decode(self.count, self.params.bits, stream);
            if let Err(err) = &result {
                tracing::warn!(count = self.count, %err, "GCS filter failed to decompress");
            }
            result
        });
        decoded.as_ref().map(Vec::as_slice).map_err(Clone::clone)
    }

    /// Wire form.
    pub fn encode(&self) -> Vec<u8> {
        let stream = self.compressed();
        let mut out = Vec::with_capacity(CompactSize::new(u64::from(self.count)).size() + stream.len());
        CompactSize::new(u64::from(self.count)).encode_into(&mut out);
        out.extend_from_slice(stream);
        out
    }

    /// `sha256d` of the wire form.
    pub fn hash(&self) -> Hash {
        filter_hash(&self.encode())
    }

    /// Filter header chained onto `previous`.
    pub fn header(&self, previous: &Hash) -> Hash {
        filter_header(&self.hash(), previous)
    }

    /// Hash targets into this filter's range.
    pub fn hash_targets<T: AsRef<[u8]>>(&self, targets: &[T]) -> Vec<u64> {
        hashed_set(&self.key, targets, self.params.range(self.count))
    }

    /// Indices of `targets` that match the filter.
    ///
    /// Runs a sorted-merge intersection between the hashed targets and the
    /// decompressed filter values. Returned indices are ascending.
    pub fn match_targets<T: AsRef<[u8]>>(&self, targets: &[T]) -> Result<Vec<usize>, GcsError> {
        if self.count == 0 || targets.is_empty() {
            return Ok(Vec::new());
        }
        let filter = self.elements()?;
        let mut hashed: Vec<(u64, usize)> = self
            .hash_targets(targets)
            .into_iter()
            .zip(0..)
            .collect();
        hashed.sort_unstable();

        let mut matches = Vec::new();
        let mut f = 0;
        let mut t = 0;
        while f < filter.len() && t < hashed.len() {
            let (value, index) = hashed[t];
            match filter[f].cmp(&value) {
                std::cmp::Ordering::Less => f += 1,
                std::cmp::Ordering::Greater => t += 1,
                std::cmp::Ordering::Equal => {
                    matches.push(index);
                    // keep `f` so duplicate targets also match
                    t += 1;
                }
            }
        }
        matches.sort_unstable();
        Ok(matches)
    }

    /// True if any of `targets` matches.
    pub fn test_any<T: AsRef<[u8]>>(&self, targets: &[T]) -> bool {
        self.match_targets(targets)
            .map(|m| !m.is_empty())
            .unwrap_or(false)
    }

    /// True if `target` may be in the set.
    pub fn test(&self, target: &[u8]) -> bool {
        if self.count == 0 {
            return false;
        }
        let value = hash_to_range(&self.key, target, self.params.range(self.count));
        self.elements()
            .map(|filter| filter.binary_search(&value).is_ok())
            .unwrap_or(false)
    }

    /// Compressed size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.compressed().len()
    }
}

impl PartialEq for GcsFilter {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
            && self.count == other.count
            && self.key == other.key
            && self.compressed() == other.compressed()
    }
}

impl Eq for GcsFilter {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn params() -> FilterParams {
        FilterParams::for_type(FilterType::BasicBip158)
    }

    fn scripts(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| format!("output_script_{i}").into_bytes()).collect()
    }

    #[test]
    fn test_rejects_bad_key_size() {
        let elements = scripts(3);
        assert_eq!(
            GcsFilter::new(params(), &[0u8; 15], &elements).unwrap_err(),
            GcsError::InvalidKeySize(15)
        );
        assert_eq!(
            GcsFilter::new(params(), &[0u8; 17], &elements).unwrap_err(),
            GcsError::InvalidKeySize(17)
        );
    }

    #[test]
    fn test_empty_filter() {
        let empty: Vec<Vec<u8>> = Vec::new();
        let filter = GcsFilter::new(params(), &[1u8; 16], &empty).unwrap();
        assert_eq!(filter.count(), 0);
        assert_eq!(filter.encode(), vec![0x00]);
        assert!(!filter.test(b"anything"));
        assert!(filter.match_targets(&[b"anything"]).unwrap().is_empty());
    }

    #[test]
    fn test_no_false_negatives() {
        let elements = scripts(500);
        let filter = GcsFilter::new(params(), &[7u8; 16], &elements).unwrap();
        for element in &elements {
            assert!(filter.test(element), "false negative for {element:?}");
        }
        let all: Vec<usize> = (0..elements.len()).collect();
        assert_eq!(filter.match_targets(&elements).unwrap(), all);
    }

    #[test]
    fn test_duplicates_collapsed() {
        let elements = vec![b"a".to_vec(), b"b".to_vec(), b"a".to_vec()];
        let filter = GcsFilter::new(params(), &[0u8; 16], &elements).unwrap();
        assert_eq!(filter.count(), 2);
    }

    #[test]
    fn test_match_reports_target_indices() {
        let elements = scripts(10);
        let filter = GcsFilter::new(params(), &[9u8; 16], &elements).unwrap();
        let targets = vec![
            b"not_in_filter_1".to_vec(),
            elements[3].clone(),
            b"not_in_filter_2".to_vec(),
            elements[7].clone(),
            elements[3].clone(),
        ];
        assert_eq!(filter.match_targets(&targets).unwrap(), vec![1, 3, 4]);
        assert!(filter.test_any(&targets));
    }

    #[test]
    fn test_wire_roundtrip_is_lazy() {
        let elements = scripts(50);
        let built = GcsFilter::new(params(), &[5u8; 16], &elements).unwrap();
        let encoded = built.encode();

        let parsed = GcsFilter::decode(params(), &[5u8; 16], &encoded).unwrap();
        assert!(parsed.elements.get().is_none());
        assert_eq!(parsed.count(), 50);
        assert!(parsed.test(&elements[0]));
        assert!(parsed.elements.get().is_some());
        assert_eq!(parsed, built);
        assert_eq!(parsed.hash(), built.hash());
    }

    #[test]
    fn test_from_hashed_compresses_lazily() {
        let built = GcsFilter::new(params(), &[5u8; 16], &scripts(20)).unwrap();
        let values = built.elements().unwrap().to_vec();
        let rebuilt = GcsFilter::from_hashed(params(), &[5u8; 16], values).unwrap();
        assert!(rebuilt.compressed.get().is_none());
        assert_eq!(rebuilt.encode(), built.encode());
    }

    #[test]
    fn test_corrupt_stream_reports_error() {
        let filter = GcsFilter::from_compressed(params(), &[0u8; 16], 10, vec![0x00]).unwrap();
        assert!(matches!(
            filter.elements(),
            Err(GcsError::TruncatedStream { .. })
        ));
        assert!(!filter.test(b"x"));
        assert!(filter.match_targets(&[b"x"]).is_err());
    }

    #[test]
    fn test_decode_truncated_count() {
        assert!(matches!(
            GcsFilter::decode(params(), &[0u8; 16], &[0xFE, 0x01]),
            Err(GcsError::Codec(_))
        ));
    }

    #[test]
    fn test_false_positive_rate_is_small() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(158);
        let elements = scripts(1000);
        let filter = GcsFilter::new(params(), &[2u8; 16], &elements).unwrap();
        let probes: Vec<[u8; 32]> = (0..20_000).map(|_| rng.gen()).collect();
        let hits = filter.match_targets(&probes).unwrap().len();
        // expected about 20_000 / 784_931, i.e. well under 5
        assert!(hits < 5, "too many false positives: {hits}");
    }

    #[test]
    fn test_bip158_testnet_genesis_vector() {
        let mut block_hash: Hash =
            hex::decode("000000000933ea01ad0ee984209779baaec3ced90fa3f408719526f8d77f4943")
                .unwrap()
                .try_into()
                .unwrap();
        block_hash.reverse();
        let script = hex::decode(
            "4104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac",
        )
        .unwrap();
        let filter = GcsFilter::for_block(FilterType::BasicBip158, &block_hash, &[script]).unwrap();
        assert_eq!(hex::encode(filter.encode()), "019dfca8");

        let mut expected_header =
            hex::decode("21584579b7eb08997773e5aeff3a7f932700042d0ed2a6129012b7d7ae81b750").unwrap();
        expected_header.reverse();
        assert_eq!(filter.header(&[0u8; 32]).to_vec(), expected_header);
    }
}
