//! Hash-to-range mapping.

use shared_crypto::{siphash24, SipKey};
use shared_types::Hash;

/// SipHash key for a block's filter: the first 16 bytes of its hash in
/// internal byte order.
pub fn key_from_block_hash(block_hash: &Hash) -> SipKey {
    let mut key = [0u8; 16];
    key.copy_from_slice(&block_hash[..16]);
    key
}

/// Map `element` into `[0, range)` by `(siphash(element) * range) >> 64`.
pub fn hash_to_range(key: &SipKey, element: &[u8], range: u64) -> u64 {
    let hash = siphash24(key, element);
    ((u128::from(hash) * u128::from(range)) >> 64) as u64
}

/// Hash every element into `[0, range)`.
pub fn hashed_set<T: AsRef<[u8]>>(key: &SipKey, elements: &[T], range: u64) -> Vec<u64> {
    elements
        .iter()
        .map(|element| hash_to_range(key, element.as_ref(), range))
        .collect()
}
