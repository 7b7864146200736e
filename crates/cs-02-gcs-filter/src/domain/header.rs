//! Filter hash and filter-header chaining.
//!
//! `header_n = sha256d(filter_hash_n || header_{n-1})`, starting from an
//! all-zero previous header below the first block.

use shared_crypto::{sha256d, sha256d_many};
use shared_types::Hash;

/// Previous header used for the first block of a chain.
pub const GENESIS_PREVIOUS_HEADER: Hash = [0u8; 32];

/// `sha256d` of an encoded filter.
pub fn filter_hash(encoded_filter: &[u8]) -> Hash {
    sha256d(encoded_filter)
}

/// Chain a filter hash onto the previous filter header.
pub fn filter_header(filter_hash: &Hash, previous_header: &Hash) -> Hash {
    sha256d_many(&[filter_hash.as_slice(), previous_header.as_slice()])
}

/// Headers for consecutive filter hashes starting after `previous`.
pub fn compute_filter_headers(previous: &Hash, filter_hashes: &[Hash]) -> Vec<Hash> {
    let mut headers = Vec::with_capacity(filter_hashes.len());
    let mut prev = *previous;
    for hash in filter_hashes {
        prev = filter_header(hash, &prev);
        headers.push(prev);
    }
    headers
}
