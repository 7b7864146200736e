//! # CS-02 GCS Filter
//!
//! Golomb-coded set filters as used for BIP158 compact block filters.
//!
//! ## Algorithm
//!
//! 1. SipHash-2-4 every element under a 16-byte key.
//! 2. Map each hash into `[0, N*M)` with a 128-bit multiply-and-shift.
//! 3. Sort, take consecutive differences.
//! 4. Golomb-Rice encode each difference with parameter `P`.
//!
//! Matching hashes the query the same way and runs a sorted-merge
//! intersection against the decompressed set. Decompression happens at
//! most once per filter.
//!
//! ## Wire Form
//!
//! `CompactSize(N) || bitstream`. The filter hash is `sha256d` of that
//! encoding and the filter header chains it with the previous header.
//!
//! ## Invariants
//!
//! - No false negatives: every element a filter was built from tests true.
//! - Construction rejects keys that are not exactly 16 bytes and element
//!   counts beyond `u32::MAX`.

pub mod domain;
pub mod error;

pub use domain::{
    compute_filter_headers, filter_header, filter_hash, golomb_decode, golomb_encode,
    hash_to_range, key_from_block_hash, FilterParams, GcsFilter, GENESIS_PREVIOUS_HEADER,
};
pub use error::GcsError;
