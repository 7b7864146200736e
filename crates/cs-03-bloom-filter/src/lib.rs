//! # CS-03 Bloom Filter
//!
//! BIP37-style Bloom filters for transaction-relay filtering.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): pure logic, no I/O
//!   - `BloomFilter`: bit vector, hash rounds, serialization
//!   - `parameters`: size and hash-count derivation with hard ceilings
//!   - `hash_functions`: MurmurHash3 rounds seeded per BIP37
//!   - `BloomConfig`: validated construction parameters
//!
//! ## Invariants
//!
//! - **No false negatives**: after `add_element(x)`, `test(x)` is true.
//! - **Hard ceilings**: at most 36,000 bytes and 50 hash functions; larger
//!   requests degrade the false-positive rate instead of growing the filter.
//!
//! ## Usage Example
//!
//! ```ignore
//! use cs_03_bloom_filter::{BloomConfig, BloomFilter};
//!
//! let config = BloomConfig::default().with_target_elements(10).with_fp_rate(0.01);
//! let mut filter = BloomFilter::from_config(&config)?;
//! filter.add_element(b"script");
//! assert!(filter.test(b"script"));
//! ```

pub mod domain;
pub mod error;

pub use domain::{
    BloomConfig, BloomFilter, BloomUpdateFlag, MAX_FILTER_BYTES, MAX_HASH_FUNCTIONS, SEED_MULTIPLIER,
};
pub use error::BloomError;
