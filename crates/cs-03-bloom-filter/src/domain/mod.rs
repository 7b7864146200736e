//! Domain Layer - Pure business logic
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod bloom_filter;
pub mod config;
pub mod hash_functions;
pub mod parameters;

pub use bloom_filter::{BloomFilter, BloomUpdateFlag};
pub use config::BloomConfig;
pub use hash_functions::{bloom_hash, SEED_MULTIPLIER};
pub use parameters::{filter_bytes, hash_function_count, MAX_FILTER_BYTES, MAX_HASH_FUNCTIONS};
