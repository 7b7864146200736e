//! Domain Layer - Pure filter logic
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod bit_stream;
pub mod gcs;
pub mod golomb;
pub mod hashing;
pub mod header;
pub mod params;

pub use gcs::GcsFilter;
pub use golomb::{golomb_decode, golomb_encode};
pub use hashing::{hash_to_range, hashed_set, key_from_block_hash};
pub use header::{compute_filter_headers, filter_header, filter_hash, GENESIS_PREVIOUS_HEADER};
pub use params::FilterParams;
