//! Error types for the Bloom filter subsystem

use cs_01_binary_codec::CodecError;
use thiserror::Error;

/// Errors that can occur building or decoding a Bloom filter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BloomError {
    #[error("Invalid false positive rate: {rate} (must be between 0 and 1, exclusive)")]
    InvalidFalsePositiveRate { rate: f64 },

    #[error("Serialized filter too short: {len} bytes, trailer alone is {trailer}")]
    TruncatedTrailer { len: usize, trailer: usize },

    #[error("Filter size exceeds maximum: {size} > {max}")]
    FilterTooLarge { size: usize, max: usize },

    #[error("Too many hash functions: {count} > {max}")]
    TooManyHashFunctions { count: usize, max: usize },

    #[error("Filter bit vector is empty")]
    EmptyFilter,

    #[error("Unknown update flag: {0}")]
    InvalidUpdateFlag(u8),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}
