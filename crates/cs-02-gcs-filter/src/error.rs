//! Error types for GCS filters.

use cs_01_binary_codec::CodecError;
use thiserror::Error;

/// Errors from building, decoding or querying a GCS filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GcsError {
    #[error("Invalid SipHash key size: expected 16, got {0}")]
    InvalidKeySize(usize),

    #[error("Too many elements: {0} exceeds u32 range")]
    TooManyElements(usize),

    #[error("Invalid Golomb parameter: {0}")]
    InvalidParameter(u8),

    #[error("Bitstream ended after {decoded} of {expected} elements")]
    TruncatedStream { decoded: u32, expected: u32 },

    #[error("Decoded value overflows u64")]
    ValueOverflow,

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}
