//! Error types for the binary codec.

use thiserror::Error;

/// Failures while decoding wire bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A read would run past the end of the buffer.
    #[error("Truncated {field}: need {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    /// CompactSize payloads are 0, 1, 2, 4 or 8 bytes.
    #[error("Invalid CompactSize payload length: {0}")]
    InvalidCompactSizeLength(usize),

    /// A decoded length does not fit the platform or a protocol limit.
    #[error("{field} too large: {value}")]
    Overflow { field: &'static str, value: u64 },

    /// Bytes remained after a complete structure was decoded.
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
}
