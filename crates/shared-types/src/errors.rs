//! # Error Types
//!
//! Errors raised while constructing shared value types.

use thiserror::Error;

/// Errors from parsing or converting shared types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// A fixed-size value had the wrong number of bytes.
    #[error("Invalid {what} length: expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Hex text could not be decoded.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Unrecognised chain tag.
    #[error("Unknown chain tag: {0}")]
    UnknownChain(u8),

    /// Unrecognised filter type tag.
    #[error("Unknown filter type: {0:#04x}")]
    UnknownFilterType(u8),
}
