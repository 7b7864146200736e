//! # Parse Errors
//!
//! Every failure while turning wire bytes into typed structures.

use cs_01_binary_codec::CodecError;
use shared_types::{display_hash, Hash};
use thiserror::Error;

/// Errors from the script, transaction, header and block parsers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A field could not be read from the buffer.
    #[error("Failed to read {context}: {source}")]
    Codec {
        context: &'static str,
        #[source]
        source: CodecError,
    },

    /// Strict script parsing met a push that runs past the script.
    #[error("Malformed push at script offset {offset}: need {needed} bytes, {available} available")]
    MalformedPush {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Strict script parsing met a byte with no opcode.
    #[error("Unknown opcode {byte:#04x} at script offset {offset}")]
    UnknownOpcode { offset: usize, byte: u8 },

    /// Segwit marker followed by a zero flag.
    #[error("Invalid segwit flag: {0:#04x}")]
    InvalidSegwitFlag(u8),

    /// Header buffers are exactly 80 bytes.
    #[error("Invalid header size: {0} bytes")]
    InvalidHeaderSize(usize),

    /// Block declared zero transactions.
    #[error("Empty block")]
    EmptyBlock,

    /// Merkle root over the txid index differs from the header.
    #[error("Merkle root mismatch: header declares {}, transactions hash to {}", display_hash(.declared), display_hash(.computed))]
    MerkleMismatch { declared: Hash, computed: Hash },

    /// Bytes left after a complete structure.
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
}

impl ParseError {
    /// Attach a field description to a codec error.
    pub fn codec(context: &'static str) -> impl FnOnce(CodecError) -> ParseError {
        move |source| match source {
            CodecError::TrailingBytes(n) => ParseError::TrailingBytes(n),
            source => ParseError::Codec { context, source },
        }
    }
}
