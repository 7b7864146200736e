//! # Oracle Errors

use cs_04_tx_codec::ParseError;
use shared_types::{ChainType, Height};
use thiserror::Error;

/// Header oracle error types.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Header bytes did not parse.
    #[error("Invalid header: {0}")]
    Parse(#[from] ParseError),

    /// A header or stored record belongs to another chain.
    #[error("Wrong chain: expected {expected:?}, found {actual:?}")]
    WrongChain { expected: ChainType, actual: ChainType },

    /// Stored chain state was built from a different genesis header.
    #[error("Genesis mismatch: storage holds {stored}, configured {configured}")]
    GenesisMismatch { stored: String, configured: String },

    /// Checkpoints pin a non-negative height.
    #[error("Invalid checkpoint height: {0}")]
    InvalidCheckpoint(Height),

    /// A stored record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The storage collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal bookkeeping points at a header that is not stored.
    #[error("Missing header record: {0}")]
    MissingHeader(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<bincode::Error> for OracleError {
    fn from(e: bincode::Error) -> Self {
        OracleError::Serialization(e.to_string())
    }
}
