//! # Wallet Index Errors

use cs_04_tx_codec::ParseError;
use cs_05_header_oracle::OracleError;
use thiserror::Error;

/// Wallet index error types.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Stored transaction or output bytes did not parse.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Header oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// No patterns have been registered for the subchain.
    #[error("Unknown subchain: {0}")]
    UnknownSubchain(String),

    /// Derivation reached the last non-hardened index.
    #[error("Subchain {subchain} exhausted at index {index}")]
    IndexExhausted { subchain: String, index: u32 },

    /// An index was registered twice with different elements.
    #[error("Conflicting elements for subchain {subchain} index {index}")]
    ConflictingPattern { subchain: String, index: u32 },

    /// Summed output values left the `i64` range.
    #[error("Balance overflow in {0} outputs")]
    BalanceOverflow(&'static str),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The storage or key-derivation collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<bincode::Error> for WalletError {
    fn from(e: bincode::Error) -> Self {
        WalletError::Serialization(e.to_string())
    }
}
