//! # Block Indexer Errors

use cs_02_gcs_filter::GcsError;
use cs_04_tx_codec::ParseError;
use cs_05_header_oracle::OracleError;
use thiserror::Error;

/// Block indexer error types.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Received block bytes did not parse.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Filter error: {0}")]
    Filter(#[from] GcsError),

    #[error("Header oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// The oracle has no connected header for the block.
    #[error("Unknown header {hash} at height {height}")]
    UnknownHeader { hash: String, height: i64 },

    /// The filter header below the first requested block is not stored.
    #[error("No filter header below height {0}")]
    MissingPreviousHeader(i64),

    /// A spent output the filter needs could not be resolved.
    #[error("Missing previous output {0}")]
    MissingPreviousOutput(String),

    /// Positions handed to the pipeline are not one ascending run.
    #[error("Positions must be contiguous and ascending")]
    NonContiguous,

    /// The job was abandoned because the indexer shut down.
    #[error("Indexer shut down")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
