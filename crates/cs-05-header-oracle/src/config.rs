//! # Header Oracle Configuration

use cs_04_tx_codec::{Header, HEADER_SIZE};
use serde::{Deserialize, Serialize};
use shared_types::{ChainType, Position, NULL_HASH};

use crate::error::OracleError;

/// Bitcoin mainnet genesis header.
pub const BITCOIN_GENESIS: [u8; HEADER_SIZE] = [
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x3b, 0xa3, 0xed, 0xfd, 0x7a, 0x7b, 0x12, 0xb2, 0x7a, 0xc7, 0x2c, 0x3e,
    0x67, 0x76, 0x8f, 0x61, 0x7f, 0xc8, 0x1b, 0xc3, 0x88, 0x8a, 0x51, 0x32, 0x3a, 0x9f, 0xb8, 0xaa,
    0x4b, 0x1e, 0x5e, 0x4a, 0x29, 0xab, 0x5f, 0x49, 0xff, 0xff, 0x00, 0x1d, 0x1d, 0xac, 0x2b, 0x7c,
];

/// Default number of hashes returned by `recent_hashes`.
pub const DEFAULT_RECENT_HASH_WINDOW: usize = 100;

/// Header oracle configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    pub chain: ChainType,

    /// Raw 80-byte genesis header, installed when storage is empty.
    pub genesis: Vec<u8>,

    /// The chain's default checkpoint.
    pub checkpoint: Option<Position>,

    /// Install `checkpoint` at start-up if storage holds none.
    pub install_default_checkpoint: bool,

    pub recent_hash_window: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self::new(ChainType::Bitcoin, BITCOIN_GENESIS.to_vec())
    }
}

impl OracleConfig {
    pub fn new(chain: ChainType, genesis: Vec<u8>) -> Self {
        Self {
            chain,
            genesis,
            checkpoint: None,
            install_default_checkpoint: true,
            recent_hash_window: DEFAULT_RECENT_HASH_WINDOW,
        }
    }

    /// Unit-test chain with a trivial genesis at the easiest difficulty.
    pub fn for_testing() -> Self {
        let genesis = Header::new(
            ChainType::UnitTest,
            1,
            NULL_HASH,
            NULL_HASH,
            0,
            ChainType::UnitTest.max_target_bits(),
            0,
        );
        Self {
            recent_hash_window: 10,
            ..Self::new(ChainType::UnitTest, genesis.serialize().to_vec())
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: Position) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn with_install_default_checkpoint(mut self, install: bool) -> Self {
        self.install_default_checkpoint = install;
        self
    }

    pub fn with_recent_hash_window(mut self, window: usize) -> Self {
        self.recent_hash_window = window;
        self
    }

    /// Parsed genesis header.
    pub fn genesis_header(&self) -> Result<Header, OracleError> {
        Ok(Header::parse(self.chain, &self.genesis)?)
    }

    pub fn validate(&self) -> Result<(), OracleError> {
        self.genesis_header()?;
        if let Some(checkpoint) = self.checkpoint {
            if checkpoint.height < 0 {
                return Err(OracleError::InvalidCheckpoint(checkpoint.height));
            }
        }
        if self.recent_hash_window == 0 {
            return Err(OracleError::InvalidConfig(
                "recent_hash_window must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
