//! # Wallet Index Configuration

use serde::{Deserialize, Serialize};
use shared_types::Height;

use crate::error::WalletError;

/// Unused indices kept derived past the last used one.
pub const DEFAULT_LOOKAHEAD: u32 = 20;
/// Blocks examined per scanner step.
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub lookahead: u32,
    pub batch_size: usize,

    /// Re-test the current block when lookahead derives new patterns.
    pub rescan_enabled: bool,

    /// First height a fresh subchain scans, usually the wallet birthday.
    pub start_height: Height,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_LOOKAHEAD,
            batch_size: DEFAULT_BATCH_SIZE,
            rescan_enabled: true,
            start_height: 0,
        }
    }
}

impl WalletConfig {
    /// Small windows so tests exercise lookahead and batching quickly.
    pub fn for_testing() -> Self {
        Self {
            lookahead: 3,
            batch_size: 4,
            ..Self::default()
        }
    }

    pub fn with_lookahead(mut self, lookahead: u32) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_rescan(mut self, enabled: bool) -> Self {
        self.rescan_enabled = enabled;
        self
    }

    pub fn with_start_height(mut self, height: Height) -> Self {
        self.start_height = height;
        self
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.lookahead == 0 {
            return Err(WalletError::InvalidConfig("lookahead must be non-zero".into()));
        }
        if self.batch_size == 0 {
            return Err(WalletError::InvalidConfig("batch_size must be non-zero".into()));
        }
        if self.start_height < 0 {
            return Err(WalletError::InvalidConfig(format!(
                "start_height {} is negative",
                self.start_height
            )));
        }
        Ok(())
    }
}
