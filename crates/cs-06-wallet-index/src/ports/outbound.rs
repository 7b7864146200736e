//! # Outbound Ports (Driven Ports)
//!
//! Testing: [`crate::adapters::memory`]

use std::sync::Arc;

use cs_02_gcs_filter::GcsFilter;
use cs_04_tx_codec::Block;
use shared_types::{BlockHash, FilterType};

use crate::domain::{Bip32Index, SubchainKey};
use crate::error::WalletError;

/// Persistence for the wallet snapshot.
pub trait WalletStorage: Send + Sync {
    /// Last saved snapshot, `None` for a new wallet.
    fn load(&self) -> Result<Option<Vec<u8>>, WalletError>;

    /// Replace the stored snapshot.
    fn save(&self, snapshot: &[u8]) -> Result<(), WalletError>;
}

/// Filters and blocks for the scanner.
///
/// `None` means the data has not arrived yet. The scanner reports
/// `Waiting` and tries again on its next step.
pub trait ChainDataSource: Send + Sync {
    fn filter(&self, filter_type: FilterType, block: &BlockHash) -> Option<GcsFilter>;

    fn block(&self, block: &BlockHash) -> Option<Arc<Block>>;
}

/// Key derivation, owned by the host wallet.
pub trait PatternSource: Send + Sync {
    /// Filter elements of the script derived at `index`.
    fn derive(&self, key: &SubchainKey, index: Bip32Index) -> Result<Vec<Vec<u8>>, WalletError>;
}
