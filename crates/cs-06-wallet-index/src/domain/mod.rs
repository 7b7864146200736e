//! # Domain Layer
//!
//! Pattern tables and the UTXO ledger. Pure data structures; the service
//! layer owns locking and persistence.

pub mod ledger;
pub mod patterns;
pub mod subchain;

pub use ledger::{Balance, LedgerChanges, OutputState, TxRecord, TxoRecord, UtxoLedger};
pub use patterns::{PatternIndex, WalletPattern};
pub use subchain::{pattern_id, AccountId, Bip32Index, PatternId, Subchain, SubchainId, SubchainKey, MAX_INDEX};

use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Everything the wallet index persists, written as one bincode blob.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub patterns: PatternIndex,
    pub ledger: UtxoLedger,
}

impl WalletSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, WalletError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
