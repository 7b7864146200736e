//! # Inbound Ports (Driving Ports)

use cs_04_tx_codec::{Block, Transaction};
use shared_types::{BlockHash, Outpoint, Position, Txid};

use crate::domain::{
    Balance, Bip32Index, LedgerChanges, OutputState, PatternId, SubchainId, SubchainKey, TxRecord,
    TxoRecord, WalletPattern,
};
use crate::error::WalletError;

/// Wallet pattern and output operations.
///
/// Every mutating call either persists its full effect or leaves the index
/// unchanged.
pub trait WalletIndexApi: Send + Sync {
    // Patterns

    fn subchain_add_elements(
        &self,
        key: &SubchainKey,
        elements: Vec<(Bip32Index, Vec<Vec<u8>>)>,
    ) -> Result<SubchainId, WalletError>;

    fn subchain_last_indexed(&self, id: &SubchainId) -> Result<Option<Bip32Index>, WalletError>;

    fn subchain_last_used(&self, id: &SubchainId) -> Result<Option<Bip32Index>, WalletError>;

    fn subchain_last_scanned(&self, id: &SubchainId) -> Result<Option<Position>, WalletError>;

    fn subchain_set_last_scanned(
        &self,
        id: &SubchainId,
        position: Option<Position>,
    ) -> Result<(), WalletError>;

    /// Record that `patterns` have been tested against `block`.
    fn subchain_match_block(
        &self,
        id: &SubchainId,
        block: &BlockHash,
        patterns: Vec<PatternId>,
    ) -> Result<(), WalletError>;

    fn subchain_drop_index(&self, id: &SubchainId) -> Result<(), WalletError>;

    fn get_patterns(&self, id: &SubchainId) -> Result<Vec<WalletPattern>, WalletError>;

    fn get_untested_patterns(
        &self,
        id: &SubchainId,
        block: &BlockHash,
    ) -> Result<Vec<WalletPattern>, WalletError>;

    // Outputs

    /// Apply a transaction mined at `position`, matched against the
    /// elements of subchain `id`.
    fn add_confirmed_transaction(
        &self,
        id: &SubchainId,
        position: Position,
        tx: &Transaction,
    ) -> Result<LedgerChanges, WalletError>;

    /// Apply every transaction of `block` in one commit.
    fn add_confirmed_block(
        &self,
        id: &SubchainId,
        position: Position,
        block: &Block,
    ) -> Result<LedgerChanges, WalletError>;

    fn add_mempool_transaction(
        &self,
        id: &SubchainId,
        tx: &Transaction,
    ) -> Result<LedgerChanges, WalletError>;

    /// Roll back every confirmation in `undone`.
    fn reorg(&self, undone: &[Position]) -> Result<Vec<Outpoint>, WalletError>;

    /// Fails with `BalanceOverflow` when output values overflow `i64`.
    fn get_balance(&self) -> Result<Balance, WalletError>;

    fn get_outputs(&self, state: OutputState) -> Vec<(Outpoint, TxoRecord)>;

    fn output_state(&self, outpoint: &Outpoint) -> Option<OutputState>;

    fn get_transactions(&self) -> Vec<(Txid, TxRecord)>;
}
