//! # Inbound Ports (Driving Ports)
//!
//! API exposed by the header oracle to the indexer and wallet.

use cs_04_tx_codec::Header;
use serde::{Deserialize, Serialize};
use shared_types::{BlockHash, Height, Position};

use crate::domain::HeaderRecord;
use crate::error::OracleError;

/// How the best chain moved during one call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainUpdate {
    pub previous_best: Position,
    pub best: Position,
    /// Last common block of the old and new best chains when blocks were undone.
    pub reorg_parent: Option<Position>,
    /// Old best-chain blocks that left the best chain, tip first.
    pub undone: Vec<Position>,
}

impl ChainUpdate {
    pub fn unchanged(best: Position) -> Self {
        Self {
            previous_best: best,
            best,
            reorg_parent: None,
            undone: Vec::new(),
        }
    }

    pub fn tip_changed(&self) -> bool {
        self.previous_best != self.best
    }

    pub fn is_reorg(&self) -> bool {
        !self.undone.is_empty()
    }
}

/// Primary API for the header oracle.
pub trait HeaderOracleApi: Send + Sync {
    fn add_header(&self, header: Header) -> Result<ChainUpdate, OracleError>;

    /// Ingest many headers in one atomic update. Order does not matter.
    fn add_headers(&self, headers: Vec<Header>) -> Result<ChainUpdate, OracleError>;

    fn best_chain(&self) -> Result<Position, OracleError>;

    fn best_hash(&self, height: Height) -> Result<Option<BlockHash>, OracleError>;

    /// Best-chain hashes from `start` upwards; `limit == 0` means all.
    fn best_hashes(&self, start: Height, limit: usize) -> Result<Vec<BlockHash>, OracleError>;

    fn is_in_best_chain(&self, position: &Position) -> Result<bool, OracleError>;

    fn load_header(&self, hash: &BlockHash) -> Result<Option<HeaderRecord>, OracleError>;

    fn siblings(&self) -> Result<Vec<BlockHash>, OracleError>;

    fn get_checkpoint(&self) -> Result<Option<Position>, OracleError>;

    fn add_checkpoint(&self, checkpoint: Position) -> Result<ChainUpdate, OracleError>;

    fn delete_checkpoint(&self) -> Result<ChainUpdate, OracleError>;

    /// Best-chain positions that adopting `tip` would undo, tip first.
    fn calculate_reorg(&self, tip: &Position) -> Result<Vec<Position>, OracleError>;

    /// Highest best-chain ancestor of `position`, paired with the current tip.
    fn common_parent(&self, position: &Position) -> Result<Option<(Position, Position)>, OracleError>;

    /// Path from the fork point of `start` and `target` up to `target`.
    fn ancestors(
        &self,
        start: &Position,
        target: &Position,
        limit: usize,
    ) -> Result<Vec<Position>, OracleError>;

    /// Newest best-chain hashes, tip first.
    fn recent_hashes(&self, limit: Option<usize>) -> Result<Vec<BlockHash>, OracleError>;
}
