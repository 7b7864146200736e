//! # Outbound Ports (Driven Ports)
//!
//! The persistence contract the oracle runs over. The oracle is a pure
//! logic layer; it never assumes a particular storage engine.
//!
//! Testing: [`InMemoryHeaderStorage`](crate::adapters::InMemoryHeaderStorage)

use shared_types::{BlockHash, Height, Position};

use crate::domain::{StoredHeader, UpdateBatch};
use crate::error::OracleError;

/// Header DAG persistence.
pub trait HeaderStorage: Send + Sync {
    /// Stored record for `hash`, if any.
    fn load_header(&self, hash: &BlockHash) -> Result<Option<StoredHeader>, OracleError>;

    /// Best-chain tip, `None` before genesis is installed.
    fn current_best(&self) -> Result<Option<Position>, OracleError>;

    fn current_checkpoint(&self) -> Result<Option<Position>, OracleError>;

    /// Best-chain member at `height`.
    fn best_hash(&self, height: Height) -> Result<Option<BlockHash>, OracleError>;

    /// All `(parent, child)` pairs whose parent is still unknown.
    fn disconnected_hashes(&self) -> Result<Vec<(BlockHash, BlockHash)>, OracleError>;

    fn disconnected_children(&self, parent: &BlockHash) -> Result<Vec<BlockHash>, OracleError> {
        Ok(self
            .disconnected_hashes()?
            .into_iter()
            .filter(|(p, _)| p == parent)
            .map(|(_, child)| child)
            .collect())
    }

    /// Connected headers that are not on the best chain.
    fn sibling_hashes(&self) -> Result<Vec<BlockHash>, OracleError>;

    /// Headers excluded from the best chain by the checkpoint.
    fn banned_hashes(&self) -> Result<Vec<BlockHash>, OracleError>;

    /// Apply every change in `batch`, or none of them.
    fn apply_update(&self, batch: UpdateBatch) -> Result<(), OracleError>;
}
