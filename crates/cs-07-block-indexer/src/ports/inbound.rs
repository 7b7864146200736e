//! # Inbound Ports (Driving Ports)

use async_trait::async_trait;
use shared_types::Position;

use crate::domain::{IndexedFilter, MetricsSnapshot};
use crate::error::IndexerError;

#[async_trait]
pub trait BlockIndexerApi: Send + Sync {
    /// Build and store filters for a contiguous ascending run of best-chain
    /// blocks. Results come back in the same order.
    async fn index_blocks(&self, positions: Vec<Position>) -> Result<Vec<IndexedFilter>, IndexerError>;

    /// Stop issuing work and release every waiter.
    fn shutdown(&self);

    fn metrics(&self) -> MetricsSnapshot;
}
