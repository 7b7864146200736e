//! # Outbound Ports (Driven Ports)

use async_trait::async_trait;
use cs_04_tx_codec::Block;
use shared_types::{BlockHash, FilterType, Hash};

use crate::domain::IndexedFilter;
use crate::error::IndexerError;

/// Peer-networking collaborator.
///
/// Requests are fire-and-forget. Downloaded blocks come back through
/// [`BlockCache::receive`](crate::service::BlockCache::receive).
pub trait BlockFetcher: Send + Sync {
    fn request_blocks(&self, hashes: &[BlockHash]);
}

/// Filter and filter-header persistence.
#[async_trait]
pub trait FilterStorage: Send + Sync {
    async fn load_filter_header(
        &self,
        filter_type: FilterType,
        block: &BlockHash,
    ) -> Result<Option<Hash>, IndexerError>;

    /// Called in ascending height order per filter type.
    async fn store_filter(&self, filter: IndexedFilter) -> Result<(), IndexerError>;
}

/// Scripts of the outputs a block spends.
pub trait PreviousOutputs: Send + Sync {
    /// One script per non-coinbase input of `block`.
    fn previous_scripts(&self, block: &Block) -> Result<Vec<Vec<u8>>, IndexerError>;
}
