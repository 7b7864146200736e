//! In-memory adapters for tests and embedding.

use std::collections::HashMap;

use async_trait::async_trait;
use cs_04_tx_codec::Block;
use parking_lot::RwLock;
use shared_types::{display_hash, BlockHash, FilterType, Hash, Height, Outpoint};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

use crate::domain::IndexedFilter;
use crate::error::IndexerError;
use crate::ports::outbound::{BlockFetcher, FilterStorage, PreviousOutputs};

/// Forwards every requested hash to a channel.
pub struct ChannelBlockFetcher {
    sender: UnboundedSender<BlockHash>,
}

impl ChannelBlockFetcher {
    pub fn new() -> (Self, UnboundedReceiver<BlockHash>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl BlockFetcher for ChannelBlockFetcher {
    fn request_blocks(&self, hashes: &[BlockHash]) {
        for hash in hashes {
            if self.sender.send(*hash).is_err() {
                warn!(block_hash = %display_hash(hash), "Block request dropped, receiver closed");
                return;
            }
        }
    }
}

#[derive(Default)]
struct StoredFilters {
    by_block: HashMap<(FilterType, BlockHash), IndexedFilter>,
    /// Heights in the order they were stored.
    log: Vec<Height>,
}

#[derive(Default)]
pub struct InMemoryFilterStorage {
    inner: RwLock<StoredFilters>,
    headers: RwLock<HashMap<(FilterType, BlockHash), Hash>>,
}

impl InMemoryFilterStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a filter header without a filter, e.g. a checkpointed one.
    pub fn set_header(&self, filter_type: FilterType, block: BlockHash, header: Hash) {
        self.headers.write().insert((filter_type, block), header);
    }

    pub fn filter(&self, filter_type: FilterType, block: &BlockHash) -> Option<IndexedFilter> {
        self.inner.read().by_block.get(&(filter_type, *block)).cloned()
    }

    pub fn stored_heights(&self) -> Vec<Height> {
        self.inner.read().log.clone()
    }
}

#[async_trait]
impl FilterStorage for InMemoryFilterStorage {
    async fn load_filter_header(
        &self,
        filter_type: FilterType,
        block: &BlockHash,
    ) -> Result<Option<Hash>, IndexerError> {
        if let Some(filter) = self.inner.read().by_block.get(&(filter_type, *block)) {
            return Ok(Some(filter.header));
        }
        Ok(self.headers.read().get(&(filter_type, *block)).copied())
    }

    async fn store_filter(&self, filter: IndexedFilter) -> Result<(), IndexerError> {
        let mut inner = self.inner.write();
        inner.log.push(filter.position.height);
        inner
            .by_block
            .insert((filter.filter_type, filter.position.hash), filter);
        Ok(())
    }
}

/// Output scripts of every block added, looked up by outpoint.
#[derive(Default)]
pub struct InMemoryPreviousOutputs {
    scripts: RwLock<HashMap<Outpoint, Vec<u8>>>,
}

impl InMemoryPreviousOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&self, block: &Block) {
        let mut scripts = self.scripts.write();
        for tx in block.transactions() {
            let txid = tx.txid();
            for (index, output) in tx.outputs().iter().enumerate() {
                scripts.insert(Outpoint::new(txid, index as u32), output.script().serialize());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.scripts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PreviousOutputs for InMemoryPreviousOutputs {
    fn previous_scripts(&self, block: &Block) -> Result<Vec<Vec<u8>>, IndexerError> {
        // Outputs created earlier in the same block resolve without add_block.
        let mut local = HashMap::new();
        let scripts = self.scripts.read();
        let mut found = Vec::new();
        for tx in block.transactions() {
            for input in tx.inputs().iter().filter(|i| !i.is_coinbase()) {
                let outpoint = input.previous();
                let script = scripts
                    .get(outpoint)
                    .or_else(|| local.get(outpoint))
                    .ok_or_else(|| {
                        IndexerError::MissingPreviousOutput(format!(
                            "{}:{}",
                            display_hash(&outpoint.txid),
                            outpoint.index
                        ))
                    })?;
                found.push(script.clone());
            }
            let txid = tx.txid();
            for (index, output) in tx.outputs().iter().enumerate() {
                local.insert(Outpoint::new(txid, index as u32), output.script().serialize());
            }
        }
        Ok(found)
    }
}
