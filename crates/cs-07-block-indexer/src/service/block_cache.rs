//! # Block Cache
//!
//! Parsed blocks and the requests still waiting for one.
//!
//! `request` hands out a shared future per block hash. The first request
//! for a hash asks the [`BlockFetcher`]; later requests join the same
//! future. `receive` parses a downloaded block and resolves its waiters.
//! After `shutdown` no new requests are issued and every outstanding
//! future resolves to `None`.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cs_04_tx_codec::Block;
use cs_telemetry::TelemetryContext;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use lru::LruCache;
use parking_lot::Mutex;
use shared_types::{display_hash, BlockHash, ChainType};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::config::IndexerConfig;
use crate::domain::IndexerMetrics;
use crate::error::IndexerError;
use crate::ports::outbound::BlockFetcher;

const COMPONENT: &str = "block-cache";

/// Resolves to the block, or `None` if the cache shut down first.
pub type BlockFuture = Shared<BoxFuture<'static, Option<Arc<Block>>>>;

struct Pending {
    sender: oneshot::Sender<Option<Arc<Block>>>,
    future: BlockFuture,
}

struct CacheState {
    blocks: LruCache<BlockHash, Arc<Block>>,
    pending: HashMap<BlockHash, Pending>,
}

pub struct BlockCache {
    chain: ChainType,
    fetcher: Arc<dyn BlockFetcher>,
    metrics: Arc<IndexerMetrics>,
    running: AtomicBool,
    state: Mutex<CacheState>,
    telemetry: TelemetryContext,
}

fn ready(block: Option<Arc<Block>>) -> BlockFuture {
    future::ready(block).boxed().shared()
}

impl BlockCache {
    pub fn new(
        config: &IndexerConfig,
        fetcher: Arc<dyn BlockFetcher>,
        metrics: Arc<IndexerMetrics>,
        telemetry: TelemetryContext,
    ) -> Result<Self, IndexerError> {
        let capacity = NonZeroUsize::new(config.block_cache_capacity).ok_or_else(|| {
            IndexerError::InvalidConfig("block_cache_capacity must be non-zero".into())
        })?;
        Ok(Self {
            chain: config.chain,
            fetcher,
            metrics,
            running: AtomicBool::new(true),
            state: Mutex::new(CacheState {
                blocks: LruCache::new(capacity),
                pending: HashMap::new(),
            }),
            telemetry: telemetry.child(COMPONENT),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn request(&self, hash: BlockHash) -> BlockFuture {
        self.request_many(&[hash])
            .pop()
            .unwrap_or_else(|| ready(None))
    }

    /// One future per hash, in order. Hashes neither cached nor pending are
    /// passed to the fetcher in a single call.
    pub fn request_many(&self, hashes: &[BlockHash]) -> Vec<BlockFuture> {
        let mut missing = Vec::new();
        let futures = {
            let mut state = self.state.lock();
            if !self.is_running() {
                return hashes.iter().map(|_| ready(None)).collect();
            }
            hashes
                .iter()
                .map(|hash| {
                    if let Some(block) = state.blocks.get(hash) {
                        return ready(Some(block.clone()));
                    }
                    if let Some(pending) = state.pending.get(hash) {
                        return pending.future.clone();
                    }
                    let (sender, receiver) = oneshot::channel();
                    let future = receiver.map(|r| r.ok().flatten()).boxed().shared();
                    state.pending.insert(
                        *hash,
                        Pending {
                            sender,
                            future: future.clone(),
                        },
                    );
                    missing.push(*hash);
                    future
                })
                .collect()
        };

        if !missing.is_empty() {
            debug!(count = missing.len(), "Requesting blocks");
            self.metrics.record_requested(missing.len() as u64);
            self.fetcher.request_blocks(&missing);
        }
        futures
    }

    /// Parse a downloaded block and hand it to its waiters.
    pub fn receive(&self, bytes: &[u8]) -> Result<BlockHash, IndexerError> {
        let block = Block::parse(self.chain, bytes)?;
        self.insert(Arc::new(block))
    }

    /// Add an already-parsed block.
    pub fn insert(&self, block: Arc<Block>) -> Result<BlockHash, IndexerError> {
        let hash = block.hash();
        let mut state = self.state.lock();
        if !self.is_running() {
            return Err(IndexerError::Cancelled);
        }
        state.blocks.put(hash, block.clone());
        let waited = state.pending.remove(&hash).map(|p| p.sender.send(Some(block)));
        drop(state);

        self.metrics.record_received();
        debug!(
            block_hash = %display_hash(&hash),
            requested = waited.is_some(),
            "Block received"
        );
        Ok(hash)
    }

    pub fn get(&self, hash: &BlockHash) -> Option<Arc<Block>> {
        self.state.lock().blocks.get(hash).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Stop issuing requests and resolve every pending future to `None`.
    pub fn shutdown(&self) {
        let _span = self.telemetry.span().entered();
        let mut state = self.state.lock();
        self.running.store(false, Ordering::Release);
        let pending: Vec<(BlockHash, Pending)> = state.pending.drain().collect();
        drop(state);

        let count = pending.len();
        for (hash, entry) in pending {
            debug!(block_hash = %display_hash(&hash), "Abandoning block request");
            let _ = entry.sender.send(None);
        }
        info!(released = count, "Block cache shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ChannelBlockFetcher;
    use cs_04_tx_codec::test_utils::{build_block, coinbase_tx, p2pkh_output, EASY_BITS};
    use shared_types::NULL_HASH;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn cache(capacity: usize) -> (BlockCache, UnboundedReceiver<BlockHash>, Arc<IndexerMetrics>) {
        let (fetcher, requests) = ChannelBlockFetcher::new();
        let metrics = Arc::new(IndexerMetrics::new());
        let config = IndexerConfig::for_testing().with_block_cache_capacity(capacity);
        let cache = BlockCache::new(&config, Arc::new(fetcher), metrics.clone(), TelemetryContext::default()).unwrap();
        (cache, requests, metrics)
    }

    fn block(salt: u32) -> Block {
        build_block(
            ChainType::UnitTest,
            NULL_HASH,
            EASY_BITS,
            salt,
            vec![coinbase_tx(salt, vec![p2pkh_output(50, 1)])],
        )
    }

    #[tokio::test]
    async fn test_request_resolves_on_receive() {
        let (cache, mut requests, metrics) = cache(4);
        let block = block(1);
        let hash = block.hash();

        let first = cache.request(hash);
        let second = cache.request(hash);
        assert_eq!(requests.recv().await, Some(hash));
        assert!(requests.try_recv().is_err());
        assert_eq!(cache.pending_count(), 1);

        cache.receive(&block.serialize()).unwrap();
        assert_eq!(first.await.map(|b| b.hash()), Some(hash));
        assert_eq!(second.await.map(|b| b.hash()), Some(hash));
        assert_eq!(cache.pending_count(), 0);

        // Served from the cache without another fetch.
        assert!(cache.request(hash).await.is_some());
        assert!(requests.try_recv().is_err());
        assert_eq!(metrics.snapshot().blocks_requested, 1);
        assert_eq!(metrics.snapshot().blocks_received, 1);
    }

    #[tokio::test]
    async fn test_shutdown_releases_waiters() {
        let (cache, _requests, _) = cache(4);
        let waiting = cache.request([9u8; 32]);
        cache.shutdown();

        assert_eq!(waiting.await, None);
        assert!(!cache.is_running());
        assert_eq!(cache.request([8u8; 32]).await, None);
        assert!(matches!(cache.insert(Arc::new(block(1))), Err(IndexerError::Cancelled)));
    }

    #[test]
    fn test_lru_eviction() {
        let (cache, _requests, _) = cache(2);
        let blocks: Vec<_> = (1..=3).map(block).collect();
        for b in &blocks {
            cache.insert(Arc::new(b.clone())).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&blocks[0].hash()).is_none());
        assert!(cache.get(&blocks[2].hash()).is_some());
    }

    #[test]
    fn test_receive_rejects_garbage() {
        let (cache, _requests, _) = cache(2);
        assert!(matches!(cache.receive(&[0u8; 10]), Err(IndexerError::Parse(_))));
        assert!(cache.is_empty());
    }
}
