//! # Filter Pipeline
//!
//! Builds compact filters for a run of best-chain blocks.
//!
//! ```text
//! header check ─→ block future ─→ filter (≤ worker_count at once)
//!                                    │
//!         previous header future ────┴─→ filter header ─→ store ─→ next job
//! ```
//!
//! Block downloads and filter computation run in parallel. Filter headers
//! are chained strictly in ascending height: each job awaits the header
//! future of the job below it, and only holds a worker permit while it
//! computes its filter. A shutdown signal is checked before each stage.

use std::sync::Arc;

use async_trait::async_trait;
use cs_02_gcs_filter::GENESIS_PREVIOUS_HEADER;
use cs_04_tx_codec::compute_block_filter;
use cs_05_header_oracle::{HeaderOracleApi, HeaderRecord};
use cs_telemetry::{log_block_event, TelemetryContext};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use shared_types::{display_hash, FilterType, Hash, Position};
use tokio::sync::{oneshot, watch, Semaphore};
use tracing::{debug, info, warn};

use super::block_cache::{BlockCache, BlockFuture};
use crate::config::IndexerConfig;
use crate::domain::{IndexedFilter, IndexerMetrics, MetricsSnapshot};
use crate::error::IndexerError;
use crate::ports::inbound::BlockIndexerApi;
use crate::ports::outbound::{BlockFetcher, FilterStorage, PreviousOutputs};

const COMPONENT: &str = "filter-pipeline";

/// Resolves to the filter header of one job, `None` if that job failed.
type HeaderFuture = Shared<BoxFuture<'static, Option<Hash>>>;

pub struct FilterPipeline<S: FilterStorage + 'static> {
    config: IndexerConfig,
    cache: Arc<BlockCache>,
    oracle: Arc<dyn HeaderOracleApi>,
    storage: Arc<S>,
    previous_outputs: Arc<dyn PreviousOutputs>,
    workers: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
    metrics: Arc<IndexerMetrics>,
    telemetry: TelemetryContext,
}

impl<S: FilterStorage + 'static> FilterPipeline<S> {
    pub fn new(
        config: IndexerConfig,
        fetcher: Arc<dyn BlockFetcher>,
        oracle: Arc<dyn HeaderOracleApi>,
        storage: Arc<S>,
        previous_outputs: Arc<dyn PreviousOutputs>,
        telemetry: TelemetryContext,
    ) -> Result<Self, IndexerError> {
        config.validate()?;
        let telemetry = telemetry.with_chain(config.chain);
        let metrics = Arc::new(IndexerMetrics::new());
        let cache = Arc::new(BlockCache::new(&config, fetcher, metrics.clone(), telemetry.clone())?);
        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            workers: Arc::new(Semaphore::new(config.worker_count)),
            config,
            cache,
            oracle,
            storage,
            previous_outputs,
            shutdown,
            metrics,
            telemetry: telemetry.child(COMPONENT),
        })
    }

    /// The cache downloaded blocks are delivered to.
    pub fn cache(&self) -> &Arc<BlockCache> {
        &self.cache
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Connected oracle records for `positions`, checked to form one chain.
    fn check_headers(&self, positions: &[Position]) -> Result<Vec<HeaderRecord>, IndexerError> {
        let mut records: Vec<HeaderRecord> = Vec::with_capacity(positions.len());
        for position in positions {
            let record = self
                .oracle
                .load_header(&position.hash)?
                .filter(|r| r.is_connected() && r.height == position.height)
                .ok_or_else(|| IndexerError::UnknownHeader {
                    hash: display_hash(&position.hash),
                    height: position.height,
                })?;
            if let Some(below) = records.last() {
                if record.previous() != below.hash() {
                    return Err(IndexerError::NonContiguous);
                }
            }
            records.push(record);
        }
        Ok(records)
    }

    async fn previous_header(&self, first: &HeaderRecord) -> Result<Hash, IndexerError> {
        if first.height == 0 {
            return Ok(GENESIS_PREVIOUS_HEADER);
        }
        self.storage
            .load_filter_header(self.config.filter_type, &first.previous())
            .await?
            .ok_or(IndexerError::MissingPreviousHeader(first.height))
    }

    /// Run one batch of jobs chained onto `previous`.
    async fn run_batch(
        &self,
        positions: &[Position],
        previous: Hash,
    ) -> Result<Vec<IndexedFilter>, IndexerError> {
        let hashes: Vec<_> = positions.iter().map(|p| p.hash).collect();
        let blocks = self.cache.request_many(&hashes);

        let mut below: HeaderFuture = future::ready(Some(previous)).boxed().shared();
        let mut handles = Vec::with_capacity(positions.len());
        for (position, block) in positions.iter().zip(blocks) {
            let (header_sender, receiver) = oneshot::channel();
            let job = FilterJob {
                position: *position,
                filter_type: self.config.filter_type,
                block,
                previous_header: below,
                header_sender,
                workers: self.workers.clone(),
                shutdown: self.shutdown.subscribe(),
                storage: self.storage.clone(),
                previous_outputs: self.previous_outputs.clone(),
                metrics: self.metrics.clone(),
            };
            below = receiver.map(Result::ok).boxed().shared();
            handles.push(tokio::spawn(job.run()));
        }

        let mut filters = Vec::with_capacity(handles.len());
        let mut failure = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(filter)) => filters.push(filter),
                Ok(Err(e)) => {
                    failure.get_or_insert(e);
                }
                Err(e) => {
                    failure.get_or_insert(IndexerError::Worker(e.to_string()));
                }
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(filters),
        }
    }
}

#[async_trait]
impl<S: FilterStorage + 'static> BlockIndexerApi for FilterPipeline<S> {
    async fn index_blocks(&self, positions: Vec<Position>) -> Result<Vec<IndexedFilter>, IndexerError> {
        if positions.is_empty() {
            return Ok(Vec::new());
        }
        if positions.windows(2).any(|w| w[1].height != w[0].height + 1) {
            return Err(IndexerError::NonContiguous);
        }
        if self.is_shut_down() {
            return Err(IndexerError::Cancelled);
        }

        let records = self.check_headers(&positions)?;
        let first = &records[0];
        let mut previous = self.previous_header(first).await?;

        let mut indexed = Vec::with_capacity(positions.len());
        for batch in positions.chunks(self.config.max_in_flight) {
            let filters = match self.run_batch(batch, previous).await {
                Ok(filters) => filters,
                Err(e) => {
                    warn!(parent: &self.telemetry.span(), error = %e, "Filter batch failed");
                    return Err(e);
                }
            };
            if let Some(last) = filters.last() {
                previous = last.header;
                log_block_event!(
                    info,
                    COMPONENT,
                    "Filters indexed",
                    last.position.height,
                    display_hash(&last.position.hash),
                    count = filters.len()
                );
            }
            indexed.extend(filters);
        }
        Ok(indexed)
    }

    fn shutdown(&self) {
        self.shutdown.send_replace(true);
        self.cache.shutdown();
        info!(parent: &self.telemetry.span(), "Filter pipeline shut down");
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Resolves once shutdown is signalled or the pipeline is gone.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Everything one block's job needs, moved into its task.
struct FilterJob<S: FilterStorage> {
    position: Position,
    filter_type: FilterType,
    block: BlockFuture,
    previous_header: HeaderFuture,
    header_sender: oneshot::Sender<Hash>,
    workers: Arc<Semaphore>,
    shutdown: watch::Receiver<bool>,
    storage: Arc<S>,
    previous_outputs: Arc<dyn PreviousOutputs>,
    metrics: Arc<IndexerMetrics>,
}

impl<S: FilterStorage> FilterJob<S> {
    async fn run(mut self) -> Result<IndexedFilter, IndexerError> {
        let permit = tokio::select! {
            biased;
            _ = stopped(&mut self.shutdown) => None,
            permit = self.workers.clone().acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit else {
            return Err(self.cancel("waiting for a worker"));
        };

        let block = tokio::select! {
            biased;
            _ = stopped(&mut self.shutdown) => None,
            block = self.block.clone() => block,
        };
        let Some(block) = block else {
            return Err(self.cancel("waiting for the block"));
        };
        let scripts = self.previous_outputs.previous_scripts(&block)?;
        let filter = compute_block_filter(&block, self.filter_type, &scripts)?;
        self.metrics.record_filter();
        drop(permit);

        let previous = tokio::select! {
            biased;
            _ = stopped(&mut self.shutdown) => None,
            header = self.previous_header.clone() => header,
        };
        let Some(previous) = previous else {
            return Err(self.cancel("waiting for the previous filter header"));
        };

        let indexed = IndexedFilter::new(self.position, self.filter_type, &filter, &previous);
        self.storage.store_filter(indexed.clone()).await?;
        self.metrics.record_header();
        debug!(
            height = self.position.height,
            filter_header = %display_hash(&indexed.header),
            "Filter header chained"
        );
        let _ = self.header_sender.send(indexed.header);
        Ok(indexed)
    }

    fn cancel(&self, stage: &'static str) -> IndexerError {
        self.metrics.record_cancelled();
        debug!(height = self.position.height, stage, "Filter job cancelled");
        IndexerError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ChannelBlockFetcher, InMemoryFilterStorage, InMemoryPreviousOutputs};
    use cs_02_gcs_filter::compute_filter_headers;
    use cs_04_tx_codec::test_utils::{build_block, coinbase_tx, p2pkh_output, spend_tx, EASY_BITS};
    use cs_04_tx_codec::Block;
    use cs_05_header_oracle::{HeaderOracle, InMemoryHeaderStorage, OracleConfig};
    use shared_types::{BlockHash, ChainType, Outpoint};
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Harness {
        pipeline: Arc<FilterPipeline<InMemoryFilterStorage>>,
        requests: UnboundedReceiver<BlockHash>,
        outputs: Arc<InMemoryPreviousOutputs>,
        blocks: Vec<Block>,
    }

    /// Oracle and pipeline over `count` blocks on top of genesis. Block 2
    /// spends the coinbase of block 1.
    fn harness(count: u32, config: IndexerConfig) -> Harness {
        let oracle_config = OracleConfig::for_testing();
        let genesis = oracle_config.genesis_header().unwrap();
        let oracle = Arc::new(
            HeaderOracle::new(
                Arc::new(InMemoryHeaderStorage::new()),
                oracle_config,
                TelemetryContext::default(),
            )
            .unwrap(),
        );

        let mut previous = genesis.hash();
        let mut blocks = Vec::new();
        let mut funding: Option<Outpoint> = None;
        for i in 1..=count {
            let mut txs = vec![coinbase_tx(i, vec![p2pkh_output(50, i as u8)])];
            if let Some(outpoint) = funding.take() {
                txs.push(spend_tx(&[outpoint], vec![p2pkh_output(40, 0xaa)]));
            }
            let block = build_block(ChainType::UnitTest, previous, EASY_BITS, i, txs);
            if i == 1 {
                funding = Some(Outpoint::new(block.transactions()[0].txid(), 0));
            }
            oracle.add_header(block.header().clone()).unwrap();
            previous = block.hash();
            blocks.push(block);
        }

        let outputs = Arc::new(InMemoryPreviousOutputs::new());
        for block in &blocks {
            outputs.add_block(block);
        }
        let (fetcher, requests) = ChannelBlockFetcher::new();
        let pipeline = FilterPipeline::new(
            config,
            Arc::new(fetcher),
            oracle,
            Arc::new(InMemoryFilterStorage::new()),
            outputs.clone(),
            TelemetryContext::default(),
        )
        .unwrap();
        Harness {
            pipeline: Arc::new(pipeline),
            requests,
            outputs,
            blocks,
        }
    }

    fn positions(blocks: &[Block], first_height: i64) -> Vec<Position> {
        blocks
            .iter()
            .enumerate()
            .map(|(i, b)| Position::new(first_height + i as i64, b.hash()))
            .collect()
    }

    /// Serve requested blocks in reverse order of request.
    async fn serve_reversed(h: &mut Harness, count: usize) {
        let mut requested = Vec::new();
        while requested.len() < count {
            match h.requests.recv().await {
                Some(hash) => requested.push(hash),
                None => break,
            }
        }
        for hash in requested.into_iter().rev() {
            let block = h.blocks.iter().find(|b| b.hash() == hash).unwrap();
            h.pipeline.cache().receive(&block.serialize()).unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_headers_chain_in_order_despite_reverse_delivery() {
        let mut h = harness(4, IndexerConfig::for_testing().with_max_in_flight(8));
        let pipeline = h.pipeline.clone();
        let positions = positions(&h.blocks, 1);
        let task = tokio::spawn(async move { pipeline.index_blocks(positions).await });

        serve_reversed(&mut h, 4).await;
        let filters = task.await.unwrap().unwrap();

        let storage = h.pipeline.storage();
        assert_eq!(storage.stored_heights(), vec![1, 2, 3, 4]);
        let hashes: Vec<Hash> = filters.iter().map(|f| f.filter_hash).collect();
        let expected = compute_filter_headers(&GENESIS_PREVIOUS_HEADER, &hashes);
        assert_eq!(filters.iter().map(|f| f.header).collect::<Vec<_>>(), expected);

        let metrics = h.pipeline.metrics();
        assert_eq!(metrics.blocks_requested, 4);
        assert_eq!(metrics.filters_computed, 4);
        assert_eq!(metrics.headers_chained, 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spent_scripts_are_in_filter() {
        let h = harness(2, IndexerConfig::for_testing());
        for block in &h.blocks {
            h.pipeline.cache().insert(Arc::new(block.clone())).unwrap();
        }
        let filters = h.pipeline.index_blocks(positions(&h.blocks, 1)).await.unwrap();

        let spent_script = h.blocks[0].transactions()[0].outputs()[0].script().serialize();
        let filter = cs_02_gcs_filter::GcsFilter::decode_for_block(
            FilterType::BasicBip158,
            &h.blocks[1].hash(),
            &filters[1].filter,
        )
        .unwrap();
        assert!(filter.test(&spent_script));
        assert_eq!(h.outputs.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_batches_continue_the_chain() {
        let h = harness(5, IndexerConfig::for_testing().with_max_in_flight(2));
        for block in &h.blocks {
            h.pipeline.cache().insert(Arc::new(block.clone())).unwrap();
        }
        let first = h.pipeline.index_blocks(positions(&h.blocks[..3], 1)).await.unwrap();
        let rest = h.pipeline.index_blocks(positions(&h.blocks[3..], 4)).await.unwrap();

        let hashes: Vec<Hash> = first.iter().chain(&rest).map(|f| f.filter_hash).collect();
        let expected = compute_filter_headers(&GENESIS_PREVIOUS_HEADER, &hashes);
        assert_eq!(rest.last().map(|f| f.header), expected.last().copied());
        assert_eq!(h.pipeline.storage().stored_heights(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let h = harness(3, IndexerConfig::for_testing());
        let mut gap = positions(&h.blocks, 1);
        gap.remove(1);
        assert!(matches!(h.pipeline.index_blocks(gap).await, Err(IndexerError::NonContiguous)));

        let unknown = vec![Position::new(1, [0xab; 32])];
        assert!(matches!(
            h.pipeline.index_blocks(unknown).await,
            Err(IndexerError::UnknownHeader { height: 1, .. })
        ));

        // Height 2 without a stored header for height 1.
        let orphan = positions(&h.blocks[1..2], 2);
        assert!(matches!(
            h.pipeline.index_blocks(orphan).await,
            Err(IndexerError::MissingPreviousHeader(2))
        ));
        assert!(h.pipeline.index_blocks(Vec::new()).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_cancels_waiting_jobs() {
        let h = harness(3, IndexerConfig::for_testing());
        let pipeline = h.pipeline.clone();
        let positions = positions(&h.blocks, 1);
        let task = tokio::spawn(async move { pipeline.index_blocks(positions).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        h.pipeline.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("jobs must not hang after shutdown")
            .unwrap();

        assert!(matches!(result, Err(IndexerError::Cancelled)));
        assert_eq!(h.pipeline.metrics().jobs_cancelled, 3);
        assert!(h.pipeline.storage().stored_heights().is_empty());
        assert!(matches!(
            h.pipeline.index_blocks(Vec::from([Position::new(1, h.blocks[0].hash())])).await,
            Err(IndexerError::Cancelled)
        ));
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(12))]

        #[test]
        fn test_headers_independent_of_parallelism(workers in 1usize..4, in_flight in 1usize..5) {
            let config = IndexerConfig::for_testing()
                .with_worker_count(workers)
                .with_max_in_flight(in_flight);
            let h = harness(5, config);
            for block in &h.blocks {
                h.pipeline.cache().insert(Arc::new(block.clone())).unwrap();
            }
            let filters = tokio_test::block_on(h.pipeline.index_blocks(positions(&h.blocks, 1))).unwrap();

            let hashes: Vec<Hash> = filters.iter().map(|f| f.filter_hash).collect();
            let expected = compute_filter_headers(&GENESIS_PREVIOUS_HEADER, &hashes);
            proptest::prop_assert_eq!(filters.iter().map(|f| f.header).collect::<Vec<_>>(), expected);
            proptest::prop_assert_eq!(h.pipeline.storage().stored_heights(), vec![1, 2, 3, 4, 5]);
        }
    }
}
