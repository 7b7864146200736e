//! # Block Indexer (Subsystem 07)
//!
//! Downloads best-chain blocks, computes their compact filters in parallel
//! and stores them with filter headers chained in height order.
//!
//! ## Pipeline
//!
//! ```text
//! index_blocks(positions)
//!   ├─ check headers against the oracle (connected, contiguous)
//!   ├─ load the filter header below the first position
//!   └─ per batch of max_in_flight blocks:
//!        BlockCache::request_many ──→ BlockFetcher
//!        FilterJob × n ──→ filter ──→ header(previous) ──→ FilterStorage
//! ```
//!
//! | Stage | Parallel | Ordered |
//! |-------|----------|---------|
//! | Block download | yes | no |
//! | Filter computation | up to `worker_count` | no |
//! | Header chaining and storage | no | ascending height |
//!
//! `shutdown` resolves every pending block future to `None` and cancels
//! waiting jobs with [`IndexerError::Cancelled`].
//!
//! ## Module Structure
//!
//! ```text
//! cs-07-block-indexer/
//! ├── domain/      # IndexedFilter, IndexerMetrics
//! ├── ports/       # BlockIndexerApi (inbound); BlockFetcher, FilterStorage, PreviousOutputs (outbound)
//! ├── service/     # BlockCache, FilterPipeline
//! ├── adapters/    # channel fetcher, in-memory storage and previous outputs
//! └── config.rs    # IndexerConfig
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{ChannelBlockFetcher, InMemoryFilterStorage, InMemoryPreviousOutputs};
pub use config::IndexerConfig;
pub use domain::{IndexedFilter, IndexerMetrics, MetricsSnapshot};
pub use error::IndexerError;
pub use ports::{BlockFetcher, BlockIndexerApi, FilterStorage, PreviousOutputs};
pub use service::{BlockCache, BlockFuture, FilterPipeline};
