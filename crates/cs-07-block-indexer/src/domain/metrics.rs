//! # Indexer Metrics
//!
//! Relaxed atomic counters shared by the cache and the pipeline.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct IndexerMetrics {
    /// Blocks asked of the network.
    pub blocks_requested: AtomicU64,
    /// Blocks received and parsed.
    pub blocks_received: AtomicU64,
    pub filters_computed: AtomicU64,
    pub headers_chained: AtomicU64,
    /// Jobs abandoned before storing their filter.
    pub jobs_cancelled: AtomicU64,
}

/// Point-in-time copy of [`IndexerMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub blocks_requested: u64,
    pub blocks_received: u64,
    pub filters_computed: u64,
    pub headers_chained: u64,
    pub jobs_cancelled: u64,
}

impl IndexerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_requested(&self, count: u64) {
        self.blocks_requested.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_received(&self) {
        self.blocks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filter(&self) {
        self.filters_computed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_header(&self) {
        self.headers_chained.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self) {
        self.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            blocks_requested: self.blocks_requested.load(Ordering::Relaxed),
            blocks_received: self.blocks_received.load(Ordering::Relaxed),
            filters_computed: self.filters_computed.load(Ordering::Relaxed),
            headers_chained: self.headers_chained.load(Ordering::Relaxed),
            jobs_cancelled: self.jobs_cancelled.load(Ordering::Relaxed),
        }
    }
}
