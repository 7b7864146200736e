//! # Block Indexer Configuration

use serde::{Deserialize, Serialize};
use shared_types::{ChainType, FilterType};

use crate::error::IndexerError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerConfig {
    pub chain: ChainType,

    pub filter_type: FilterType,

    /// Filter computations running at once.
    pub worker_count: usize,

    /// Parsed blocks kept after their filter is built.
    pub block_cache_capacity: usize,

    /// Blocks requested from the network per pipeline batch.
    pub max_in_flight: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self::new(ChainType::Bitcoin)
    }
}

impl IndexerConfig {
    pub fn new(chain: ChainType) -> Self {
        Self {
            chain,
            filter_type: chain.default_filter_type(),
            worker_count: 4,
            block_cache_capacity: 256,
            max_in_flight: 64,
        }
    }

    pub fn for_testing() -> Self {
        Self {
            worker_count: 2,
            block_cache_capacity: 16,
            max_in_flight: 4,
            ..Self::new(ChainType::UnitTest)
        }
    }

    pub fn with_filter_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = filter_type;
        self
    }

    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    pub fn with_block_cache_capacity(mut self, capacity: usize) -> Self {
        self.block_cache_capacity = capacity;
        self
    }

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max;
        self
    }

    pub fn validate(&self) -> Result<(), IndexerError> {
        for (name, value) in [
            ("worker_count", self.worker_count),
            ("block_cache_capacity", self.block_cache_capacity),
            ("max_in_flight", self.max_in_flight),
        ] {
            if value == 0 {
                return Err(IndexerError::InvalidConfig(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }
}
