//! # Domain Layer

pub mod filter;
pub mod metrics;

pub use filter::IndexedFilter;
pub use metrics::{IndexerMetrics, MetricsSnapshot};
