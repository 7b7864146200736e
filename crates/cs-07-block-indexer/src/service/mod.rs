//! # Service Layer
//!
//! [`BlockCache`] collects downloaded blocks; [`FilterPipeline`] turns
//! them into stored, chained filters.

pub mod block_cache;
pub mod pipeline;

pub use block_cache::{BlockCache, BlockFuture};
pub use pipeline::FilterPipeline;
