//! # Ports
//!
//! - **Inbound**: [`BlockIndexerApi`]
//! - **Outbound**: [`BlockFetcher`], [`FilterStorage`], [`PreviousOutputs`]

pub mod inbound;
pub mod outbound;

pub use inbound::BlockIndexerApi;
pub use outbound::{BlockFetcher, FilterStorage, PreviousOutputs};
