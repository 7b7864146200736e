//! # Ports
//!
//! - **Inbound**: [`HeaderOracleApi`], what callers drive.
//! - **Outbound**: [`HeaderStorage`], what the host must provide.

pub mod inbound;
pub mod outbound;

pub use inbound::{ChainUpdate, HeaderOracleApi};
pub use outbound::HeaderStorage;
