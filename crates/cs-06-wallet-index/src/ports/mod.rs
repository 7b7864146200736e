//! # Ports
//!
//! - **Inbound**: [`WalletIndexApi`], what the scanner and callers drive.
//! - **Outbound**: [`WalletStorage`], [`ChainDataSource`] and
//!   [`PatternSource`], what the host must provide.

pub mod inbound;
pub mod outbound;

pub use inbound::WalletIndexApi;
pub use outbound::{ChainDataSource, PatternSource, WalletStorage};
