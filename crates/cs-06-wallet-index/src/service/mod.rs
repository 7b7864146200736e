//! # Service Layer
//!
//! [`WalletIndex`] owns the wallet state; [`SubchainScanner`] drives it
//! from filters and blocks.

pub mod index;
pub mod scanner;

pub use index::WalletIndex;
pub use scanner::{ScanProgress, ScannerDeps, SubchainScanner};
