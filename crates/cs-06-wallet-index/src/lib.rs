//! # Wallet Index (Subsystem 06)
//!
//! Pattern tables, the UTXO lifecycle and the poll-based subchain scanner.
//!
//! ## Output lifecycle
//!
//! | State | Counted in balance |
//! |-------|--------------------|
//! | `UnconfirmedNew` | unconfirmed |
//! | `ConfirmedNew` | confirmed |
//! | `UnconfirmedSpend` | no |
//! | `ConfirmedSpend` | no |
//! | `OrphanedNew` | no |
//! | `OrphanedSpend` | no |
//!
//! An outpoint is in exactly one state at a time. All transitions go
//! through `UtxoLedger::change_state`.
//!
//! ## Identifiers
//!
//! - `SubchainId = sha256(account ∥ subchain ∥ filter type ∥ version)`
//! - `PatternId = sha256(subchain id ∥ index)`
//!
//! ## Module Structure
//!
//! ```text
//! cs-06-wallet-index/
//! ├── domain/      # Subchain ids, PatternIndex, UtxoLedger, WalletSnapshot
//! ├── ports/       # WalletIndexApi (inbound); WalletStorage, ChainDataSource, PatternSource (outbound)
//! ├── service/     # WalletIndex, SubchainScanner
//! ├── adapters/    # in-memory storage, chain data and derivation
//! └── config.rs    # WalletConfig
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryChainData, InMemoryWalletStorage, ScriptPatternSource};
pub use config::WalletConfig;
pub use domain::{
    pattern_id, Balance, Bip32Index, LedgerChanges, OutputState, PatternId, Subchain, SubchainId,
    SubchainKey, TxRecord, TxoRecord, UtxoLedger, WalletPattern, WalletSnapshot,
};
pub use error::WalletError;
pub use ports::{ChainDataSource, PatternSource, WalletIndexApi, WalletStorage};
pub use service::{ScanProgress, ScannerDeps, SubchainScanner, WalletIndex};
