//! # Header Oracle (Subsystem 05)
//!
//! Tracks the header DAG of one chain and decides which branch is best.
//!
//! ## Header states
//!
//! | Status | Meaning |
//! |--------|---------|
//! | best-chain member | on the heaviest permitted chain |
//! | sibling | connected, valid, not best |
//! | `Disconnected` | some ancestor is unknown; reattached when it arrives |
//! | `CheckpointBanned` | conflicts with the checkpoint |
//!
//! ## Rules
//!
//! - A branch replaces the best chain only with strictly more cumulative
//!   work. Equal work keeps the existing chain.
//! - A checkpoint vetoes every header at its height with another hash,
//!   and everything built on one, regardless of work.
//! - Each call commits one [`UpdateBatch`] or nothing.
//!
//! ## Module Structure
//!
//! ```text
//! cs-05-header-oracle/
//! ├── domain/      # HeaderRecord, StoredHeader, UpdateBatch
//! ├── ports/       # HeaderOracleApi (inbound), HeaderStorage (outbound)
//! ├── service/     # HeaderOracle, UpdateTransaction, fork choice
//! ├── adapters/    # InMemoryHeaderStorage
//! └── config.rs    # OracleConfig
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::InMemoryHeaderStorage;
pub use config::{OracleConfig, BITCOIN_GENESIS};
pub use domain::{HeaderRecord, HeaderStatus, StoredHeader, UpdateBatch};
pub use error::OracleError;
pub use ports::{ChainUpdate, HeaderOracleApi, HeaderStorage};
pub use service::{HeaderOracle, UpdateTransaction};
