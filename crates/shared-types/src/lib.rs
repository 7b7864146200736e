//! # Shared Types Crate
//!
//! Value types used across the Chain-Scan subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: hashes, positions, chain identifiers and
//!   outpoints are defined once here and re-exported by every crate.
//! - **Raw Ordering**: [`Outpoint`] orders by its 36-byte wire layout, so any
//!   ordered container keyed by it matches the persisted key order.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
