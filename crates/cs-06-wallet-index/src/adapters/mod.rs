//! # Adapters
//!
//! In-memory implementations of the outbound ports.

pub mod memory;

pub use memory::{InMemoryChainData, InMemoryWalletStorage, ScriptPatternSource};
