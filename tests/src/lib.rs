//! # Chain-Scan Test Suite
//!
//! Unified test crate for flows that cross subsystem boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── chain_flows.rs    # oracle fork choice ─→ wallet rollback ─→ rescan
//! │   └── filter_flows.rs   # block indexer filters ─→ wallet scanner
//! └── benches/
//!     └── subsystem_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cs-tests
//!
//! # Benchmarks
//! cargo bench -p cs-tests
//! ```

pub mod integration;
