//! # Integration Flows
//!
//! Subsystems wired through their ports with in-memory adapters.

pub mod chain_flows;
pub mod filter_flows;
