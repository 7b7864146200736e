//! # Service Layer
//!
//! [`HeaderOracle`] and the fork-choice transitions it drives.

mod fork_choice;
pub mod oracle;
pub mod transaction;

pub use oracle::HeaderOracle;
pub use transaction::UpdateTransaction;
