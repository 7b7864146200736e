//! # Transaction Codec (Subsystem 04)
//!
//! Turns wire bytes into scripts, transactions, headers and blocks, and
//! derives from them everything the scanner needs: txids, normalized ids,
//! Merkle roots, chain work, filter elements and block filters.
//!
//! ## Parse boundaries
//!
//! | Entry point | Failure |
//! |-------------|---------|
//! | [`Script::parse`] | strict: malformed push, unknown opcode |
//! | [`Transaction::parse`] | truncation, zero segwit flag, trailing bytes |
//! | [`Header::parse`] | not 80 bytes |
//! | [`Block::parse`] | empty block, Merkle mismatch, trailing bytes |
//!
//! Every read is bounds-checked by `cs-01-binary-codec` before it happens.

pub mod block;
pub mod error;
pub mod script;
pub mod transaction;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use block::{
    compact_from_target, compute_block_filter, merkle_root, target_from_compact, Block, Header,
    Work, HEADER_SIZE,
};
pub use error::ParseError;
pub use script::{OpCode, ParseMode, Pattern, Script, ScriptElement, ScriptRole};
pub use transaction::{ElementMatch, Input, Output, Transaction};
