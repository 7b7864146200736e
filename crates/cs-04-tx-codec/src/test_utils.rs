//! Fixture builders for headers, transactions and blocks.
//!
//! Available to this crate's tests and, through the `test-utils` feature,
//! to downstream crates.

use shared_types::{BlockHash, ChainType, Outpoint};

use crate::block::{merkle_root, Block, Header};
use crate::script::Script;
use crate::transaction::{Input, Output, Transaction};

/// Easiest unit-test difficulty, work 1.
pub const EASY_BITS: u32 = 0x207fffff;
/// Twice the work of [`EASY_BITS`].
pub const DOUBLE_BITS: u32 = 0x203fffff;

/// Header with a zero Merkle root. `salt` goes into the nonce so siblings
/// at the same height get distinct hashes.
pub fn make_header(chain: ChainType, previous: BlockHash, nbits: u32, salt: u32) -> Header {
    Header::new(chain, 1, previous, [0u8; 32], 1_600_000_000, nbits, salt)
}

/// Chain of headers on top of `parent`, one per entry of `bits`.
pub fn header_chain(chain: ChainType, parent: BlockHash, bits: &[u32], salt: u32) -> Vec<Header> {
    let mut previous = parent;
    bits.iter()
        .map(|nbits| {
            let header = make_header(chain, previous, *nbits, salt);
            previous = header.hash();
            header
        })
        .collect()
}

/// P2PKH output paying `value` to a hash filled with `tag`.
pub fn p2pkh_output(value: i64, tag: u8) -> Output {
    Output::from_script(value, Script::p2pkh(&[tag; 20]))
}

/// Coinbase with a unique script derived from `nonce`.
pub fn coinbase_tx(nonce: u32, outputs: Vec<Output>) -> Transaction {
    let mut script = vec![0x04];
    script.extend_from_slice(&nonce.to_le_bytes());
    Transaction::new(1, vec![Input::new(Outpoint::null(), &script, u32::MAX)], outputs, 0)
}

/// Transaction spending `previous` into `outputs`.
pub fn spend_tx(previous: &[Outpoint], outputs: Vec<Output>) -> Transaction {
    let inputs = previous
        .iter()
        .map(|outpoint| Input::new(*outpoint, &[0x51], u32::MAX))
        .collect();
    Transaction::new(2, inputs, outputs, 0)
}

/// Block on top of `previous` with a correct Merkle root.
pub fn build_block(
    chain: ChainType,
    previous: BlockHash,
    nbits: u32,
    salt: u32,
    transactions: Vec<Transaction>,
) -> Block {
    let txids: Vec<_> = transactions.iter().map(Transaction::txid).collect();
    let header = Header::new(chain, 1, previous, merkle_root(&txids), 1_600_000_000, nbits, salt);
    match Block::new(header, transactions) {
        Ok(block) => block,
        Err(e) => panic!("fixture block is invalid: {e}"),
    }
}
