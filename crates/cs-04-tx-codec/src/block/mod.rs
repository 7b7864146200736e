//! # Blocks
//!
//! A block is accepted only if every byte of the buffer is consumed and
//! the Merkle root recomputed from the txid index equals the one the
//! header commits to.

pub mod filter;
pub mod header;
pub mod merkle;
pub mod work;

use std::collections::BTreeSet;
use std::sync::Arc;

use cs_01_binary_codec::{ByteReader, ByteWriter, CompactSize};
use shared_types::{display_hash, BlockHash, ChainType, Txid};
use tracing::{debug, warn};

pub use filter::compute_block_filter;
pub use header::{Header, HEADER_SIZE};
pub use merkle::merkle_root;
pub use work::{compact_from_target, target_from_compact, Work};

use crate::error::ParseError;
use crate::transaction::{ElementMatch, Transaction};

/// version + two empty counts + lock time.
const MIN_TRANSACTION_SIZE: usize = 10;

/// A parsed, Merkle-verified block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    header: Header,
    transactions: Vec<Arc<Transaction>>,
    txid_index: Vec<Txid>,
    size: usize,
}

impl Block {
    /// Parse and verify a serialized block.
    pub fn parse(chain: ChainType, bytes: &[u8]) -> Result<Self, ParseError> {
        Self::parse_inner(chain, bytes)
            .inspect_err(|e| warn!(chain = chain.name(), size = bytes.len(), error = %e, "Rejected block"))
    }

    fn parse_inner(chain: ChainType, bytes: &[u8]) -> Result<Self, ParseError> {
        let mut reader = ByteReader::new(bytes);
        let header = Header::read(chain, &mut reader)?;

        let count = reader
            .read_length("transaction count", reader.remaining() / MIN_TRANSACTION_SIZE)
            .map_err(ParseError::codec("transaction count"))?;
        if count == 0 {
            return Err(ParseError::EmptyBlock);
        }

        let mut transactions = Vec::with_capacity(count);
        for _ in 0..count {
            transactions.push(Arc::new(Transaction::read(&mut reader)?));
        }
        reader.finish().map_err(ParseError::codec("block"))?;

        let block = Self::assemble(header, transactions, bytes.len());
        block.verify_merkle_root()?;
        debug!(
            block_hash = %display_hash(&block.hash()),
            transactions = block.transactions.len(),
            "Parsed block"
        );
        Ok(block)
    }

    /// Assemble a block from parts, checking the header's Merkle root.
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Result<Self, ParseError> {
        if transactions.is_empty() {
            return Err(ParseError::EmptyBlock);
        }
        let transactions: Vec<Arc<Transaction>> = transactions.into_iter().map(Arc::new).collect();
        let size = HEADER_SIZE
            + CompactSize::from(transactions.len()).size()
            + transactions.iter().map(|tx| tx.size()).sum::<usize>();
        let block = Self::assemble(header, transactions, size);
        block.verify_merkle_root()?;
        Ok(block)
    }

    fn assemble(header: Header, transactions: Vec<Arc<Transaction>>, size: usize) -> Self {
        let txid_index = transactions.iter().map(|tx| tx.txid()).collect();
        Self {
            header,
            transactions,
            txid_index,
            size,
        }
    }

    fn verify_merkle_root(&self) -> Result<(), ParseError> {
        let computed = merkle_root(&self.txid_index);
        let declared = self.header.merkle_root();
        if computed != declared {
            return Err(ParseError::MerkleMismatch { declared, computed });
        }
        Ok(())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.size);
        writer.put_bytes(&self.header.serialize());
        writer.put_compact_size(self.transactions.len() as u64);
        for tx in &self.transactions {
            writer.put_bytes(&tx.serialize());
        }
        writer.into_inner()
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    pub fn transactions(&self) -> &[Arc<Transaction>] {
        &self.transactions
    }

    /// Txids in block order.
    pub fn txid_index(&self) -> &[Txid] {
        &self.txid_index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Outputs anywhere in the block matching `targets`.
    pub fn find_matches(&self, targets: &BTreeSet<Vec<u8>>) -> Vec<ElementMatch> {
        self.transactions
            .iter()
            .flat_map(|tx| tx.find_matches(targets))
            .collect()
    }
}
