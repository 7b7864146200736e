//! # Transactions
//!
//! Wire layout:
//!
//! ```text
//! version:i32 [marker:0x00 flag:u8] count inputs count outputs [witness] lock_time:u32
//! ```
//!
//! The marker is detected by peeking: a zero where the input count would
//! be can only mean segwit, since a transaction needs at least one input.
//! Input and output counts are bounded by the bytes left in the buffer
//! before anything is allocated.

pub mod input;
pub mod output;

use std::collections::BTreeSet;
use std::sync::OnceLock;

use cs_01_binary_codec::{ByteReader, ByteWriter};
use serde::{Deserialize, Serialize};
use shared_crypto::sha256d;
use shared_types::{FilterType, Outpoint, Txid};
use tracing::warn;

pub use input::{Input, MIN_INPUT_SIZE};
pub use output::{Output, MIN_OUTPUT_SIZE};

use crate::error::ParseError;
use crate::script::extract::{push_chunks, script_elements};
use crate::script::Pattern;

/// Witness scale factor for weight/vsize.
pub const WITNESS_SCALE_FACTOR: usize = 4;

/// An output of a transaction whose script matched a caller-supplied element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementMatch {
    pub outpoint: Outpoint,
    pub element: Vec<u8>,
}

/// An immutable parsed transaction.
#[derive(Debug, Clone)]
pub struct Transaction {
    version: i32,
    segwit_flag: Option<u8>,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    lock_time: u32,
    txid: Txid,
    wtxid: Txid,
    size: OnceLock<usize>,
    normalized_id: OnceLock<Txid>,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.wtxid == other.wtxid
    }
}

impl Eq for Transaction {}

impl Transaction {
    /// Build from parts. A segwit flag is set iff any input carries witness.
    pub fn new(version: i32, inputs: Vec<Input>, outputs: Vec<Output>, lock_time: u32) -> Self {
        let segwit_flag = inputs
            .iter()
            .any(|i| !i.witness().is_empty())
            .then_some(1);
        Self::assemble(version, segwit_flag, inputs, outputs, lock_time)
    }

    fn assemble(
        version: i32,
        segwit_flag: Option<u8>,
        inputs: Vec<Input>,
        outputs: Vec<Output>,
        lock_time: u32,
    ) -> Self {
        let mut tx = Self {
            version,
            segwit_flag,
            inputs,
            outputs,
            lock_time,
            txid: [0u8; 32],
            wtxid: [0u8; 32],
            size: OnceLock::new(),
            normalized_id: OnceLock::new(),
        };
        tx.txid = sha256d(&tx.write(false, false));
        tx.wtxid = match tx.segwit_flag {
            Some(_) => sha256d(&tx.write(true, false)),
            None => tx.txid,
        };
        tx
    }

    /// Parse exactly one transaction from `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut reader = ByteReader::new(bytes);
        let tx = Self::read(&mut reader).inspect_err(|e| warn!(error = %e, "Failed to parse transaction"))?;
        reader.finish().map_err(ParseError::codec("transaction"))?;
        Ok(tx)
    }

    /// Read one transaction from the reader's current position.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, ParseError> {
        let version = reader
            .read_i32_le("version")
            .map_err(ParseError::codec("transaction version"))?;

        let segwit_flag = if reader.peek_u8() == Some(0) {
            let _marker = reader.read_u8("segwit marker").map_err(ParseError::codec("segwit marker"))?;
            let flag = reader.read_u8("segwit flag").map_err(ParseError::codec("segwit flag"))?;
            if flag == 0 {
                return Err(ParseError::InvalidSegwitFlag(flag));
            }
            Some(flag)
        } else {
            None
        };

        let input_count = reader
            .read_length("input count", reader.remaining() / MIN_INPUT_SIZE)
            .map_err(ParseError::codec("input count"))?;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            inputs.push(Input::read(reader)?);
        }

        let output_count = reader
            .read_length("output count", reader.remaining() / MIN_OUTPUT_SIZE)
            .map_err(ParseError::codec("output count"))?;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            outputs.push(Output::read(reader)?);
        }

        if segwit_flag.is_some() {
            for input in &mut inputs {
                input.read_witness(reader)?;
            }
        }

        let lock_time = reader
            .read_u32_le("lock time")
            .map_err(ParseError::codec("lock time"))?;

        Ok(Self::assemble(version, segwit_flag, inputs, outputs, lock_time))
    }

    fn write(&self, witness: bool, normalized: bool) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.put_i32_le(self.version);
        let flag = self.segwit_flag.filter(|_| witness && !normalized);
        if let Some(flag) = flag {
            writer.put_u8(0).put_u8(flag);
        }
        writer.put_compact_size(self.inputs.len() as u64);
        for input in &self.inputs {
            input.write(&mut writer, normalized);
        }
        writer.put_compact_size(self.outputs.len() as u64);
        for output in &self.outputs {
            output.write(&mut writer);
        }
        if flag.is_some() {
            for input in &self.inputs {
                input.write_witness(&mut writer);
            }
        }
        writer.put_u32_le(self.lock_time);
        writer.into_inner()
    }

    /// Full wire serialization, witness included.
    pub fn serialize(&self) -> Vec<u8> {
        self.write(true, false)
    }

    /// Serialization without witness data.
    pub fn serialize_legacy(&self) -> Vec<u8> {
        self.write(false, false)
    }

    /// Every input script emptied and witness dropped.
    pub fn serialize_normalized(&self) -> Vec<u8> {
        self.write(false, true)
    }

    pub fn txid(&self) -> Txid {
        self.txid
    }

    pub fn wtxid(&self) -> Txid {
        self.wtxid
    }

    /// Identity that survives re-signing.
    pub fn normalized_id(&self) -> Txid {
        *self
            .normalized_id
            .get_or_init(|| sha256d(&self.serialize_normalized()))
    }

    /// Full serialized size in bytes.
    pub fn size(&self) -> usize {
        *self.size.get_or_init(|| self.serialize().len())
    }

    /// BIP141 weight.
    pub fn weight(&self) -> usize {
        let base = match self.segwit_flag {
            Some(_) => self.serialize_legacy().len(),
            None => self.size(),
        };
        base * (WITNESS_SCALE_FACTOR - 1) + self.size()
    }

    /// Virtual size, weight / 4 rounded up.
    pub fn vsize(&self) -> usize {
        self.weight().div_ceil(WITNESS_SCALE_FACTOR)
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn segwit_flag(&self) -> Option<u8> {
        self.segwit_flag
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn lock_time(&self) -> u32 {
        self.lock_time
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    /// Outpoints consumed by this transaction.
    pub fn associated_outpoints(&self) -> Vec<Outpoint> {
        self.inputs
            .iter()
            .filter(|i| !i.is_coinbase())
            .map(|i| *i.previous())
            .collect()
    }

    /// Filter elements derivable from the transaction alone.
    ///
    /// Basic filters also need the scripts of spent outputs, which only the
    /// block-level builder can supply.
    pub fn extract_elements(&self, filter_type: FilterType) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        match filter_type {
            FilterType::BasicBip158 => self.basic_output_scripts(&mut out),
            FilterType::BasicBchVariant => {
                self.basic_output_scripts(&mut out);
                out.extend(self.associated_outpoints().iter().map(|o| o.to_bytes().to_vec()));
            }
            FilterType::Es => {
                for input in self.inputs.iter().filter(|i| !i.is_coinbase()) {
                    out.push(input.previous().to_bytes().to_vec());
                    script_elements(input.script(), &mut out);
                    for item in input.witness() {
                        out.extend(push_chunks(item).into_iter().map(<[u8]>::to_vec));
                    }
                }
                for output in &self.outputs {
                    script_elements(output.script(), &mut out);
                }
            }
        }
        out
    }

    fn basic_output_scripts(&self, out: &mut Vec<Vec<u8>>) {
        out.extend(
            self.outputs
                .iter()
                .map(Output::script)
                .filter(|s| !s.is_empty() && !s.is_unspendable())
                .map(|s| s.serialize()),
        );
    }

    /// Outputs whose script, or any extended element of it, is in `targets`.
    pub fn find_matches(&self, targets: &BTreeSet<Vec<u8>>) -> Vec<ElementMatch> {
        let mut matches = Vec::new();
        for (index, output) in self.outputs.iter().enumerate() {
            let script = output.script();
            if script.pattern() == Pattern::NullData {
                continue;
            }
            let mut candidates = vec![script.serialize()];
            script_elements(script, &mut candidates);
            if let Some(element) = candidates.into_iter().find(|c| targets.contains(c)) {
                matches.push(ElementMatch {
                    outpoint: Outpoint::new(self.txid, index as u32),
                    element,
                });
            }
        }
        matches
    }
}
