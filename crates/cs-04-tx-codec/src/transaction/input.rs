//! Transaction inputs.

use cs_01_binary_codec::{ByteReader, ByteWriter};
use shared_types::{Outpoint, OUTPOINT_SIZE};

use crate::error::ParseError;
use crate::script::{Script, ScriptRole};

/// Smallest possible input: outpoint, one-byte script length, sequence.
pub const MIN_INPUT_SIZE: usize = OUTPOINT_SIZE + 1 + 4;

/// A reference to a previous output plus the data that unlocks it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Input {
    previous: Outpoint,
    script: Script,
    sequence: u32,
    witness: Vec<Vec<u8>>,
}

impl Input {
    pub fn new(previous: Outpoint, script: &[u8], sequence: u32) -> Self {
        let role = if previous.is_null() {
            ScriptRole::Coinbase
        } else {
            ScriptRole::Input
        };
        Self {
            previous,
            script: Script::parse_lenient(script, role),
            sequence,
            witness: Vec::new(),
        }
    }

    pub fn with_witness(mut self, witness: Vec<Vec<u8>>) -> Self {
        self.witness = witness;
        self
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self, ParseError> {
        let txid = reader
            .read_array::<32>("previous txid")
            .map_err(ParseError::codec("input outpoint"))?;
        let index = reader
            .read_u32_le("previous index")
            .map_err(ParseError::codec("input outpoint"))?;
        let script = reader
            .read_var_bytes("input script")
            .map_err(ParseError::codec("input script"))?;
        let sequence = reader
            .read_u32_le("input sequence")
            .map_err(ParseError::codec("input sequence"))?;
        Ok(Self::new(Outpoint::new(txid, index), script, sequence))
    }

    pub(crate) fn read_witness(&mut self, reader: &mut ByteReader<'_>) -> Result<(), ParseError> {
        let count = reader
            .read_length("witness item count", reader.remaining())
            .map_err(ParseError::codec("witness item count"))?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            let item = reader
                .read_var_bytes("witness item")
                .map_err(ParseError::codec("witness item"))?;
            items.push(item.to_vec());
        }
        self.witness = items;
        Ok(())
    }

    /// Write the input; `normalized` replaces the script with an empty one.
    pub(crate) fn write(&self, writer: &mut ByteWriter, normalized: bool) {
        writer.put_bytes(&self.previous.to_bytes());
        if normalized {
            writer.put_compact_size(0);
        } else {
            writer.put_var_bytes(self.script.as_bytes());
        }
        writer.put_u32_le(self.sequence);
    }

    pub(crate) fn write_witness(&self, writer: &mut ByteWriter) {
        writer.put_compact_size(self.witness.len() as u64);
        for item in &self.witness {
            writer.put_var_bytes(item);
        }
    }

    pub fn previous(&self) -> &Outpoint {
        &self.previous
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn witness(&self) -> &[Vec<u8>] {
        &self.witness
    }

    pub fn is_coinbase(&self) -> bool {
        self.previous.is_null()
    }
}
