//! Transaction outputs.

use cs_01_binary_codec::{ByteReader, ByteWriter};

use crate::error::ParseError;
use crate::script::{Script, ScriptRole};

/// Smallest possible output: value plus a one-byte script length.
pub const MIN_OUTPUT_SIZE: usize = 8 + 1;

/// An amount locked by a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    value: i64,
    script: Script,
}

impl Output {
    pub fn new(value: i64, script: &[u8]) -> Self {
        Self {
            value,
            script: Script::parse_lenient(script, ScriptRole::Output),
        }
    }

    pub fn from_script(value: i64, script: Script) -> Self {
        Self { value, script }
    }

    /// Parse a standalone serialized output, as stored by the wallet.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut reader = ByteReader::new(bytes);
        let output = Self::read(&mut reader)?;
        reader.finish().map_err(ParseError::codec("output"))?;
        Ok(output)
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self, ParseError> {
        let value = reader
            .read_i64_le("output value")
            .map_err(ParseError::codec("output value"))?;
        let script = reader
            .read_var_bytes("output script")
            .map_err(ParseError::codec("output script"))?;
        Ok(Self::new(value, script))
    }

    pub(crate) fn write(&self, writer: &mut ByteWriter) {
        writer.put_i64_le(self.value);
        writer.put_var_bytes(self.script.as_bytes());
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(9 + self.script.len());
        self.write(&mut writer);
        writer.into_inner()
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn script(&self) -> &Script {
        &self.script
    }
}
