//! Bounds-checked cursor over wire bytes.

use crate::compact_size::CompactSize;
use crate::error::CodecError;

/// Sequential reader with an expected-size accumulator.
///
/// Before each read the accumulator is grown by the field width and compared
/// with the buffer length; the read only happens if the comparison passes.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    expected_size: usize,
}

impl<'a> ByteReader<'a> {
    /// Reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            expected_size: 0,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True when every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Running total of bytes the structure being parsed claims to need.
    pub fn expected_size(&self) -> usize {
        self.expected_size
    }

    /// The whole underlying buffer.
    pub fn buffer(&self) -> &'a [u8] {
        self.data
    }

    /// Slice of the buffer between `start` and the current position.
    pub fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.data[start.min(self.pos)..self.pos]
    }

    fn require(&mut self, needed: usize, field: &'static str) -> Result<usize, CodecError> {
        let expected = self.expected_size.saturating_add(needed);
        if expected > self.data.len() || needed > self.remaining() {
            self.expected_size = expected;
            return Err(CodecError::Truncated {
                field,
                needed,
                available: self.remaining(),
            });
        }
        self.expected_size = expected;
        let start = self.pos;
        self.pos += needed;
        Ok(start)
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Look `ahead` bytes past the cursor without consuming.
    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.pos
            .checked_add(ahead)
            .and_then(|idx| self.data.get(idx).copied())
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        let start = self.require(1, field)?;
        Ok(self.data[start])
    }

    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CodecError> {
        let start = self.require(N, field)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[start..start + N]);
        Ok(out)
    }

    pub fn read_bytes(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], CodecError> {
        let start = self.require(len, field)?;
        Ok(&self.data[start..start + len])
    }

    pub fn read_u16_le(&mut self, field: &'static str) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u32_le(&mut self, field: &'static str) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u32_be(&mut self, field: &'static str) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.read_array(field)?))
    }

    pub fn read_i32_le(&mut self, field: &'static str) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u64_le(&mut self, field: &'static str) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_i64_le(&mut self, field: &'static str) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.read_array(field)?))
    }

    /// Read a CompactSize through the streaming decoder.
    pub fn read_compact_size(&mut self) -> Result<u64, CodecError> {
        let mut offset = self.pos;
        let value = CompactSize::decode_from_payload(self.data, &mut offset, &mut self.expected_size)?;
        self.pos = offset;
        Ok(value)
    }

    /// Read a CompactSize used as a count or length of at most `limit`.
    pub fn read_length(&mut self, field: &'static str, limit: usize) -> Result<usize, CodecError> {
        let value = self.read_compact_size()?;
        match usize::try_from(value) {
            Ok(len) if len <= limit => Ok(len),
            _ => Err(CodecError::Overflow { field, value }),
        }
    }

    /// CompactSize length followed by that many bytes.
    pub fn read_var_bytes(&mut self, field: &'static str) -> Result<&'a [u8], CodecError> {
        let len = self.read_length(field, self.remaining())?;
        self.read_bytes(len, field)
    }

    /// Fail if unread bytes remain.
    pub fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}
