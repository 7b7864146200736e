//! # CompactSize
//!
//! | Value range | Encoding |
//! |-------------|----------|
//! | `0..=252` | one byte |
//! | `253..=0xFFFF` | `0xFD` + u16 LE |
//! | `0x1_0000..=0xFFFF_FFFF` | `0xFE` + u32 LE |
//! | larger | `0xFF` + u64 LE |
//!
//! Decoding accepts non-minimal encodings, as Bitcoin nodes do. Encoding is
//! always minimal.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

const MARKER_U16: u8 = 0xFD;
const MARKER_U32: u8 = 0xFE;
const MARKER_U64: u8 = 0xFF;

const THRESHOLD_U8: u64 = 252;
const THRESHOLD_U16: u64 = 0xFFFF;
const THRESHOLD_U32: u64 = 0xFFFF_FFFF;

/// A Bitcoin variable-length unsigned integer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompactSize(u64);

impl CompactSize {
    /// Wrap a value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The wrapped value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Number of payload bytes that follow a given first byte.
    pub fn payload_size(first: u8) -> usize {
        match first {
            MARKER_U16 => 2,
            MARKER_U32 => 4,
            MARKER_U64 => 8,
            _ => 0,
        }
    }

    /// Total encoded width of this value.
    pub fn size(&self) -> usize {
        match self.0 {
            v if v <= THRESHOLD_U8 => 1,
            v if v <= THRESHOLD_U16 => 3,
            v if v <= THRESHOLD_U32 => 5,
            _ => 9,
        }
    }

    /// Minimal encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        self.encode_into(&mut out);
        out
    }

    /// Append the minimal encoding to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let v = self.0;
        if v <= THRESHOLD_U8 {
            out.push(v as u8);
        } else if v <= THRESHOLD_U16 {
            out.push(MARKER_U16);
            out.extend_from_slice(&(v as u16).to_le_bytes());
        } else if v <= THRESHOLD_U32 {
            out.push(MARKER_U32);
            out.extend_from_slice(&(v as u32).to_le_bytes());
        } else {
            out.push(MARKER_U64);
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    /// Rebuild a value from its payload bytes, marker already consumed.
    ///
    /// Accepts exactly 0, 1, 2, 4 or 8 bytes. An empty payload decodes as 0.
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let value = match payload.len() {
            0 => 0,
            1 => u64::from(payload[0]),
            2 => u64::from(u16::from_le_bytes([payload[0], payload[1]])),
            4 => u64::from(u32::from_le_bytes([
                payload[0], payload[1], payload[2], payload[3],
            ])),
            8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(payload);
                u64::from_le_bytes(buf)
            }
            other => return Err(CodecError::InvalidCompactSizeLength(other)),
        };
        Ok(Self(value))
    }

    /// Streaming decode from a larger buffer.
    ///
    /// Starts at `*offset`, grows `*expected_size` by the bytes this value
    /// needs and checks it against `buffer.len()` before every read. On
    /// success `*offset` is advanced past the value.
    pub fn decode_from_payload(
        buffer: &[u8],
        offset: &mut usize,
        expected_size: &mut usize,
    ) -> Result<u64, CodecError> {
        *expected_size = expected_size.saturating_add(1);
        if *expected_size > buffer.len() || *offset >= buffer.len() {
            return Err(CodecError::Truncated {
                field: "compact size marker",
                needed: 1,
                available: buffer.len().saturating_sub(*offset),
            });
        }
        let first = buffer[*offset];
        let extra = Self::payload_size(first);
        *expected_size = expected_size.saturating_add(extra);
        let start = *offset + 1;
        if *expected_size > buffer.len() || start + extra > buffer.len() {
            return Err(CodecError::Truncated {
                field: "compact size payload",
                needed: extra,
                available: buffer.len().saturating_sub(start),
            });
        }
        let value = if extra == 0 {
            u64::from(first)
        } else {
            Self::decode(&buffer[start..start + extra])?.value()
        };
        *offset = start + extra;
        Ok(value)
    }
}

impl From<u64> for CompactSize {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<usize> for CompactSize {
    fn from(value: usize) -> Self {
        Self(value as u64)
    }
}
