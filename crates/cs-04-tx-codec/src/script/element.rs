//! One parsed script element.

use super::opcode::{OpCode, PushPrefix};

/// An opcode plus whatever bytes followed it in the script.
///
/// `push_size` holds the explicit length prefix of `PUSHDATA1/2/4`, exactly
/// as it appeared. `truncated` marks a push that was clamped by lenient
/// parsing; such an element still serializes back to its source bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScriptElement {
    pub opcode: OpCode,
    /// Raw byte of an unrecognised opcode (lenient mode only).
    pub invalid: Option<u8>,
    pub push_size: Option<Vec<u8>>,
    pub data: Option<Vec<u8>>,
    pub truncated: bool,
}

impl ScriptElement {
    /// A bare opcode.
    pub fn op(opcode: OpCode) -> Self {
        Self {
            opcode,
            invalid: None,
            push_size: None,
            data: None,
            truncated: false,
        }
    }

    /// An unknown opcode byte kept verbatim.
    pub fn invalid(byte: u8) -> Self {
        Self {
            opcode: OpCode::InvalidOpcode,
            invalid: Some(byte),
            push_size: None,
            data: None,
            truncated: false,
        }
    }

    /// Minimal push of `data`.
    pub fn push(data: &[u8]) -> Self {
        let opcode = OpCode::minimal_push(data.len());
        let push_size = match opcode.push_prefix() {
            PushPrefix::Explicit(1) => Some(vec![data.len() as u8]),
            PushPrefix::Explicit(2) => Some((data.len() as u16).to_le_bytes().to_vec()),
            PushPrefix::Explicit(_) => Some((data.len() as u32).to_le_bytes().to_vec()),
            _ => None,
        };
        let data = if data.is_empty() {
            None
        } else {
            Some(data.to_vec())
        };
        Self {
            opcode,
            invalid: None,
            push_size,
            data,
            truncated: false,
        }
    }

    /// Payload bytes for push elements.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Payload length, zero for non-push elements.
    pub fn data_len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    /// True if lenient parsing had to patch this element.
    pub fn is_defective(&self) -> bool {
        self.truncated || self.invalid.is_some()
    }

    /// True for a push of exactly `len` bytes.
    pub fn is_push_of(&self, len: usize) -> bool {
        self.opcode.is_data_push() && !self.truncated && self.data_len() == len
    }

    /// Append the wire bytes of this element.
    pub fn serialize_into(&self, out: &mut Vec<u8>) {
        out.push(self.invalid.unwrap_or_else(|| self.opcode.to_byte()));
        if let Some(size) = &self.push_size {
            out.extend_from_slice(size);
        }
        if let Some(data) = &self.data {
            out.extend_from_slice(data);
        }
    }

    /// Encoded length.
    pub fn size(&self) -> usize {
        1 + self.push_size.as_ref().map_or(0, Vec::len) + self.data_len()
    }
}
