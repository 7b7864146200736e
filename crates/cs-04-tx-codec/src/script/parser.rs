//! Raw bytes to script elements.
//!
//! Strict mode rejects unknown opcodes and pushes that run past the end of
//! the script. Lenient mode keeps going: unknown bytes become invalid
//! elements and a short final push is clamped to what remains and flagged
//! `truncated`. Either way no byte beyond `bytes.len()` is ever touched.

use super::element::ScriptElement;
use super::opcode::{OpCode, PushPrefix};
use crate::error::ParseError;

/// How to treat malformed script bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Any defect fails the parse.
    Strict,
    /// Defects are recorded on the element.
    #[default]
    Lenient,
}

pub(crate) fn parse_elements(bytes: &[u8], mode: ParseMode) -> Result<Vec<ScriptElement>, ParseError> {
    let mut elements = Vec::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let offset = pos;
        let byte = bytes[pos];
        pos += 1;

        let Some(opcode) = OpCode::from_byte(byte) else {
            if mode == ParseMode::Strict {
                return Err(ParseError::UnknownOpcode { offset, byte });
            }
            elements.push(ScriptElement::invalid(byte));
            continue;
        };

        let declared = match opcode.push_prefix() {
            PushPrefix::None => {
                elements.push(ScriptElement::op(opcode));
                continue;
            }
            PushPrefix::Direct(len) => {
                let mut element = ScriptElement::op(opcode);
                pos = take_data(bytes, pos, len, offset, mode, &mut element)?;
                elements.push(element);
                continue;
            }
            PushPrefix::Explicit(width) => width,
        };

        let available = bytes.len() - pos;
        if available < declared {
            if mode == ParseMode::Strict {
                return Err(ParseError::MalformedPush {
                    offset,
                    needed: declared,
                    available,
                });
            }
            let mut element = ScriptElement::op(opcode);
            element.push_size = Some(bytes[pos..].to_vec());
            element.truncated = true;
            elements.push(element);
            break;
        }

        let size_bytes = &bytes[pos..pos + declared];
        pos += declared;
        let len = size_bytes
            .iter()
            .rev()
            .fold(0usize, |acc, b| (acc << 8) | usize::from(*b));

        let mut element = ScriptElement::op(opcode);
        element.push_size = Some(size_bytes.to_vec());
        pos = take_data(bytes, pos, len, offset, mode, &mut element)?;
        elements.push(element);
    }

    Ok(elements)
}

fn take_data(
    bytes: &[u8],
    pos: usize,
    len: usize,
    offset: usize,
    mode: ParseMode,
    element: &mut ScriptElement,
) -> Result<usize, ParseError> {
    let available = bytes.len() - pos;
    if len <= available {
        element.data = Some(bytes[pos..pos + len].to_vec());
        return Ok(pos + len);
    }
    if mode == ParseMode::Strict {
        return Err(ParseError::MalformedPush {
            offset,
            needed: len,
            available,
        });
    }
    element.data = Some(bytes[pos..].to_vec());
    element.truncated = true;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reserialize(elements: &[ScriptElement]) -> Vec<u8> {
        let mut out = Vec::new();
        for element in elements {
            element.serialize_into(&mut out);
        }
        out
    }

    #[test]
    fn test_parse_direct_and_explicit_pushes() {
        let mut bytes = vec![0x02, 0xAA, 0xBB, 0x4c, 0x03, 1, 2, 3, 0x4d, 0x01, 0x00, 9, 0x76];
        bytes.push(0xac);
        let elements = parse_elements(&bytes, ParseMode::Strict).unwrap();
        assert_eq!(elements.len(), 5);
        assert_eq!(elements[0].data(), Some(&[0xAA, 0xBB][..]));
        assert_eq!(elements[1].data(), Some(&[1, 2, 3][..]));
        assert_eq!(elements[2].push_size, Some(vec![0x01, 0x00]));
        assert_eq!(elements[3].opcode, OpCode::Dup);
        assert_eq!(reserialize(&elements), bytes);
    }

    #[test]
    fn test_strict_rejects_short_push() {
        let bytes = [0x05, 0x01, 0x02];
        assert_eq!(
            parse_elements(&bytes, ParseMode::Strict),
            Err(ParseError::MalformedPush {
                offset: 0,
                needed: 5,
                available: 2
            })
        );
    }

    #[test]
    fn test_lenient_clamps_short_push() {
        let bytes = [0x76, 0x05, 0x01, 0x02];
        let elements = parse_elements(&bytes, ParseMode::Lenient).unwrap();
        assert_eq!(elements.len(), 2);
        assert!(elements[1].truncated);
        assert_eq!(elements[1].data(), Some(&[0x01, 0x02][..]));
        assert_eq!(reserialize(&elements), bytes);
    }

    #[test]
    fn test_lenient_clamps_short_length_prefix() {
        let bytes = [0x4e, 0x01, 0x02];
        let elements = parse_elements(&bytes, ParseMode::Lenient).unwrap();
        assert_eq!(elements.len(), 1);
        assert!(elements[0].truncated);
        assert_eq!(reserialize(&elements), bytes);

        assert!(matches!(
            parse_elements(&bytes, ParseMode::Strict),
            Err(ParseError::MalformedPush { needed: 4, available: 2, .. })
        ));
    }

    #[test]
    fn test_unknown_opcode_modes() {
        let bytes = [0x51, 0xc0];
        assert_eq!(
            parse_elements(&bytes, ParseMode::Strict),
            Err(ParseError::UnknownOpcode { offset: 1, byte: 0xc0 })
        );
        let elements = parse_elements(&bytes, ParseMode::Lenient).unwrap();
        assert_eq!(elements[1].invalid, Some(0xc0));
        assert_eq!(reserialize(&elements), bytes);
    }

    #[test]
    fn test_empty_script() {
        assert!(parse_elements(&[], ParseMode::Strict).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn test_lenient_parse_reproduces_any_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..200)) {
            let elements = parse_elements(&bytes, ParseMode::Lenient).unwrap();
            prop_assert_eq!(reserialize(&elements), bytes);
        }
    }
}
