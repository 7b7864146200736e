//! # Scripts
//!
//! A [`Script`] keeps its source bytes next to the parsed elements, so
//! `serialize()` always reproduces exactly what was parsed, including
//! lenient-mode defects. The [`Pattern`] is computed once at construction.

pub mod element;
pub mod extract;
pub mod opcode;
pub mod parser;
pub mod pattern;

use std::fmt;

use shared_crypto::Hash160;

pub use element::ScriptElement;
pub use opcode::{OpCode, PushPrefix};
pub use parser::ParseMode;
pub use pattern::{is_public_key, Pattern, ScriptRole};

use crate::error::ParseError;
use parser::parse_elements;
use pattern::{classify, multisig_parts};

/// A parsed script.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Script {
    role: ScriptRole,
    elements: Vec<ScriptElement>,
    pattern: Pattern,
    raw: Vec<u8>,
}

impl Script {
    /// Parse `bytes` found in `role`.
    ///
    /// Coinbase scripts are arbitrary data and are never split into
    /// elements.
    pub fn parse(bytes: &[u8], role: ScriptRole, mode: ParseMode) -> Result<Self, ParseError> {
        let elements = match role {
            ScriptRole::Coinbase => Vec::new(),
            _ => parse_elements(bytes, mode)?,
        };
        let pattern = classify(role, &elements);
        Ok(Self {
            role,
            elements,
            pattern,
            raw: bytes.to_vec(),
        })
    }

    /// Lenient parse; cannot fail.
    pub fn parse_lenient(bytes: &[u8], role: ScriptRole) -> Self {
        let elements = match role {
            ScriptRole::Coinbase => Vec::new(),
            _ => parse_elements(bytes, ParseMode::Lenient).unwrap_or_default(),
        };
        let pattern = classify(role, &elements);
        Self {
            role,
            elements,
            pattern,
            raw: bytes.to_vec(),
        }
    }

    /// Assemble a script from elements.
    pub fn from_elements(role: ScriptRole, elements: Vec<ScriptElement>) -> Self {
        let mut raw = Vec::with_capacity(elements.iter().map(ScriptElement::size).sum());
        for element in &elements {
            element.serialize_into(&mut raw);
        }
        let pattern = classify(role, &elements);
        Self {
            role,
            elements,
            pattern,
            raw,
        }
    }

    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn p2pkh(pubkey_hash: &Hash160) -> Self {
        Self::from_elements(
            ScriptRole::Output,
            vec![
                ScriptElement::op(OpCode::Dup),
                ScriptElement::op(OpCode::Hash160),
                ScriptElement::push(pubkey_hash),
                ScriptElement::op(OpCode::EqualVerify),
                ScriptElement::op(OpCode::CheckSig),
            ],
        )
    }

    /// `OP_HASH160 <hash> OP_EQUAL`
    pub fn p2sh(script_hash: &Hash160) -> Self {
        Self::from_elements(
            ScriptRole::Output,
            vec![
                ScriptElement::op(OpCode::Hash160),
                ScriptElement::push(script_hash),
                ScriptElement::op(OpCode::Equal),
            ],
        )
    }

    /// `<pubkey> OP_CHECKSIG`
    pub fn p2pk(pubkey: &[u8]) -> Self {
        Self::from_elements(
            ScriptRole::Output,
            vec![ScriptElement::push(pubkey), ScriptElement::op(OpCode::CheckSig)],
        )
    }

    /// `m <key>... n OP_CHECKMULTISIG`. `m` and the key count must fit a
    /// small integer; otherwise the result classifies as `Custom`.
    pub fn multisig(m: u8, pubkeys: &[&[u8]]) -> Self {
        let mut elements = Vec::with_capacity(pubkeys.len() + 3);
        elements.push(small_int(m));
        elements.extend(pubkeys.iter().map(|k| ScriptElement::push(k)));
        elements.push(small_int(pubkeys.len().min(usize::from(u8::MAX)) as u8));
        elements.push(ScriptElement::op(OpCode::CheckMultisig));
        Self::from_elements(ScriptRole::Output, elements)
    }

    /// `OP_RETURN <payload>...`
    pub fn null_data(payloads: &[&[u8]]) -> Self {
        let mut elements = vec![ScriptElement::op(OpCode::Return)];
        elements.extend(payloads.iter().map(|p| ScriptElement::push(p)));
        Self::from_elements(ScriptRole::Output, elements)
    }

    pub fn role(&self) -> ScriptRole {
        self.role
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn elements(&self) -> &[ScriptElement] {
        &self.elements
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.raw.clone()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Embedded hash of a P2PKH script.
    pub fn pubkey_hash(&self) -> Option<&[u8]> {
        match self.pattern {
            Pattern::PayToPubkeyHash => self.elements[2].data(),
            _ => None,
        }
    }

    /// Embedded hash of a P2SH script.
    pub fn script_hash(&self) -> Option<&[u8]> {
        match self.pattern {
            Pattern::PayToScriptHash => self.elements[1].data(),
            _ => None,
        }
    }

    /// Key of a P2PK script.
    pub fn pubkey(&self) -> Option<&[u8]> {
        match self.pattern {
            Pattern::PayToPubkey => self.elements[0].data(),
            _ => None,
        }
    }

    pub fn multisig_m_n(&self) -> Option<(u8, u8)> {
        if self.pattern != Pattern::PayToMultisig {
            return None;
        }
        multisig_parts(&self.elements).map(|(m, n, _)| (m, n))
    }

    pub fn multisig_pubkeys(&self) -> Option<Vec<&[u8]>> {
        if self.pattern != Pattern::PayToMultisig {
            return None;
        }
        multisig_parts(&self.elements)
            .map(|(_, _, keys)| keys.iter().filter_map(ScriptElement::data).collect())
    }

    /// Payloads following `OP_RETURN`.
    pub fn null_data_payloads(&self) -> Option<Vec<&[u8]>> {
        if self.pattern != Pattern::NullData {
            return None;
        }
        Some(self.elements[1..].iter().filter_map(ScriptElement::data).collect())
    }

    /// Output scripts starting with `OP_RETURN` can never be spent.
    pub fn is_unspendable(&self) -> bool {
        self.raw.first() == Some(&OpCode::Return.to_byte())
    }

    /// P2SH redeem script carried as the last push of an input script.
    ///
    /// The candidate must parse strictly and contain at least one non-push
    /// opcode, which rules out plain signatures and keys.
    pub fn redeem_script(&self) -> Option<Script> {
        if self.role != ScriptRole::Input {
            return None;
        }
        let last = self.elements.last()?;
        if !last.opcode.is_data_push() || last.truncated {
            return None;
        }
        let data = last.data().filter(|d| !d.is_empty())?;
        let candidate = Script::parse(data, ScriptRole::Redeem, ParseMode::Strict).ok()?;
        candidate
            .elements
            .iter()
            .any(|e| !e.opcode.is_push_only())
            .then_some(candidate)
    }
}

fn small_int(value: u8) -> ScriptElement {
    match value {
        0 => ScriptElement::op(OpCode::Zero),
        1..=16 => ScriptElement::op(OpCode::Num(value)),
        _ => ScriptElement::push(&[value]),
    }
}

impl fmt::Display for Script {
    /// Assembly form, e.g. `OP_DUP OP_HASH160 89ab.. OP_EQUALVERIFY OP_CHECKSIG`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.role == ScriptRole::Coinbase {
            return write!(f, "coinbase:{}", hex::encode(&self.raw));
        }
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match (&element.invalid, element.data()) {
                (Some(byte), _) => write!(f, "[invalid {byte:#04x}]")?,
                (None, Some(data)) if element.opcode.is_data_push() => {
                    f.write_str(&hex::encode(data))?;
                    if element.truncated {
                        f.write_str("[truncated]")?;
                    }
                }
                _ => write!(f, "{}", element.opcode)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_p2pkh_scenario() {
        let hash = [0x5a; 20];
        let mut bytes = vec![0x76, 0xa9, 0x14];
        bytes.extend_from_slice(&hash);
        bytes.extend_from_slice(&[0x88, 0xac]);

        let script = Script::parse(&bytes, ScriptRole::Output, ParseMode::Strict).unwrap();
        assert_eq!(script.pattern(), Pattern::PayToPubkeyHash);
        assert_eq!(script.pubkey_hash(), Some(&hash[..]));
        assert_eq!(script.serialize(), bytes);
        assert_eq!(Script::p2pkh(&hash), script);
    }

    #[test]
    fn test_p2sh_and_p2pk() {
        let p2sh = Script::p2sh(&[0x01; 20]);
        assert_eq!(p2sh.pattern(), Pattern::PayToScriptHash);
        assert_eq!(p2sh.script_hash(), Some(&[0x01; 20][..]));
        assert_eq!(p2sh.pubkey_hash(), None);

        let mut key = vec![0x03];
        key.extend_from_slice(&[0x44; 32]);
        let p2pk = Script::p2pk(&key);
        assert_eq!(p2pk.pattern(), Pattern::PayToPubkey);
        assert_eq!(p2pk.pubkey(), Some(key.as_slice()));
    }

    #[test]
    fn test_multisig_accessors() {
        let a = [[0x02].as_slice(), &[0x10; 32]].concat();
        let b = [[0x03].as_slice(), &[0x20; 32]].concat();
        let script = Script::multisig(1, &[a.as_slice(), b.as_slice()]);
        assert_eq!(script.pattern(), Pattern::PayToMultisig);
        assert_eq!(script.multisig_m_n(), Some((1, 2)));
        assert_eq!(script.multisig_pubkeys(), Some(vec![a.as_slice(), b.as_slice()]));
    }

    #[test]
    fn test_null_data() {
        let script = Script::null_data(&[&b"memo"[..]]);
        assert_eq!(script.pattern(), Pattern::NullData);
        assert!(script.is_unspendable());
        assert_eq!(script.null_data_payloads(), Some(vec![&b"memo"[..]]));
    }

    #[test]
    fn test_input_role_is_not_classified() {
        let bytes = Script::p2pkh(&[0x00; 20]).serialize();
        let script = Script::parse(&bytes, ScriptRole::Input, ParseMode::Strict).unwrap();
        assert_eq!(script.pattern(), Pattern::Input);
        assert_eq!(script.pubkey_hash(), None);
    }

    #[test]
    fn test_coinbase_keeps_raw_bytes() {
        let bytes = [0x03, 0x01, 0xff, 0xba, 0xbe];
        let script = Script::parse(&bytes, ScriptRole::Coinbase, ParseMode::Strict).unwrap();
        assert_eq!(script.pattern(), Pattern::Coinbase);
        assert!(script.elements().is_empty());
        assert_eq!(script.as_bytes(), &bytes);
    }

    #[test]
    fn test_lenient_truncated_output_is_malformed() {
        let script = Script::parse_lenient(&[0x76, 0xa9, 0x14, 0x01], ScriptRole::Output);
        assert_eq!(script.pattern(), Pattern::Malformed);
        assert_eq!(script.serialize(), vec![0x76, 0xa9, 0x14, 0x01]);
    }

    #[test]
    fn test_redeem_script_extraction() {
        let a = [[0x02].as_slice(), &[0x10; 32]].concat();
        let redeem = Script::multisig(1, &[a.as_slice()]);
        let input = Script::from_elements(
            ScriptRole::Input,
            vec![
                ScriptElement::op(OpCode::Zero),
                ScriptElement::push(&[0x30; 71]),
                ScriptElement::push(redeem.as_bytes()),
            ],
        );
        let lifted = input.redeem_script().unwrap();
        assert_eq!(lifted.role(), ScriptRole::Redeem);
        assert_eq!(lifted.pattern(), Pattern::PayToMultisig);

        let plain = Script::from_elements(
            ScriptRole::Input,
            vec![ScriptElement::push(&[0x30; 71]), ScriptElement::push(&a)],
        );
        assert!(plain.redeem_script().is_none());
    }

    #[test]
    fn test_display_assembly() {
        let script = Script::p2sh(&[0xab; 20]);
        assert_eq!(
            script.to_string(),
            format!("OP_HASH160 {} OP_EQUAL", "ab".repeat(20))
        );
    }
}
