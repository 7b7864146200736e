//! Script classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::element::ScriptElement;
use super::opcode::OpCode;

/// Where a script was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptRole {
    Coinbase,
    Input,
    Output,
    /// A P2SH redeem script lifted out of an input.
    Redeem,
}

/// Recognised script templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
    Empty,
    Coinbase,
    Input,
    PayToPubkeyHash,
    PayToScriptHash,
    PayToPubkey,
    PayToMultisig,
    NullData,
    Malformed,
    Custom,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pattern::Empty => "empty",
            Pattern::Coinbase => "coinbase",
            Pattern::Input => "input",
            Pattern::PayToPubkeyHash => "p2pkh",
            Pattern::PayToScriptHash => "p2sh",
            Pattern::PayToPubkey => "p2pk",
            Pattern::PayToMultisig => "multisig",
            Pattern::NullData => "nulldata",
            Pattern::Malformed => "malformed",
            Pattern::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// 33-byte compressed or 65-byte uncompressed point, by prefix.
pub fn is_public_key(data: &[u8]) -> bool {
    match data.len() {
        33 => matches!(data[0], 0x02 | 0x03),
        65 => data[0] == 0x04,
        _ => false,
    }
}

pub(crate) fn classify(role: ScriptRole, elements: &[ScriptElement]) -> Pattern {
    match role {
        ScriptRole::Coinbase => return Pattern::Coinbase,
        ScriptRole::Input => return Pattern::Input,
        ScriptRole::Output | ScriptRole::Redeem => {}
    }
    if elements.is_empty() {
        return Pattern::Empty;
    }
    if elements.iter().any(ScriptElement::is_defective) {
        return Pattern::Malformed;
    }

    let ops: Vec<OpCode> = elements.iter().map(|e| e.opcode).collect();
    match ops.as_slice() {
        [OpCode::Dup, OpCode::Hash160, _, OpCode::EqualVerify, OpCode::CheckSig]
            if elements[2].is_push_of(20) =>
        {
            Pattern::PayToPubkeyHash
        }
        [OpCode::Hash160, _, OpCode::Equal] if elements[1].is_push_of(20) => {
            Pattern::PayToScriptHash
        }
        [_, OpCode::CheckSig] if elements[0].is_push_of(33) || elements[0].is_push_of(65) => {
            Pattern::PayToPubkey
        }
        [OpCode::Return, rest @ ..] if rest.iter().all(|op| op.is_push_only()) => Pattern::NullData,
        [.., OpCode::CheckMultisig] if is_multisig(elements) => Pattern::PayToMultisig,
        _ => Pattern::Custom,
    }
}

/// `m <pubkey>... n CHECKMULTISIG` with `1 <= m <= n == key count`.
pub(crate) fn multisig_parts(elements: &[ScriptElement]) -> Option<(u8, u8, &[ScriptElement])> {
    if elements.len() < 4 {
        return None;
    }
    let last = elements.len() - 1;
    if elements[last].opcode != OpCode::CheckMultisig {
        return None;
    }
    let m = elements[0].opcode.small_int()?;
    let n = elements[last - 1].opcode.small_int()?;
    let keys = &elements[1..last - 1];
    let valid = m >= 1
        && m <= n
        && keys.len() == usize::from(n)
        && keys
            .iter()
            .all(|k| k.opcode.is_data_push() && k.data().is_some_and(is_public_key));
    valid.then_some((m, n, keys))
}

fn is_multisig(elements: &[ScriptElement]) -> bool {
    multisig_parts(elements).is_some()
}
