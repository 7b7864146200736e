//! Push-data decomposition for extended (`ES`) filters.
//!
//! Every push whose length is one of the recognised key or hash sizes is
//! emitted, and points are split so that a filter built over full keys can
//! also be matched by x-coordinate alone.

use shared_crypto::hash160;

use super::{Script, ScriptRole};

/// Chunks derived from one push.
pub fn push_chunks(data: &[u8]) -> Vec<&[u8]> {
    match data.len() {
        20 | 32 => vec![data],
        // compressed key: full and x-coordinate
        33 => vec![data, &data[1..]],
        64 => vec![data, &data[..32], &data[32..]],
        // uncompressed key: full, x and y
        65 => vec![data, &data[1..33], &data[33..]],
        _ => Vec::new(),
    }
}

/// Append the extended elements of `script` to `out`.
///
/// Input scripts that carry a redeem script contribute the redeem script's
/// own chunks plus its HASH160, which is what the paying output commits to.
pub fn script_elements(script: &Script, out: &mut Vec<Vec<u8>>) {
    if script.role() == ScriptRole::Coinbase {
        return;
    }
    for element in script.elements() {
        if element.truncated || !element.opcode.is_data_push() {
            continue;
        }
        if let Some(data) = element.data() {
            out.extend(push_chunks(data).into_iter().map(<[u8]>::to_vec));
        }
    }
    if let Some(redeem) = script.redeem_script() {
        script_elements(&redeem, out);
        out.push(hash160(redeem.as_bytes()).to_vec());
    }
}
