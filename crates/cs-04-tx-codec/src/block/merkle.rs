//! Merkle root over a txid list.

use shared_crypto::sha256d_many;
use shared_types::{Hash, NULL_HASH};

/// Bitcoin Merkle root: an odd level pairs its last node with itself.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return NULL_HASH;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).unwrap_or(&pair[0]);
                sha256d_many(&[pair[0].as_slice(), right.as_slice()])
            })
            .collect();
    }
    level[0]
}
