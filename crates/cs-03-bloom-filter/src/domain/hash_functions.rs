//! Hash rounds for the Bloom filter
//!
//! Round `i` hashes the element with MurmurHash3 seeded by
//! `i * 0xFBA4C795 + tweak` and reduces modulo the bit length.

use shared_crypto::murmur3_32;

/// Per-round seed multiplier.
pub const SEED_MULTIPLIER: u32 = 0xFBA4_C795;

/// Bit index for `element` in round `round`.
pub fn bloom_hash(element: &[u8], round: u32, tweak: u32, bit_len: usize) -> usize {
    let seed = round.wrapping_mul(SEED_MULTIPLIER).wrapping_add(tweak);
    (murmur3_32(element, seed) as usize) % bit_len.max(1)
}
