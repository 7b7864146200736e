//! Bloom filter sizing
//!
//! Formulas (BIP37):
//! - bits = -n * ln(p) / ln(2)^2, kept at whole-byte granularity
//! - k    = bits / n * ln(2)
//!
//! Both are truncated toward zero and clamped to `[1, ceiling]`.

use std::f64::consts::LN_2;

/// Largest filter bit vector, in bytes.
pub const MAX_FILTER_BYTES: usize = 36_000;

/// Largest number of hash rounds.
pub const MAX_HASH_FUNCTIONS: usize = 50;

/// Bit-vector length in bytes for `targets` elements at false-positive rate
/// `fp_rate`.
///
/// Truncates to whole bytes as BIP37 does, so the vector can hold up to
/// seven bits fewer than `-n * ln(p) / ln(2)^2` (88 instead of 95 for 10
/// targets at 1%).
pub fn filter_bytes(targets: usize, fp_rate: f64) -> usize {
    let n = targets.max(1) as f64;
    let bits = -n * fp_rate.ln() / (LN_2 * LN_2);
    let bits = bits.min((MAX_FILTER_BYTES * 8) as f64);
    ((bits as usize) / 8).clamp(1, MAX_FILTER_BYTES)
}

/// Number of hash rounds for a `bytes`-long filter holding `targets`.
pub fn hash_function_count(bytes: usize, targets: usize) -> usize {
    let n = targets.max(1) as f64;
    let k = (bytes * 8) as f64 / n * LN_2;
    (k as usize).clamp(1, MAX_HASH_FUNCTIONS)
}

/// Expected false-positive rate: `(1 - e^(-kn/m))^k`.
pub fn expected_fp_rate(bits: usize, elements: usize, k: usize) -> f64 {
    if bits == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (elements as f64) / (bits as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}
