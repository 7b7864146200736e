//! Golomb-Rice coding of sorted sets.
//!
//! Each value is stored as its difference from the previous one (the first
//! value relative to zero). A difference `d` is written as `d >> P` in unary
//! (that many 1-bits and a terminating 0-bit) followed by the low `P` bits.

use super::bit_stream::{BitReader, BitWriter};
use super::params::MAX_BITS;
use crate::error::GcsError;

/// Encode an ascending list of values.
pub fn golomb_encode(bits: u8, sorted: &[u64]) -> Result<Vec<u8>, GcsError> {
    if bits > MAX_BITS {
        return Err(GcsError::InvalidParameter(bits));
    }
    let mut writer = BitWriter::new();
    let mut last = 0u64;
    for &value in sorted {
        debug_assert!(value >= last, "golomb input must be sorted");
        let delta = value - last;
        for _ in 0..(delta >> bits) {
            writer.write_bit(true);
        }
        writer.write_bit(false);
        writer.write_bits(delta, bits);
        last = value;
    }
    Ok(writer.finish())
}

/// Decode `count` values, undoing the delta coding.
pub fn golomb_decode(count: u32, bits: u8, data: &[u8]) -> Result<Vec<u64>, GcsError> {
    if bits > MAX_BITS {
        return Err(GcsError::InvalidParameter(bits));
    }
    // Every element takes at least P + 1 bits, which caps the allocation.
    let min_bits = usize::from(bits) + 1;
    let capacity = (count as usize).min(data.len() * 8 / min_bits);
    let mut values = Vec::with_capacity(capacity);
    let mut reader = BitReader::new(data);
    let mut last = 0u64;
    for decoded in 0..count {
        let truncated = GcsError::TruncatedStream {
            decoded,
            expected: count,
        };
        let quotient = reader.read_unary().ok_or(truncated.clone())?;
        let remainder = reader.read_bits(bits).ok_or(truncated)?;
        let delta = quotient
            .checked_mul(1u64 << bits)
            .and_then(|q| q.checked_add(remainder))
            .ok_or(GcsError::ValueOverflow)?;
        last = last.checked_add(delta).ok_or(GcsError::ValueOverflow)?;
        values.push(last);
    }
    Ok(values)
}
