//! Compact targets and chain work.
//!
//! `nbits` packs a 256-bit target as a one-byte exponent and a 23-bit
//! mantissa with a sign bit. Work of one header is `max_target / target`
//! using the chain's easiest target; chain work is the sum along the chain.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::ChainType;

/// Decode a compact target. `None` for negative, overflowing or zero
/// encodings.
pub fn target_from_compact(nbits: u32) -> Option<U256> {
    let size = nbits >> 24;
    let mut word = nbits & 0x007f_ffff;
    let negative = word != 0 && (nbits & 0x0080_0000) != 0;
    let overflow =
        word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));
    if negative || overflow {
        return None;
    }
    let target = if size <= 3 {
        word >>= 8 * (3 - size);
        U256::from(word)
    } else {
        U256::from(word) << (8 * (size - 3) as usize)
    };
    (!target.is_zero()).then_some(target)
}

/// Encode a target back to compact form.
pub fn compact_from_target(target: U256) -> u32 {
    let mut size = target.bits().div_ceil(8) as u32;
    let mut compact = if size <= 3 {
        (target.low_u64() << (8 * (3 - size))) as u32
    } else {
        (target >> (8 * (size - 3) as usize)).low_u32()
    };
    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }
    compact | (size << 24)
}

/// Accumulated proof of work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Work(U256);

impl Work {
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn from_u256(value: U256) -> Self {
        Self(value)
    }

    /// Work of one header. Invalid `nbits` contributes nothing.
    pub fn from_nbits(chain: ChainType, nbits: u32) -> Self {
        let (Some(max), Some(target)) = (
            target_from_compact(chain.max_target_bits()),
            target_from_compact(nbits),
        ) else {
            return Self::zero();
        };
        Self(max / target)
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Work {
    type Output = Work;

    fn add(self, rhs: Work) -> Work {
        Work(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Work {
    fn add_assign(&mut self, rhs: Work) {
        *self = *self + rhs;
    }
}

impl Sum for Work {
    fn sum<I: Iterator<Item = Work>>(iter: I) -> Work {
        iter.fold(Work::zero(), Add::add)
    }
}

impl fmt::Display for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_target() {
        let target = target_from_compact(0x1d00ffff).unwrap();
        assert_eq!(target, U256::from(0xffffu64) << 208);
        assert_eq!(compact_from_target(target), 0x1d00ffff);
    }

    #[test]
    fn test_rejects_negative_and_overflow() {
        assert_eq!(target_from_compact(0x04923456), None);
        assert_eq!(target_from_compact(0xff123456), None);
        assert_eq!(target_from_compact(0x00000000), None);
    }

    #[test]
    fn test_small_exponent() {
        assert_eq!(target_from_compact(0x03123456), Some(U256::from(0x123456u64)));
        assert_eq!(target_from_compact(0x02123456), Some(U256::from(0x1234u64)));
    }

    #[test]
    fn test_work_values() {
        assert_eq!(Work::from_nbits(ChainType::Bitcoin, 0x1d00ffff).value(), U256::one());
        assert_eq!(Work::from_nbits(ChainType::Bitcoin, 0x1c7fff80).value(), U256::from(2u64));
        assert_eq!(Work::from_nbits(ChainType::UnitTest, 0x207fffff).value(), U256::one());
        assert_eq!(Work::from_nbits(ChainType::UnitTest, 0x203fffff).value(), U256::from(2u64));
        assert_eq!(Work::from_nbits(ChainType::UnitTest, 0x201fffff).value(), U256::from(4u64));
        assert!(Work::from_nbits(ChainType::UnitTest, 0x04923456).is_zero());
    }

    #[test]
    fn test_work_accumulates() {
        let total: Work = [0x207fffffu32, 0x203fffff, 0x201fffff]
            .iter()
            .map(|bits| Work::from_nbits(ChainType::UnitTest, *bits))
            .sum();
        assert_eq!(total.value(), U256::from(7u64));
        assert!(total > Work::from_nbits(ChainType::UnitTest, 0x201fffff));
    }
}
