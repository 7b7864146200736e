//! Filter parameters per filter type.

use serde::{Deserialize, Serialize};
use shared_types::FilterType;

/// BIP158 basic filter Golomb parameter.
pub const BIP158_BITS: u8 = 19;
/// BIP158 basic filter false-positive denominator.
pub const BIP158_FP_RATE: u32 = 784_931;
/// Extended filter Golomb parameter.
pub const ES_BITS: u8 = 23;
/// Extended filter false-positive denominator.
pub const ES_FP_RATE: u32 = 12_558_895;

/// Largest Golomb parameter the bit reader will accept.
pub const MAX_BITS: u8 = 32;

/// Golomb parameter `P` and false-positive denominator `M`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterParams {
    /// Golomb-Rice parameter `P`.
    pub bits: u8,
    /// False-positive rate denominator `M`.
    pub fp_rate: u32,
}

impl FilterParams {
    pub const fn new(bits: u8, fp_rate: u32) -> Self {
        Self { bits, fp_rate }
    }

    /// Parameters for a filter type.
    pub fn for_type(filter_type: FilterType) -> Self {
        match filter_type {
            FilterType::BasicBip158 | FilterType::BasicBchVariant => {
                Self::new(BIP158_BITS, BIP158_FP_RATE)
            }
            FilterType::Es => Self::new(ES_BITS, ES_FP_RATE),
        }
    }

    /// Hash range `N * M` for a filter of `count` elements.
    pub fn range(&self, count: u32) -> u64 {
        u64::from(count) * u64::from(self.fp_rate)
    }

    /// Expected false-positive probability for a single query.
    pub fn false_positive_rate(&self) -> f64 {
        1.0 / f64::from(self.fp_rate)
    }
}

impl From<FilterType> for FilterParams {
    fn from(filter_type: FilterType) -> Self {
        Self::for_type(filter_type)
    }
}
