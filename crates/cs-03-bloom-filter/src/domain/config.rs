//! Bloom filter configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use cs_03_bloom_filter::BloomConfig;
//!
//! let config = BloomConfig::default()
//!     .with_target_elements(500)
//!     .with_fp_rate(0.001)
//!     .with_tweak(rand::random());
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};

use super::bloom_filter::BloomUpdateFlag;
use crate::error::BloomError;

/// Bloom filter configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BloomConfig {
    /// Number of elements the filter is sized for
    pub target_elements: usize,
    /// Desired false positive rate, exclusive range (0, 1)
    pub fp_rate: f64,
    /// Seed offset for every hash round
    pub tweak: u32,
    /// Update behaviour requested from remote peers
    pub update_flag: BloomUpdateFlag,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            target_elements: 1_000,
            fp_rate: 0.000_1,
            tweak: 0,
            update_flag: BloomUpdateFlag::All,
        }
    }
}

impl BloomConfig {
    /// Small, deterministic configuration for tests.
    pub fn for_testing() -> Self {
        Self {
            target_elements: 10,
            fp_rate: 0.01,
            tweak: 0,
            update_flag: BloomUpdateFlag::None,
        }
    }

    pub fn validate(&self) -> Result<(), BloomError> {
        if !(self.fp_rate > 0.0 && self.fp_rate < 1.0) {
            return Err(BloomError::InvalidFalsePositiveRate { rate: self.fp_rate });
        }
        Ok(())
    }

    pub fn with_target_elements(mut self, count: usize) -> Self {
        self.target_elements = count;
        self
    }

    pub fn with_fp_rate(mut self, rate: f64) -> Self {
        self.fp_rate = rate;
        self
    }

    pub fn with_tweak(mut self, tweak: u32) -> Self {
        self.tweak = tweak;
        self
    }

    pub fn with_update_flag(mut self, flag: BloomUpdateFlag) -> Self {
        self.update_flag = flag;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BloomFilter;

    #[test]
    fn test_default_is_valid() {
        assert!(BloomConfig::default().validate().is_ok());
        assert!(BloomConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_rate() {
        let config = BloomConfig::default().with_fp_rate(1.5);
        assert_eq!(
            config.validate(),
            Err(BloomError::InvalidFalsePositiveRate { rate: 1.5 })
        );
    }

    #[test]
    fn test_filter_from_config() {
        let config = BloomConfig::for_testing()
            .with_tweak(99)
            .with_update_flag(BloomUpdateFlag::PubkeyOnly);
        let filter = BloomFilter::from_config(&config).unwrap();
        assert_eq!(filter.tweak(), 99);
        assert_eq!(filter.flags(), BloomUpdateFlag::PubkeyOnly);
        assert_eq!(filter.bit_len(), 88);
    }
}
