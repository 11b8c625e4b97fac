use std::{fmt, ops::BitOr};

use serde::{Deserialize, Serialize};

use crate::errors::AttributionError;

/// A 128-bit aggregation key, stored as two 64-bit halves.
///
/// Used both for source keys and for trigger key pieces. Combining two keys
/// ORs each half independently, which is the same as OR-ing the full 128-bit
/// value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AggregationKey {
    pub high_bits: u64,
    pub low_bits: u64,
}

impl AggregationKey {
    pub const fn new(high_bits: u64, low_bits: u64) -> Self {
        Self {
            high_bits,
            low_bits,
        }
    }

    pub const fn from_low_bits(low_bits: u64) -> Self {
        Self::new(0, low_bits)
    }

    /// Parses a key from a hex string, with or without the `0x` prefix, as
    /// found in registration headers. At most 32 hex digits.
    pub fn from_hex(hex: &str) -> Result<Self, AttributionError> {
        let digits = hex
            .strip_prefix("0x")
            .or_else(|| hex.strip_prefix("0X"))
            .unwrap_or(hex);
        if digits.is_empty() || digits.len() > 32 {
            return Err(AttributionError::InvalidAggregationKey(hex.to_string()));
        }
        let value = u128::from_str_radix(digits, 16)
            .map_err(|_| AttributionError::InvalidAggregationKey(hex.to_string()))?;
        Ok(Self::from(value))
    }

    /// Combines a source key with a trigger key piece.
    pub fn combine(&self, other: &AggregationKey) -> AggregationKey {
        AggregationKey {
            high_bits: self.high_bits | other.high_bits,
            low_bits: self.low_bits | other.low_bits,
        }
    }

    pub fn as_u128(&self) -> u128 {
        (u128::from(self.high_bits) << 64) | u128::from(self.low_bits)
    }
}

impl From<u128> for AggregationKey {
    fn from(value: u128) -> Self {
        Self {
            high_bits: (value >> 64) as u64,
            low_bits: value as u64,
        }
    }
}

impl From<AggregationKey> for u128 {
    fn from(key: AggregationKey) -> Self {
        key.as_u128()
    }
}

impl BitOr for AggregationKey {
    type Output = AggregationKey;

    fn bitor(self, rhs: AggregationKey) -> AggregationKey {
        self.combine(&rhs)
    }
}

impl fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.as_u128())
    }
}
