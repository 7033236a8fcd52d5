//! Traffic quotas measured in bytes, entered and displayed in gigabytes.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize};

/// Bytes per gigabyte (binary, 1024^3).
pub const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Errors that can occur when converting a gigabyte amount to [`Traffic`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrafficError {
    /// The amount is below zero.
    #[error("Traffic cannot be negative")]
    Negative,
    /// The amount does not fit in a byte counter.
    #[error("Traffic is too large")]
    Overflow,
}

/// A traffic quota or usage counter in bytes.
///
/// The backend stores bytes; operators think in gigabytes. Conversions use
/// decimal arithmetic so `1.1 GB` does not drift through binary floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Traffic(u64);

impl Traffic {
    /// Zero bytes.
    pub const ZERO: Self = Self(0);

    /// Create a traffic value from a byte count.
    #[must_use]
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Convert a gigabyte amount to bytes, rounding to the nearest byte.
    ///
    /// # Errors
    ///
    /// Returns [`TrafficError::Negative`] for amounts below zero and
    /// [`TrafficError::Overflow`] when the byte count exceeds `u64`.
    pub fn from_gb(gb: Decimal) -> Result<Self, TrafficError> {
        if gb.is_sign_negative() && !gb.is_zero() {
            return Err(TrafficError::Negative);
        }
        let bytes = gb
            .checked_mul(Decimal::from(BYTES_PER_GB))
            .ok_or(TrafficError::Overflow)?
            .round();
        bytes.to_u64().map(Self).ok_or(TrafficError::Overflow)
    }

    /// The byte count.
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.0
    }

    /// The amount in gigabytes.
    #[must_use]
    pub fn to_gb(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(BYTES_PER_GB)
    }

    /// Format as gigabytes with a fixed number of decimal places (`"1.50 GB"`).
    #[must_use]
    pub fn display_gb(&self, places: u32) -> String {
        let gb = self.to_gb().round_dp(places);
        format!("{gb:.prec$} GB", prec = places as usize)
    }
}

impl fmt::Display for Traffic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_gb(2))
    }
}

impl From<u64> for Traffic {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl<'de> Deserialize<'de> for Traffic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Byte counters sometimes arrive as floats.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Float(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(bytes) => Ok(Self(bytes)),
            Raw::Float(value) if value.is_finite() && value >= 0.0 => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let bytes = value.round() as u64;
                Ok(Self(bytes))
            }
            Raw::Float(value) => Err(serde::de::Error::custom(format!(
                "invalid traffic value: {value}"
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_from_gb_whole() {
        let traffic = Traffic::from_gb(Decimal::from(2)).unwrap();
        assert_eq!(traffic.bytes(), 2 * BYTES_PER_GB);
    }

    #[test]
    fn test_from_gb_fraction_rounds() {
        let traffic = Traffic::from_gb(Decimal::from_str("0.1").unwrap()).unwrap();
        assert_eq!(traffic.bytes(), 107_374_182);
    }

    #[test]
    fn test_from_gb_negative() {
        assert_eq!(
            Traffic::from_gb(Decimal::from(-1)),
            Err(TrafficError::Negative)
        );
        assert!(Traffic::from_gb(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_to_gb() {
        let traffic = Traffic::from_bytes(BYTES_PER_GB + BYTES_PER_GB / 2);
        assert_eq!(traffic.to_gb(), Decimal::from_str("1.5").unwrap());
    }

    #[test]
    fn test_display_gb_pads_places() {
        let traffic = Traffic::from_bytes(BYTES_PER_GB + BYTES_PER_GB / 2);
        assert_eq!(traffic.display_gb(2), "1.50 GB");
        assert_eq!(traffic.display_gb(1), "1.5 GB");
        assert_eq!(Traffic::ZERO.to_string(), "0.00 GB");
    }

    #[test]
    fn test_deserialize_float_bytes() {
        let traffic: Traffic = serde_json::from_str("1073741824.0").unwrap();
        assert_eq!(traffic.bytes(), BYTES_PER_GB);
        assert!(serde_json::from_str::<Traffic>("-5.0").is_err());
    }
}
