//! Positive monetary amount at currency scale.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::DomainError;

/// Number of minor units in one major unit (scale 2, matching `numeric(12,2)`).
const MINOR_PER_MAJOR: i64 = 100;

/// Positive payment amount.
///
/// Stored in the smallest unit of the currency (cents, fils, etc.)
/// to avoid floating-point precision issues. Payment amounts are always
/// strictly positive; a zero or negative value never reaches a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// Creates an amount from minor units.
    pub fn from_minor(minor: i64) -> Result<Self, DomainError> {
        if minor <= 0 {
            return Err(DomainError::NonPositiveAmount);
        }
        Ok(Self(minor))
    }

    /// Creates an amount from a major-unit decimal such as `40.5`.
    ///
    /// Values are rounded half away from zero to two decimal places.
    pub fn from_major(major: f64) -> Result<Self, DomainError> {
        if !major.is_finite() {
            return Err(DomainError::ValidationError(
                "amount must be a finite number".into(),
            ));
        }
        let minor = (major * MINOR_PER_MAJOR as f64).round();
        if minor > i64::MAX as f64 {
            return Err(DomainError::ValidationError("amount is too large".into()));
        }
        Self::from_minor(minor as i64)
    }

    /// Returns the amount in minor units.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Returns the amount as a major-unit float.
    pub fn as_major(&self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }

    /// Returns true if the amount is strictly greater than the given number of major units.
    pub fn exceeds_major(&self, major: i64) -> bool {
        self.0 > major.saturating_mul(MINOR_PER_MAJOR)
    }

    /// Renders the amount the way providers expect it on the wire:
    /// no trailing zeros and no decimal point for whole amounts (`40`, `40.5`, `40.05`).
    pub fn to_wire_string(&self) -> String {
        let major = self.0 / MINOR_PER_MAJOR;
        let minor = self.0 % MINOR_PER_MAJOR;
        match minor {
            0 => major.to_string(),
            m if m % 10 == 0 => format!("{}.{}", major, m / 10),
            m => format!("{}.{:02}", major, m),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / MINOR_PER_MAJOR,
            self.0 % MINOR_PER_MAJOR
        )
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % MINOR_PER_MAJOR == 0 {
            serializer.serialize_i64(self.0 / MINOR_PER_MAJOR)
        } else {
            serializer.serialize_f64(self.as_major())
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let major = f64::deserialize(deserializer)?;
        Amount::from_major(major).map_err(serde::de::Error::custom)
    }
}
