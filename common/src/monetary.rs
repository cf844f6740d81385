//! Monetary types for FlightSurety protocol.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

/// An amount of value (stake, premium, fee or payout).
///
/// Backed by a high precision decimal so that the 1.5x payout of any
/// premium is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Create a new amount.
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Create from a whole number of units.
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Create from a string value.
    pub fn from_str(value: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Self(value.parse()?))
    }

    /// Get the underlying decimal.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Check if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by a fixed factor (e.g. the payout multiplier).
    pub fn scaled(&self, factor: Decimal) -> Self {
        Self(self.0 * factor)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, other: Amount) -> Self::Output {
        Amount(self.0 + other.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, other: Amount) {
        self.0 += other.0;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, other: Amount) -> Self::Output {
        Amount(self.0 - other.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}
