//! Type-safe price representation using decimal arithmetic.
//!
//! Prices arrive from the backend as JSON numbers (`19.99`) or strings
//! (`"19.99"`); both deserialize into the same exact decimal value. The client
//! never derives authoritative totals from these, it only displays them.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// The input is negative.
    #[error("price cannot be negative")]
    Negative,
}

/// A monetary amount in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Parse a non-negative price from user input such as `"12.50"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a decimal or is negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount =
            Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid(s.to_owned()))?;
        if amount.is_sign_negative() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_number_and_string() {
        let from_number: Price = serde_json::from_str("19.99").unwrap();
        let from_string: Price = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(from_number, Price::from_cents(1999));
        assert_eq!(from_string, Price::from_cents(1999));
    }

    #[test]
    fn test_display_uses_two_decimals() {
        assert_eq!(Price::from_cents(500).to_string(), "$5.00");
        assert_eq!(Price::from_cents(123_456).to_string(), "$1234.56");
    }

    #[test]
    fn test_parse_rejects_negative_and_garbage() {
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
        assert!(matches!(Price::parse("ten"), Err(PriceError::Invalid(_))));
        assert_eq!(Price::parse(" 12.5 ").unwrap(), Price::from_cents(1250));
    }
}
