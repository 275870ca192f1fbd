//! Order total value object.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monetary total of an order.
///
/// Backed by a `Decimal` and persisted as its decimal string, so the scale the
/// client sent (`"19.98"`, `"20.0"`) survives storage unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderTotal(Decimal);

/// Why a total was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTotal {
    /// Not a decimal number.
    #[error("'{0}' is not a valid decimal amount")]
    NotDecimal(String),
    /// Below zero.
    #[error("total cannot be negative")]
    Negative,
}

impl OrderTotal {
    /// Create a total from a decimal, rejecting negative amounts.
    pub fn new(amount: Decimal) -> Result<Self, InvalidTotal> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(InvalidTotal::Negative);
        }
        Ok(Self(amount))
    }

    /// Parse a decimal string such as `"19.98"` or `"15e2"`.
    ///
    /// Digits beyond what a `Decimal` can hold are rejected, never rounded.
    pub fn parse(raw: &str) -> Result<Self, InvalidTotal> {
        let trimmed = raw.trim();
        let amount = if trimmed.contains(['e', 'E']) {
            Decimal::from_scientific(trimmed)
        } else {
            Decimal::from_str_exact(trimmed)
        }
        .map_err(|_| InvalidTotal::NotDecimal(raw.to_string()))?;
        Self::new(amount)
    }

    /// Storage representation.
    #[must_use]
    pub fn to_storage(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for OrderTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("19.98", "19.98" ; "two decimals")]
    #[test_case("20.0", "20.0" ; "trailing zero kept")]
    #[test_case(" 5 ", "5" ; "whitespace trimmed")]
    #[test_case("0", "0" ; "zero")]
    #[test_case("12345678901234567.89", "12345678901234567.89" ; "beyond f64 precision")]
    #[test_case("15e2", "1500" ; "exponent")]
    fn parse_preserves_scale(raw: &str, stored: &str) {
        let total = OrderTotal::parse(raw).unwrap();
        assert_eq!(total.to_storage(), stored);
    }

    #[test_case("abc" ; "letters")]
    #[test_case("" ; "empty")]
    #[test_case("1.2.3" ; "two points")]
    #[test_case("0.12345678901234567890123456789" ; "too many digits")]
    fn parse_rejects_non_decimal(raw: &str) {
        assert!(matches!(
            OrderTotal::parse(raw),
            Err(InvalidTotal::NotDecimal(_))
        ));
    }

    #[test]
    fn parse_rejects_negative() {
        assert_eq!(OrderTotal::parse("-1.00"), Err(InvalidTotal::Negative));
    }

    #[test]
    fn serializes_as_string() {
        let total = OrderTotal::parse("19.98").unwrap();
        assert_eq!(serde_json::to_string(&total).unwrap(), "\"19.98\"");
    }
}
