//! Amount type for monetary values.
//!
//! Wraps `Decimal` and canonicalizes to two decimal places, which is how
//! amounts are written to the sheet. Parsing accepts plain decimal strings as
//! well as currency-formatted cells like `$1,234.56`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// A currency amount with two-decimal precision.
///
/// The canonical string form is plain decimal text with two decimal places,
/// e.g. `1234.50`; this is what gets written to the sheet and to local
/// persistence. Use [`Amount::currency`] for the `$1,234.50` presentation
/// form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Creates a new `Amount`, rounding the value to two decimal places.
    pub fn new(value: Decimal) -> Self {
        let mut value = value.round_dp(2);
        // Pad to exactly two decimals so the canonical form is stable.
        value.rescale(2);
        Self(value)
    }

    pub fn zero() -> Self {
        Amount::new(Decimal::ZERO)
    }

    /// Returns the underlying `Decimal` value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(&self) -> Amount {
        Amount::new(self.0.abs())
    }

    /// Parses a sheet cell leniently: unparseable cells become zero, the way
    /// the rest of a loaded ledger should not be lost to one bad cell.
    pub fn parse_cell(cell: &str) -> Amount {
        Amount::from_str(cell).unwrap_or_else(|_| Amount::zero())
    }

    /// Renders the presentation form: `$1,234.50`, or `-$1,234.50`.
    pub fn currency(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let grouped = format_num::format_num!(",.2", self.0.abs().to_f64().unwrap_or_default());
        format!("{sign}${grouped}")
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::zero());
        }

        // Strip an optional dollar sign, which may follow a minus sign.
        let without_dollar = if let Some(after_minus) = trimmed.strip_prefix('-') {
            if let Some(after_dollar) = after_minus.strip_prefix('$') {
                format!("-{after_dollar}")
            } else {
                trimmed.to_string()
            }
        } else if let Some(after_dollar) = trimmed.strip_prefix('$') {
            after_dollar.to_string()
        } else {
            trimmed.to_string()
        };

        // Strip thousands separators.
        let cleaned = without_dollar.replace(',', "");
        Ok(Amount::new(Decimal::from_str(&cleaned)?))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount::new(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount::new(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        Amount::new(iter.map(|a| a.0).sum())
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        Amount::new(iter.map(|a| a.0).sum())
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("50.00").unwrap();
        assert_eq!(amount.value(), Decimal::from_str("50.00").unwrap());
    }

    #[test]
    fn test_parse_with_dollar_sign() {
        let amount = Amount::from_str("$50.00").unwrap();
        assert_eq!(amount.value(), Decimal::from_str("50.00").unwrap());
    }

    #[test]
    fn test_parse_with_commas() {
        let amount = Amount::from_str("$1,234,567.89").unwrap();
        assert_eq!(amount.value(), Decimal::from_str("1234567.89").unwrap());
    }

    #[test]
    fn test_parse_negative_with_dollar_sign() {
        let amount = Amount::from_str("-$50.00").unwrap();
        assert_eq!(amount.value(), Decimal::from_str("-50.00").unwrap());
    }

    #[test]
    fn test_parse_empty_string_is_zero() {
        let amount = Amount::from_str("").unwrap();
        assert!(amount.is_zero());
        assert_eq!(amount.to_string(), "0.00");
    }

    #[test]
    fn test_parse_cell_garbage_is_zero() {
        assert!(Amount::parse_cell("n/a").is_zero());
        assert!(Amount::parse_cell("$").is_zero());
    }

    #[test]
    fn test_canonical_two_decimals() {
        assert_eq!(Amount::from_str("10").unwrap().to_string(), "10.00");
        assert_eq!(Amount::from_str("10.5").unwrap().to_string(), "10.50");
        assert_eq!(Amount::from_str("10.505").unwrap().to_string(), "10.50");
    }

    #[test]
    fn test_format_parse_round_trip() {
        // One format/parse cycle must not drift.
        let amount = Amount::from_str("1234.5").unwrap();
        let formatted = amount.to_string();
        assert_eq!(formatted, "1234.50");
        let reparsed = Amount::from_str(&formatted).unwrap();
        assert_eq!(reparsed, amount);
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(Amount::from_str("1234.5").unwrap().currency(), "$1,234.50");
        assert_eq!(Amount::from_str("-50").unwrap().currency(), "-$50.00");
        assert_eq!(Amount::zero().currency(), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Amount::from_str("10.25").unwrap();
        let b = Amount::from_str("5.75").unwrap();
        assert_eq!((a + b).to_string(), "16.00");
        assert_eq!((a - b).to_string(), "4.50");
        let total: Amount = [a, b].iter().sum();
        assert_eq!(total.to_string(), "16.00");
    }

    #[test]
    fn test_serde_round_trip() {
        let amount = Amount::from_str("$1,234.56").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1234.56\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}
