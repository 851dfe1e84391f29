//! Amount parsing at the API boundary.
//!
//! Caller input arrives as a string to avoid binary float precision issues;
//! all arithmetic stays in `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be empty")]
    Empty,
    #[error("Amount is not a valid decimal number")]
    BadFormat,
    #[error("Amount must be greater than 0")]
    NotPositive,
}

/// A validated positive monetary amount.
///
/// Construction goes through [`Amount::parse`], so an `Amount` in hand is
/// always a finite positive decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(Decimal);

impl Amount {
    /// Parse caller input with strict format rules:
    /// - rejects empty strings
    /// - rejects `.5` (must be `0.5`) and `5.` (must be `5.0` or `5`)
    /// - rejects scientific notation
    /// - rejects zero and negative values
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        if s.starts_with('.') || s.ends_with('.') {
            return Err(AmountError::BadFormat);
        }
        if s.contains(['e', 'E']) {
            return Err(AmountError::BadFormat);
        }

        let value = Decimal::from_str(s).map_err(|_| AmountError::BadFormat)?;
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }

        Ok(Self(value.normalize()))
    }

    /// Get the inner Decimal value
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_amounts() {
        assert_eq!(Amount::parse("40").unwrap().value(), Decimal::from(40));
        assert_eq!(
            Amount::parse("0.5").unwrap().value(),
            Decimal::new(5, 1)
        );
        assert_eq!(
            Amount::parse(" 12.25 ").unwrap().value(),
            Decimal::new(1225, 2)
        );
    }

    #[test]
    fn test_parse_normalizes_trailing_zeros() {
        assert_eq!(Amount::parse("10.00").unwrap().value(), Decimal::from(10));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Amount::parse("").unwrap_err(), AmountError::Empty);
        assert_eq!(Amount::parse("abc").unwrap_err(), AmountError::BadFormat);
        assert_eq!(Amount::parse(".5").unwrap_err(), AmountError::BadFormat);
        assert_eq!(Amount::parse("5.").unwrap_err(), AmountError::BadFormat);
        assert_eq!(Amount::parse("1e5").unwrap_err(), AmountError::BadFormat);
        assert_eq!(Amount::parse("NaN").unwrap_err(), AmountError::BadFormat);
        assert_eq!(
            Amount::parse("Infinity").unwrap_err(),
            AmountError::BadFormat
        );
    }

    #[test]
    fn test_parse_rejects_non_positive() {
        assert_eq!(Amount::parse("0").unwrap_err(), AmountError::NotPositive);
        assert_eq!(Amount::parse("0.00").unwrap_err(), AmountError::NotPositive);
        assert_eq!(Amount::parse("-5").unwrap_err(), AmountError::NotPositive);
    }
}
