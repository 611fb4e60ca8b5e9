//! # Money Module
//!
//! Fixed-point monetary amounts made of whole units and a two-digit
//! fractional part. Amounts are always kept normalized: `subunits` stays in
//! `0..=99` and any overflow is carried into `units`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency used when a ledger does not specify one
pub const DEFAULT_CURRENCY: &str = "CAD";

/// Number of subunits in one unit
const SUBUNITS_PER_UNIT: u64 = 100;

/// Errors produced while parsing or combining amounts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("'{0}' is not a valid amount")]
    InvalidFormat(String),
    #[error("cannot combine {left} with {right}")]
    CurrencyMismatch { left: String, right: String },
}

/// A non-negative amount of money in a single currency.
///
/// The sign of a transaction lives on the entry (`Entry::is_positive`), not
/// on the amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MoneyValue {
    units: u64,
    subunits: u8,
    currency_code: String,
}

impl MoneyValue {
    /// Build an amount, carrying any subunit overflow into the whole units
    pub fn new(units: u64, subunits: u64, currency_code: impl Into<String>) -> Self {
        Self {
            units: units.saturating_add(subunits / SUBUNITS_PER_UNIT),
            subunits: (subunits % SUBUNITS_PER_UNIT) as u8,
            currency_code: currency_code.into(),
        }
    }

    pub fn zero(currency_code: impl Into<String>) -> Self {
        Self::new(0, 0, currency_code)
    }

    pub fn units(&self) -> u64 {
        self.units
    }

    pub fn subunits(&self) -> u8 {
        self.subunits
    }

    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0 && self.subunits == 0
    }

    /// Total value expressed in subunits (cents)
    pub fn to_minor_units(&self) -> u64 {
        self.units
            .saturating_mul(SUBUNITS_PER_UNIT)
            .saturating_add(u64::from(self.subunits))
    }

    /// Check whether a form value is an acceptable amount.
    ///
    /// A valid amount has exactly one decimal point, a non-empty run of
    /// digits on each side, and one or two fractional digits:
    /// `"12.5"` and `"0.00"` pass, `"12."`, `"abc.12"` and `"12.100"` do not.
    pub fn is_valid_amount(value: &str) -> bool {
        let Some((whole, fraction)) = value.split_once('.') else {
            return false;
        };

        is_digits(whole) && is_digits(fraction) && fraction.len() <= 2
    }

    /// Parse an amount string.
    ///
    /// Accepts a bare integer (`"12"`) or an integer with a one or two digit
    /// fraction. The fraction is read as a whole number of subunits, so
    /// `"12.5"` and `"12.05"` are both twelve units and five subunits. This
    /// makes `parse` the inverse of the legacy [`Display`](fmt::Display) form.
    pub fn parse(value: &str, currency_code: impl Into<String>) -> Result<Self, MoneyError> {
        let invalid = || MoneyError::InvalidFormat(value.to_string());
        let trimmed = value.trim();

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (trimmed, None),
        };

        if !is_digits(whole) {
            return Err(invalid());
        }
        let units: u64 = whole.parse().map_err(|_| invalid())?;

        let subunits = match fraction {
            None => 0,
            Some(digits) if is_digits(digits) && digits.len() <= 2 => {
                digits.parse::<u64>().map_err(|_| invalid())?
            }
            Some(_) => return Err(invalid()),
        };

        Ok(Self::new(units, subunits, currency_code))
    }

    /// Add two amounts, normalizing the subunits.
    ///
    /// The result carries the currency of `self`; use [`MoneyValue::checked_add`]
    /// when the currencies may differ.
    pub fn add(&self, other: &MoneyValue) -> MoneyValue {
        let subunits = u64::from(self.subunits) + u64::from(other.subunits);
        Self::new(
            self.units.saturating_add(other.units),
            subunits,
            self.currency_code.clone(),
        )
    }

    pub fn checked_add(&self, other: &MoneyValue) -> Result<MoneyValue, MoneyError> {
        if !self.currency_code.eq_ignore_ascii_case(&other.currency_code) {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency_code.clone(),
                right: other.currency_code.clone(),
            });
        }
        Ok(self.add(other))
    }

    /// Sum a list of amounts starting from zero in the given currency
    pub fn sum<'a, I>(values: I, currency_code: &str) -> MoneyValue
    where
        I: IntoIterator<Item = &'a MoneyValue>,
    {
        values
            .into_iter()
            .fold(MoneyValue::zero(currency_code), |total, value| total.add(value))
    }

    /// Two-digit form, e.g. `12.05`
    pub fn to_padded_string(&self) -> String {
        format!("{}.{:02}", self.units, self.subunits)
    }
}

/// Legacy display form: `{units}.{subunits}` with no zero padding, so five
/// subunits render as `12.5`. Use [`MoneyValue::to_padded_string`] for the
/// unambiguous form.
impl fmt::Display for MoneyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.units, self.subunits)
    }
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_amounts() {
        assert!(MoneyValue::is_valid_amount("12.5"));
        assert!(MoneyValue::is_valid_amount("0.00"));
        assert!(MoneyValue::is_valid_amount("1500.99"));
    }

    #[test]
    fn test_invalid_amounts() {
        assert!(!MoneyValue::is_valid_amount("12."));
        assert!(!MoneyValue::is_valid_amount("abc.12"));
        assert!(!MoneyValue::is_valid_amount("12.100"));
        assert!(!MoneyValue::is_valid_amount("12"));
        assert!(!MoneyValue::is_valid_amount(".50"));
        assert!(!MoneyValue::is_valid_amount("-1.50"));
        assert!(!MoneyValue::is_valid_amount("1.2.3"));
        assert!(!MoneyValue::is_valid_amount(""));
    }

    #[test]
    fn test_parse_reads_fraction_as_integer() {
        let amount = MoneyValue::parse("12.5", DEFAULT_CURRENCY).unwrap();
        assert_eq!(amount.units(), 12);
        assert_eq!(amount.subunits(), 5);

        let amount = MoneyValue::parse("12.05", DEFAULT_CURRENCY).unwrap();
        assert_eq!(amount.subunits(), 5);

        let amount = MoneyValue::parse("12.50", DEFAULT_CURRENCY).unwrap();
        assert_eq!(amount.subunits(), 50);

        let amount = MoneyValue::parse("7", "USD").unwrap();
        assert_eq!(amount.units(), 7);
        assert_eq!(amount.subunits(), 0);
        assert_eq!(amount.currency_code(), "USD");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            MoneyValue::parse("abc.12", DEFAULT_CURRENCY),
            Err(MoneyError::InvalidFormat("abc.12".to_string()))
        );
        assert!(MoneyValue::parse("12.345", DEFAULT_CURRENCY).is_err());
        assert!(MoneyValue::parse("12.", DEFAULT_CURRENCY).is_err());
    }

    #[test]
    fn test_new_carries_overflow() {
        let amount = MoneyValue::new(3, 250, DEFAULT_CURRENCY);
        assert_eq!(amount.units(), 5);
        assert_eq!(amount.subunits(), 50);
    }

    #[test]
    fn test_add_carries_into_units() {
        let a = MoneyValue::new(10, 75, DEFAULT_CURRENCY);
        let b = MoneyValue::new(2, 50, DEFAULT_CURRENCY);
        let total = a.add(&b);
        assert_eq!(total.units(), 13);
        assert_eq!(total.subunits(), 25);
    }

    #[test]
    fn test_checked_add_rejects_mixed_currencies() {
        let cad = MoneyValue::new(1, 0, "CAD");
        let usd = MoneyValue::new(1, 0, "USD");
        assert!(matches!(
            cad.checked_add(&usd),
            Err(MoneyError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_sum_of_empty_list_is_zero() {
        let total = MoneyValue::sum(&Vec::<MoneyValue>::new(), DEFAULT_CURRENCY);
        assert!(total.is_zero());
        assert_eq!(total.currency_code(), DEFAULT_CURRENCY);
    }

    #[test]
    fn test_sum_folds_all_values() {
        let values = vec![
            MoneyValue::new(1, 99, DEFAULT_CURRENCY),
            MoneyValue::new(0, 1, DEFAULT_CURRENCY),
            MoneyValue::new(5, 50, DEFAULT_CURRENCY),
        ];
        let total = MoneyValue::sum(&values, DEFAULT_CURRENCY);
        assert_eq!(total.to_padded_string(), "7.50");
    }

    #[test]
    fn test_display_keeps_unpadded_subunits() {
        assert_eq!(MoneyValue::new(12, 5, DEFAULT_CURRENCY).to_string(), "12.5");
        assert_eq!(MoneyValue::new(12, 50, DEFAULT_CURRENCY).to_string(), "12.50");
        assert_eq!(
            MoneyValue::new(12, 5, DEFAULT_CURRENCY).to_padded_string(),
            "12.05"
        );
    }

    proptest! {
        #[test]
        fn add_normalizes_subunits(
            u1 in 0u64..1_000_000,
            s1 in 0u64..=99,
            u2 in 0u64..1_000_000,
            s2 in 0u64..=99,
        ) {
            let a = MoneyValue::new(u1, s1, DEFAULT_CURRENCY);
            let b = MoneyValue::new(u2, s2, DEFAULT_CURRENCY);
            let total = a.add(&b);

            prop_assert!(total.subunits() <= 99);
            prop_assert_eq!(total.units(), u1 + u2 + (s1 + s2) / 100);
            prop_assert_eq!(u64::from(total.subunits()), (s1 + s2) % 100);
        }

        #[test]
        fn parse_inverts_both_display_forms(units in 0u64..1_000_000, subunits in 0u64..=99) {
            let amount = MoneyValue::new(units, subunits, DEFAULT_CURRENCY);

            prop_assert_eq!(&MoneyValue::parse(&amount.to_string(), DEFAULT_CURRENCY).unwrap(), &amount);
            prop_assert_eq!(&MoneyValue::parse(&amount.to_padded_string(), DEFAULT_CURRENCY).unwrap(), &amount);
        }
    }
}
