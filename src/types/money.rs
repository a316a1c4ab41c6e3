//! Money value type for the ledger engine
//!
//! Amounts are exact signed integers in minor units (cents, satang) bound to
//! a currency. Arithmetic never mixes currencies and never wraps.

use super::error::LedgerError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Minor units per major unit for every supported currency
const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Supported currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar
    Usd,
    /// Thai baht
    Thb,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Usd => write!(f, "USD"),
            Currency::Thb => write!(f, "THB"),
        }
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "THB" => Ok(Currency::Thb),
            other => Err(LedgerError::validation(format!(
                "unsupported currency '{}'",
                other
            ))),
        }
    }
}

/// An exact amount of money in minor units
///
/// `Money` is an immutable value: every operation returns a new value.
/// Two values are ordered only when they share a currency; `partial_cmp`
/// returns `None` across currencies rather than coercing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// Create a new amount from minor units
    pub const fn new(amount: i64, currency: Currency) -> Self {
        Money { amount, currency }
    }

    /// Zero in the given currency
    pub const fn zero(currency: Currency) -> Self {
        Money::new(0, currency)
    }

    /// Amount in minor units
    pub const fn amount(&self) -> i64 {
        self.amount
    }

    /// Currency of this amount
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    pub const fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub const fn is_negative(&self) -> bool {
        self.amount < 0
    }

    pub const fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Add two amounts of the same currency
    ///
    /// # Errors
    ///
    /// - `CurrencyMismatch` if the currencies differ
    /// - `ArithmeticOverflow` if the sum leaves the i64 range
    pub fn add(&self, other: Money) -> Result<Money, LedgerError> {
        self.ensure_same_currency(&other, "add")?;

        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("add"))?;

        Ok(Money::new(amount, self.currency))
    }

    /// Subtract an amount of the same currency
    ///
    /// # Errors
    ///
    /// - `CurrencyMismatch` if the currencies differ
    /// - `ArithmeticOverflow` if the difference leaves the i64 range
    pub fn subtract(&self, other: Money) -> Result<Money, LedgerError> {
        self.ensure_same_currency(&other, "subtract")?;

        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("subtract"))?;

        Ok(Money::new(amount, self.currency))
    }

    /// Compare two amounts, rejecting mismatched currencies
    pub fn checked_cmp(&self, other: &Money) -> Result<Ordering, LedgerError> {
        self.ensure_same_currency(other, "compare")?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// Human readable form, e.g. `30.00 USD`
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }

    /// Major units as a float. Display only: never feed this back into
    /// balance arithmetic.
    pub fn to_float(&self) -> f64 {
        self.amount as f64 / MINOR_UNITS_PER_MAJOR as f64
    }

    /// Exact major-unit decimal (two decimal places)
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.amount, 2)
    }

    /// Parse a major-unit decimal string such as `"12.34"`
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the string is not a decimal number, has more
    /// than two fractional digits, or does not fit in minor units.
    pub fn from_major_str(input: &str, currency: Currency) -> Result<Money, LedgerError> {
        let trimmed = input.trim();
        let value = Decimal::from_str(trimmed)
            .map_err(|_| LedgerError::validation(format!("invalid amount '{}'", trimmed)))?;

        let minor = value
            .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))
            .ok_or_else(|| LedgerError::arithmetic_overflow("parse amount"))?;

        if !minor.fract().is_zero() {
            return Err(LedgerError::validation(format!(
                "amount '{}' has more than two decimal places",
                trimmed
            )));
        }

        let amount = minor
            .to_i64()
            .ok_or_else(|| LedgerError::arithmetic_overflow("parse amount"))?;

        Ok(Money::new(amount, currency))
    }

    fn ensure_same_currency(&self, other: &Money, operation: &str) -> Result<(), LedgerError> {
        if self.currency != other.currency {
            return Err(LedgerError::currency_mismatch(
                operation,
                self.currency,
                other.currency,
            ));
        }
        Ok(())
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        Some(self.amount.cmp(&other.amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal(), self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Currency::Usd)]
    #[case(10000, Currency::Thb)]
    #[case(-250, Currency::Usd)]
    #[case(i64::MAX, Currency::Thb)]
    fn test_new_keeps_amount_and_currency(#[case] amount: i64, #[case] currency: Currency) {
        let money = Money::new(amount, currency);
        assert_eq!(money.amount(), amount);
        assert_eq!(money.currency(), currency);
    }

    #[rstest]
    #[case(0, true, false, false)]
    #[case(1, false, false, true)]
    #[case(-1, false, true, false)]
    fn test_sign_predicates(
        #[case] amount: i64,
        #[case] zero: bool,
        #[case] negative: bool,
        #[case] positive: bool,
    ) {
        let money = Money::new(amount, Currency::Usd);
        assert_eq!(money.is_zero(), zero);
        assert_eq!(money.is_negative(), negative);
        assert_eq!(money.is_positive(), positive);
    }

    #[rstest]
    #[case(1000, 500, 1500, 500)]
    #[case(-300, 100, -200, -400)]
    #[case(0, -50, -50, 50)]
    fn test_add_and_subtract_same_currency(
        #[case] left: i64,
        #[case] right: i64,
        #[case] sum: i64,
        #[case] difference: i64,
    ) {
        let a = Money::new(left, Currency::Thb);
        let b = Money::new(right, Currency::Thb);

        assert_eq!(a.add(b).unwrap(), Money::new(sum, Currency::Thb));
        assert_eq!(a.subtract(b).unwrap(), Money::new(difference, Currency::Thb));
    }

    #[rstest]
    #[case(Currency::Usd, Currency::Thb)]
    #[case(Currency::Thb, Currency::Usd)]
    fn test_arithmetic_rejects_mismatched_currency(
        #[case] left: Currency,
        #[case] right: Currency,
    ) {
        let a = Money::new(100, left);
        let b = Money::new(100, right);

        assert!(matches!(
            a.add(b),
            Err(LedgerError::CurrencyMismatch { .. })
        ));
        assert!(matches!(
            a.subtract(b),
            Err(LedgerError::CurrencyMismatch { .. })
        ));
        assert!(matches!(
            a.checked_cmp(&b),
            Err(LedgerError::CurrencyMismatch { .. })
        ));
        assert_eq!(a.partial_cmp(&b), None);
    }

    #[test]
    fn test_add_overflow_is_reported() {
        let a = Money::new(i64::MAX, Currency::Usd);
        let b = Money::new(1, Currency::Usd);
        assert!(matches!(
            a.add(b),
            Err(LedgerError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn test_ordering_within_currency() {
        let small = Money::new(100, Currency::Usd);
        let large = Money::new(200, Currency::Usd);
        assert!(small < large);
        assert_eq!(small.checked_cmp(&large).unwrap(), Ordering::Less);
    }

    #[rstest]
    #[case(3000, Currency::Usd, "30.00 USD")]
    #[case(5, Currency::Thb, "0.05 THB")]
    #[case(-150, Currency::Usd, "-1.50 USD")]
    #[case(0, Currency::Usd, "0.00 USD")]
    fn test_display_string(#[case] amount: i64, #[case] currency: Currency, #[case] expected: &str) {
        assert_eq!(Money::new(amount, currency).to_display_string(), expected);
    }

    #[test]
    fn test_to_float() {
        assert_eq!(Money::new(1234, Currency::Usd).to_float(), 12.34);
    }

    #[rstest]
    #[case("12.34", 1234)]
    #[case("  100  ", 10000)]
    #[case("0.5", 50)]
    #[case("-3.00", -300)]
    fn test_from_major_str(#[case] input: &str, #[case] expected: i64) {
        let money = Money::from_major_str(input, Currency::Usd).unwrap();
        assert_eq!(money, Money::new(expected, Currency::Usd));
    }

    #[rstest]
    #[case::too_precise("1.234")]
    #[case::not_a_number("ten")]
    #[case::empty("")]
    fn test_from_major_str_rejects(#[case] input: &str) {
        assert!(matches!(
            Money::from_major_str(input, Currency::Usd),
            Err(LedgerError::Validation { .. })
        ));
    }

    #[rstest]
    #[case("usd", Currency::Usd)]
    #[case("THB", Currency::Thb)]
    fn test_currency_from_str(#[case] input: &str, #[case] expected: Currency) {
        assert_eq!(input.parse::<Currency>().unwrap(), expected);
    }
}
