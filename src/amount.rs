//! Monetary amounts taken from ledger exports.
//!
//! Uses `rust_decimal` internally so sums over many line items are exact.
//! Ledger exports routinely contain blank or placeholder cells, so the
//! public constructor for cell data is the total [`Amount::coerce`] rather
//! than a fallible parse.

use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

/// A decimal money value.
///
/// # Examples
///
/// ```
/// use payables_engine::Amount;
///
/// assert_eq!(Amount::coerce("1,250.5").to_string(), "1250.50");
/// assert_eq!(Amount::coerce("(40.00)").to_accounting(), "(40.00)");
/// assert!(Amount::coerce("n/a").is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Decimal places used when rendering.
    pub const DISPLAY_SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Amount(Decimal::ZERO);

    /// Wraps a `Decimal` without rounding.
    pub fn new(value: Decimal) -> Self {
        Amount(value)
    }

    /// Converts a raw cell into an amount, mapping anything unparseable to zero.
    ///
    /// Accepts surrounding whitespace, thousands separators, accounting
    /// negatives in parentheses and scientific notation.
    pub fn coerce(raw: &str) -> Self {
        match Self::parse_lenient(raw) {
            Some(amount) => amount,
            None => {
                if !raw.trim().is_empty() {
                    debug!("Coercing unparseable amount {:?} to zero", raw);
                }
                Amount::ZERO
            }
        }
    }

    fn parse_lenient(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            Some(inner) => (true, inner.trim()),
            None => (false, trimmed),
        };

        let cleaned: String = body.chars().filter(|c| *c != ',').collect();
        let value = Decimal::from_str(&cleaned)
            .or_else(|_| Decimal::from_scientific(&cleaned))
            .ok()?;

        Some(Amount(if negative { -value } else { value }))
    }

    /// Returns the underlying decimal.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Adds two amounts, returning `None` if the result is out of range.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Returns `true` if this value is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    fn rounded(&self) -> Decimal {
        let mut value = self
            .0
            .round_dp_with_strategy(Self::DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(Self::DISPLAY_SCALE);
        value
    }

    /// Renders the amount the way accounting spreadsheets show it:
    /// thousands separators, negatives in parentheses and `-` for zero.
    pub fn to_accounting(&self) -> String {
        let rounded = self.rounded();
        if rounded.is_zero() {
            return "-".to_string();
        }

        let digits = rounded.abs().to_string();
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
        let grouped = group_thousands(int_part);

        if rounded.is_sign_negative() {
            format!("({}.{})", grouped, frac_part)
        } else {
            format!("{}.{}", grouped, frac_part)
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rounded())
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(Decimal::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_plain_numbers() {
        assert_eq!(Amount::coerce("100"), Amount::from(100));
        assert_eq!(Amount::coerce("  2.5  ").to_string(), "2.50");
        assert_eq!(Amount::coerce("-7.25").to_string(), "-7.25");
    }

    #[test]
    fn test_coerce_ledger_formatting() {
        assert_eq!(Amount::coerce("1,234,567.89").to_string(), "1234567.89");
        assert_eq!(Amount::coerce("(50.00)"), Amount::from(-50));
        assert_eq!(Amount::coerce("1.5e3"), Amount::from(1500));
    }

    #[test]
    fn test_coerce_defaults_to_zero() {
        assert!(Amount::coerce("").is_zero());
        assert!(Amount::coerce("   ").is_zero());
        assert!(Amount::coerce("nan").is_zero());
        assert!(Amount::coerce("None").is_zero());
        assert!(Amount::coerce("-").is_zero());
        assert!(Amount::coerce("12abc").is_zero());
    }

    #[test]
    fn test_is_positive_excludes_zero() {
        assert!(Amount::from(1).is_positive());
        assert!(!Amount::ZERO.is_positive());
        assert!(!Amount::from(-1).is_positive());
    }

    #[test]
    fn test_sum_is_exact() {
        let total = ["0.1", "0.2", "0.3"]
            .iter()
            .try_fold(Amount::ZERO, |acc, s| acc.checked_add(Amount::coerce(s)))
            .unwrap();
        assert_eq!(total, Amount::coerce("0.6"));
    }

    #[test]
    fn test_checked_add_reports_overflow() {
        let max = Amount::new(Decimal::MAX);
        assert_eq!(max.checked_add(Amount::from(1)), None);
        assert_eq!(max.checked_add(-max), Some(Amount::ZERO));
    }

    #[test]
    fn test_accounting_format() {
        assert_eq!(Amount::coerce("1234.5").to_accounting(), "1,234.50");
        assert_eq!(Amount::coerce("-1234567").to_accounting(), "(1,234,567.00)");
        assert_eq!(Amount::coerce("999").to_accounting(), "999.00");
        assert_eq!(Amount::coerce("0.001").to_accounting(), "-");
        assert_eq!(Amount::ZERO.to_accounting(), "-");
    }

    #[test]
    fn test_display_rounds_to_two_places() {
        assert_eq!(Amount::coerce("10").to_string(), "10.00");
        assert_eq!(Amount::coerce("10.005").to_string(), "10.01");
        assert_eq!(Amount::coerce("-0.5").to_string(), "-0.50");
    }
}
