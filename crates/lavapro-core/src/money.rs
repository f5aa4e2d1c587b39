//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The backend stores prices as NUMERIC and sends them as JSON numbers:   │
//! │    { "total_price": 25.5 }                                              │
//! │                                                                         │
//! │  Summing those as floats drifts:                                        │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    "25.5" is parsed from its decimal TEXT → 2550 centavos              │
//! │    Revenue = Σ centavos, average = integer division with rounding      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lavapro_core::money::Money;
//!
//! let price = Money::from_centavos(2590); // R$ 25,90
//! let total = price + Money::from_centavos(1000);
//! assert_eq!(total.to_string(), "R$ 35,90");
//!
//! let parsed = Money::parse_decimal("35.9").unwrap();
//! assert_eq!(parsed, total);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in centavos (1/100 of a Brazilian Real).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Service.price ──► Order.total_price ──┬──► DashboardStats.revenue      │
/// │                                        │                                │
/// │                                        ├──► average ticket              │
/// │                                        │                                │
/// │                                        └──► monthly revenue buckets     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    #[inline]
    pub const fn from_centavos(centavos: i64) -> Self {
        Money(centavos)
    }

    /// Creates a Money value from reais and centavos.
    ///
    /// ## Example
    /// ```rust
    /// use lavapro_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).centavos(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).centavos(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn centavos(&self) -> i64 {
        self.0
    }

    /// Returns the whole-reais portion.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
    #[inline]
    pub const fn centavos_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Parses a decimal amount such as `"25.5"`, `"25,50"` or `"-3"`.
    ///
    /// ## Rules
    /// - Optional leading sign, digits, optional `.` or `,` separator
    /// - More than two fractional digits are rounded half away from zero
    /// - Exponent notation and thousands separators are rejected
    ///
    /// ## Example
    /// ```rust
    /// use lavapro_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("25.5").unwrap().centavos(), 2550);
    /// assert_eq!(Money::parse_decimal("0.125").unwrap().centavos(), 13);
    /// assert!(Money::parse_decimal("1e3").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let text = input.trim();
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let (whole, fraction) = match unsigned.find(['.', ',']) {
            Some(pos) => (&unsigned[..pos], &unsigned[pos + 1..]),
            None => (unsigned, ""),
        };

        let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() && fraction.is_empty() {
            return Err(ValidationError::invalid("amount", "no digits"));
        }
        if !is_digits(whole) || !is_digits(fraction) {
            return Err(ValidationError::invalid(
                "amount",
                format!("'{}' is not a decimal number", input.trim()),
            ));
        }

        let reais: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| ValidationError::invalid("amount", "too large"))?
        };

        let mut digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tens = digits.next().unwrap_or(0);
        let units = digits.next().unwrap_or(0);
        let round_up = digits.next().map(|d| d >= 5).unwrap_or(false);

        let centavos = reais
            .checked_mul(100)
            .and_then(|c| c.checked_add(tens * 10 + units + i64::from(round_up)))
            .ok_or_else(|| ValidationError::invalid("amount", "too large"))?;

        Ok(Money(if negative { -centavos } else { centavos }))
    }

    /// Formats the amount as a plain decimal (`"25.50"`), the form the
    /// backend's NUMERIC columns accept.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.reais().abs(), self.centavos_part())
    }

    /// Divides the amount evenly across `count` items, rounding half away
    /// from zero. Returns zero when `count` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use lavapro_core::money::Money;
    ///
    /// let revenue = Money::from_centavos(1000);
    /// assert_eq!(revenue.average_over(3).centavos(), 333);
    /// assert_eq!(revenue.average_over(0), Money::zero());
    /// ```
    pub fn average_over(&self, count: usize) -> Money {
        if count == 0 {
            return Money::zero();
        }
        let count = count as i128;
        let value = self.0 as i128;
        let half = count / 2;
        let rounded = if value >= 0 {
            (value + half) / count
        } else {
            (value - half) / count
        };
        Money(rounded as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Brazilian Real formatting: `R$ 1.234,56`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let whole = self.reais().abs().to_string();

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}R$ {},{:02}", sign, grouped, self.centavos_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_centavos() {
        let money = Money::from_centavos(1099);
        assert_eq!(money.centavos(), 1099);
        assert_eq!(money.reais(), 10);
        assert_eq!(money.centavos_part(), 99);
    }

    #[test]
    fn test_display_brl() {
        assert_eq!(Money::from_centavos(1099).to_string(), "R$ 10,99");
        assert_eq!(Money::from_centavos(0).to_string(), "R$ 0,00");
        assert_eq!(Money::from_centavos(123_456).to_string(), "R$ 1.234,56");
        assert_eq!(Money::from_centavos(100_000_000).to_string(), "R$ 1.000.000,00");
        assert_eq!(Money::from_centavos(-550).to_string(), "-R$ 5,50");
    }

    #[test]
    fn test_parse_decimal_forms() {
        assert_eq!(Money::parse_decimal("25").unwrap().centavos(), 2500);
        assert_eq!(Money::parse_decimal("25.5").unwrap().centavos(), 2550);
        assert_eq!(Money::parse_decimal("25,50").unwrap().centavos(), 2550);
        assert_eq!(Money::parse_decimal(".5").unwrap().centavos(), 50);
        assert_eq!(Money::parse_decimal("-3.10").unwrap().centavos(), -310);
        assert_eq!(Money::parse_decimal(" 7.00 ").unwrap().centavos(), 700);
    }

    #[test]
    fn test_parse_decimal_rounds_third_digit() {
        assert_eq!(Money::parse_decimal("0.125").unwrap().centavos(), 13);
        assert_eq!(Money::parse_decimal("0.124").unwrap().centavos(), 12);
        assert_eq!(Money::parse_decimal("-0.125").unwrap().centavos(), -13);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal("abc").is_err());
        assert!(Money::parse_decimal("1e3").is_err());
        assert!(Money::parse_decimal("1.234,56").is_err());
        assert!(Money::parse_decimal("99999999999999999999").is_err());
    }

    #[test]
    fn test_decimal_string() {
        assert_eq!(Money::from_centavos(2550).to_decimal_string(), "25.50");
        assert_eq!(Money::from_centavos(-5).to_decimal_string(), "-0.05");
    }

    #[test]
    fn test_average_over() {
        assert_eq!(Money::from_centavos(1000).average_over(3).centavos(), 333);
        assert_eq!(Money::from_centavos(1001).average_over(2).centavos(), 501);
        assert_eq!(Money::from_centavos(-1001).average_over(2).centavos(), -501);
        assert_eq!(Money::from_centavos(5000).average_over(0), Money::zero());
    }

    #[test]
    fn test_sum() {
        let prices = [Money::from_centavos(100), Money::from_centavos(250)];
        let total: Money = prices.iter().sum();
        assert_eq!(total.centavos(), 350);

        let empty: Money = Vec::<Money>::new().into_iter().sum();
        assert!(empty.is_zero());
    }
}
