//! Currency amounts in minor units.
//!
//! Prices are kept as an integer count of the smallest currency unit (e.g.
//! agorot, cents) so that totals never drift the way floating-point sums do.
//! Amounts are rendered and persisted as two-decimal strings (`"49.90"`).

use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

const MINOR_PER_MAJOR: u64 = 100;

/// A non-negative amount of money in minor units.
///
/// Arithmetic saturates at `u64::MAX` minor units instead of panicking.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(u64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub const fn minor_units(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Amount multiplied by a quantity.
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(u64::from(quantity)))
    }

    /// Parse a decimal string as sent by the commerce backend.
    ///
    /// - `""` (an unset price) is zero
    /// - `"12"`, `"12.5"`, `"12.50"` and `".5"` are accepted
    /// - digits past the second decimal place round half-up on the third
    /// - signs, exponents and separators other than one `.` are rejected
    pub fn parse_decimal(input: &str) -> DomainResult<Self> {
        let s = input.trim();
        if s.is_empty() {
            return Ok(Self::ZERO);
        }

        let (whole, fraction) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) || (whole.is_empty() && fraction.is_empty()) {
            return Err(DomainError::validation(format!("invalid amount: {input:?}")));
        }

        let overflow = || DomainError::validation(format!("amount out of range: {input:?}"));

        let major = if whole.is_empty() {
            0
        } else {
            whole.parse::<u64>().map_err(|_| overflow())?
        };

        let digits: Vec<u64> = fraction.bytes().map(|b| u64::from(b - b'0')).collect();
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let round_up = digits.get(2).is_some_and(|d| *d >= 5);

        let minor = major
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(tenths * 10 + hundredths))
            .and_then(|m| m.checked_add(u64::from(round_up)))
            .ok_or_else(overflow)?;

        Ok(Self(minor))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / MINOR_PER_MAJOR, self.0 % MINOR_PER_MAJOR)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s)
    }
}

impl TryFrom<String> for Money {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_decimal(&value)
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}
