//! Cent-precise currency amounts and de-DE formatting.
//!
//! Storefront prices arrive as decimal strings (`"12.00"`) or JSON numbers.
//! They are held as integer cents so that derived prices round exactly once,
//! at the point where a ratio is applied.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A non-negative currency amount in the smallest unit (cents).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "PriceRepr", into = "String")]
pub struct Money(u64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiply by a whole quantity (line totals).
    pub fn checked_mul(self, quantity: u32) -> DomainResult<Money> {
        self.0
            .checked_mul(u64::from(quantity))
            .map(Money)
            .ok_or_else(|| DomainError::validation("line total overflows"))
    }

    /// `self * numerator / denominator`, rounded half away from zero to whole cents.
    ///
    /// Returns `None` when `denominator` is zero or the result does not fit.
    pub fn scale(self, numerator: u64, denominator: u64) -> Option<Money> {
        if denominator == 0 {
            return None;
        }
        let num = u128::from(self.0) * u128::from(numerator);
        let den = u128::from(denominator);
        let rounded = (num * 2 + den) / (den * 2);
        u64::try_from(rounded).ok().map(Money)
    }

    /// Render with German conventions: `.` groups thousands, `,` separates
    /// exactly two fraction digits (`1234567` cents → `12.345,67`).
    pub fn format_de(&self) -> String {
        let units = (self.0 / 100).to_string();
        let fraction = self.0 % 100;

        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, ch) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        format!("{grouped},{fraction:02}")
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.format_de())
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (units, fraction) = match s.split_once('.') {
            Some((u, f)) => (u, f),
            None => (s, ""),
        };

        if units.is_empty() || !units.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::validation(format!("invalid price: {s:?}")));
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::validation(format!(
                "price must have at most two fraction digits: {s:?}"
            )));
        }

        let units: u64 = units
            .parse()
            .map_err(|_| DomainError::validation(format!("price out of range: {s:?}")))?;
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().unwrap_or(0) * 10,
            _ => fraction.parse::<u64>().unwrap_or(0),
        };

        units
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .map(Money)
            .ok_or_else(|| DomainError::validation(format!("price out of range: {s:?}")))
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        format!("{}.{:02}", value.0 / 100, value.0 % 100)
    }
}

/// Wire representation of a price: the storefront API sends decimal strings,
/// fixtures and older payloads send numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Text(String),
    Number(f64),
}

impl TryFrom<PriceRepr> for Money {
    type Error = DomainError;

    fn try_from(value: PriceRepr) -> Result<Self, Self::Error> {
        match value {
            PriceRepr::Text(s) => s.parse(),
            PriceRepr::Number(n) => {
                if !n.is_finite() || n < 0.0 {
                    return Err(DomainError::validation(format!("invalid price: {n}")));
                }
                let cents = (n * 100.0).round();
                if cents > u64::MAX as f64 {
                    return Err(DomainError::validation(format!("price out of range: {n}")));
                }
                Ok(Money(cents as u64))
            }
        }
    }
}
