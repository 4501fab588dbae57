//! Fixed-point credit amounts.

use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A credit amount stored as hundredths of a credit.
///
/// Prices and balances are quoted with two decimal places (`0.10`, `0.75`),
/// so integer hundredths represent them exactly. On the wire the amount is a
/// JSON number (`0.5`); deserialization also accepts decimal strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Credits(i64);

impl Credits {
    /// Zero credits.
    pub const ZERO: Credits = Credits(0);

    /// Create an amount from hundredths of a credit.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in hundredths of a credit.
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// The amount as a floating point number of credits.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Round a floating point number of credits to the nearest hundredth.
    ///
    /// Returns `None` for NaN, infinities and values outside the `i64` range.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let cents = (value * 100.0).round();
        if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }

    /// Whether the amount is below zero.
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Credits {
    type Output = Credits;

    fn add(self, rhs: Credits) -> Credits {
        Credits(self.0 + rhs.0)
    }
}

impl Sub for Credits {
    type Output = Credits;

    fn sub(self, rhs: Credits) -> Credits {
        Credits(self.0 - rhs.0)
    }
}

impl Neg for Credits {
    type Output = Credits;

    fn neg(self) -> Credits {
        Credits(-self.0)
    }
}

/// Error parsing a decimal credit string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid credit amount '{0}': expected a decimal with at most two fractional digits")]
pub struct ParseCreditsError(String);

impl FromStr for Credits {
    type Err = ParseCreditsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseCreditsError(s.to_string());
        let trimmed = s.trim();

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or_else(invalid)?;

        Ok(Credits(if negative { -cents } else { cents }))
    }
}

impl Serialize for Credits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Credits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CreditsVisitor)
    }
}

struct CreditsVisitor;

impl<'de> Visitor<'de> for CreditsVisitor {
    type Value = Credits;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a credit amount as a number or decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Credits, E> {
        v.checked_mul(100)
            .map(Credits)
            .ok_or_else(|| E::custom("credit amount out of range"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Credits, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .map(Credits)
            .ok_or_else(|| E::custom("credit amount out of range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Credits, E> {
        Credits::from_f64(v).ok_or_else(|| E::custom("credit amount out of range"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Credits, E> {
        v.parse().map_err(E::custom)
    }
}
