//! Money value object.
//!
//! Prices are stored by the hosted database as integer cents. Everything
//! here stays in integer minor units to avoid floating point errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Largest amount a signed `BIGINT` cents column holds
    #[allow(clippy::cast_sign_loss)] // i64::MAX is positive
    pub const MAX_STORED: Self = Self(i64::MAX as u64);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from a signed database column.
    ///
    /// Returns `None` for negative amounts.
    #[must_use]
    pub const fn from_db_cents(cents: i64) -> Option<Self> {
        if cents < 0 {
            None
        } else {
            #[allow(clippy::cast_sign_loss)] // checked non-negative above
            Some(Self(cents as u64))
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Whether the amount fits a signed cents column unchanged
    #[must_use]
    pub const fn fits_db(&self) -> bool {
        self.0 <= Self::MAX_STORED.0
    }

    /// Returns the amount as a signed database value, saturating at `i64::MAX`.
    ///
    /// Amounts that reach storage are checked with [`Money::fits_db`] first.
    #[must_use]
    pub fn to_db_cents(&self) -> i64 {
        i64::try_from(self.0).unwrap_or(i64::MAX)
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies by a quantity with overflow checking
    #[must_use]
    pub const fn checked_times(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
