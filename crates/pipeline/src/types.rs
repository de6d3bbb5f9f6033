//! Shared value types for the budget domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (micros are whole multiples of the
//! currency minimum unit once rounded, timestamps are UTC) and participate in
//! domain computations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// Number of micros in one currency unit.
pub const MICROS_PER_UNIT: i64 = 1_000_000;

/// Micros in one cent, the smallest amount the remote service accepts.
pub const MICROS_PER_CENT: i64 = MICROS_PER_UNIT / 100;

/// Rounds a currency amount to whole cents (half away from zero).
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// An integer currency amount in the wire format of the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Micros(i64);

impl Micros {
    /// Creates a [`Micros`] from a raw integer.
    pub fn new(micros: i64) -> Self {
        Self(micros)
    }

    /// Converts a currency amount, rounding to cents first.
    ///
    /// The result is always a whole multiple of [`MICROS_PER_CENT`].
    pub fn from_amount(amount: f64) -> Self {
        let cents = (amount * 100.0).round() as i64;
        Self(cents * MICROS_PER_CENT)
    }

    /// Returns the underlying integer value.
    pub fn as_i64(self) -> i64 {
        self.0
    }

    /// Converts back to a currency amount.
    pub fn as_amount(self) -> f64 {
        self.0 as f64 / MICROS_PER_UNIT as f64
    }
}

impl std::fmt::Display for Micros {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
