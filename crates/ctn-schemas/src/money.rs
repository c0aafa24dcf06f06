//! Fixed-point money type.
//!
//! # Design invariant
//!
//! All monetary amounts on the internal decision surface (prices, subtotals,
//! balances, order totals) are `i64` integer micros: 1 peso = 1_000_000
//! micros. This eliminates f64 drift in balance arithmetic — two totals that
//! compare equal as `f64` but differ in a low decimal place are always
//! distinguishable as `i64`.
//!
//! `f64` conversions happen **only** at the wire boundary:
//!
//! | Direction              | Function                | Notes                |
//! |------------------------|-------------------------|----------------------|
//! | internal → REST API    | [`Money::to_decimal`]   | Serialization only   |
//! | REST API → internal    | [`Money::from_decimal`] | Parsing only         |
//! | decimal strings → internal | [`Money::parse_decimal`] | e.g. `"100.00"` |
//!
//! `Money` wraps the raw `i64` so the type system prevents accidental
//! arithmetic with unrelated integers (quantities, item ids, epochs).
//! There is intentionally no `From<i64>` impl — callers must be deliberate
//! about when a raw integer represents a monetary amount.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Scale factor: 1 peso = 1_000_000 micros (6 decimal places).
pub const MICROS_PER_PESO: i64 = 1_000_000;

// ---------------------------------------------------------------------------
// MoneyError
// ---------------------------------------------------------------------------

/// Errors returned by the wire-boundary conversions when the input is not
/// representable as integer micros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Input was `NaN` or infinite. These values indicate a broken upstream
    /// and must not silently propagate into the `i64` representation.
    NotFinite,
    /// Input would overflow `i64` after scaling by [`MICROS_PER_PESO`].
    OutOfRange,
    /// The decimal string did not parse as a number at all.
    Malformed(String),
}

impl std::fmt::Display for MoneyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoneyError::NotFinite => write!(f, "money: non-finite input (NaN or Inf)"),
            MoneyError::OutOfRange => write!(f, "money: amount out of i64 range after scaling"),
            MoneyError::Malformed(s) => write!(f, "money: malformed decimal '{s}'"),
        }
    }
}

impl std::error::Error for MoneyError {}

// ---------------------------------------------------------------------------
// Money newtype
// ---------------------------------------------------------------------------

/// A fixed-point monetary amount at 1e-6 scale (micros).
///
/// 1 peso = `Money::from_pesos(1)` = 1_000_000 micros.
///
/// Negative values are representable (a debit larger than a balance yields
/// one transiently in arithmetic); domain validation decides where negatives
/// are legal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero monetary amount.
    pub const ZERO: Money = Money(0);

    /// Explicit construction from raw micros.
    pub const fn from_micros(micros: i64) -> Self {
        Money(micros)
    }

    /// Whole-peso construction, used pervasively in tests.
    ///
    /// # Panics (debug only)
    /// Panics on overflow; peso amounts near `i64::MAX / 1e6` are always a
    /// data-quality error.
    pub const fn from_pesos(pesos: i64) -> Self {
        Money(pesos * MICROS_PER_PESO)
    }

    /// Extract the raw micros when crossing a boundary that needs integers.
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Convert a wire decimal (JSON number) into micros.
    ///
    /// # Errors
    /// [`MoneyError::NotFinite`] for NaN/Inf, [`MoneyError::OutOfRange`] for
    /// values that overflow after scaling. Both fire in all build profiles.
    pub fn from_decimal(value: f64) -> Result<Self, MoneyError> {
        if !value.is_finite() {
            return Err(MoneyError::NotFinite);
        }
        let scaled = value * MICROS_PER_PESO as f64;
        // i64::MAX is not exactly representable as f64; compare against the
        // next-lower exactly-representable bound.
        if scaled >= 9_223_372_036_854_775_000.0 || scaled <= -9_223_372_036_854_775_000.0 {
            return Err(MoneyError::OutOfRange);
        }
        Ok(Money(scaled.round() as i64))
    }

    /// Convert a wire decimal string (e.g. `"100.00"`) into micros.
    ///
    /// The backend serializes some amounts as strings and some as numbers;
    /// both funnel through the same range checks.
    pub fn parse_decimal(s: &str) -> Result<Self, MoneyError> {
        let trimmed = s.trim();
        let value: f64 = trimmed
            .parse()
            .map_err(|_| MoneyError::Malformed(trimmed.to_string()))?;
        Self::from_decimal(value)
    }

    /// Serialize to a wire decimal. Serialization boundary only.
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / MICROS_PER_PESO as f64
    }

    /// Multiply a per-unit price by an integer quantity with overflow
    /// detection. Returns `None` on overflow; callers must handle explicitly.
    pub fn checked_mul_qty(self, qty: u32) -> Option<Money> {
        self.0.checked_mul(qty as i64).map(Money)
    }

    /// Clamping addition; never overflows.
    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Clamping subtraction; never overflows.
    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl std::fmt::Display for Money {
    /// Pesos with two decimals, for human-readable rejection reasons.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pesos = self.0 as f64 / MICROS_PER_PESO as f64;
        write!(f, "{pesos:.2}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
