//! # Money Module
//!
//! Integer-cent money for every price, line total and cart total.
//!
//! ## Why Integer Cents?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart totals are re-summed after EVERY mutation.                        │
//! │                                                                         │
//! │  With floats, re-summing drifts:                                        │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  With i64 cents, `subtotal == Σ line totals` holds exactly, so the     │
//! │  cart invariant is checkable with `==` in tests and at runtime.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use menu_core::money::Money;
//!
//! let burger = Money::from_cents(1050);   // $10.50
//! let two = burger * 2;                   // $21.00
//! let with_fries = two + Money::from_cents(350);
//! assert_eq!(with_fries.cents(), 2450);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the smallest currency unit.
///
/// Serialized as a bare integer (`1050`, not `{"0":1050}`), which is the
/// shape the UI and the persisted cart snapshot both use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use menu_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Whole currency units (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Fractional part in cents, always 0-99.
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Calculates tax on this amount, rounding half away from zero.
    ///
    /// `(amount × bps + 5000) / 10000`, computed in i128 so large carts
    /// cannot overflow.
    ///
    /// ```rust
    /// use menu_core::money::Money;
    /// use menu_core::types::TaxRate;
    ///
    /// // $31.25 at 16% = $5.00
    /// let tax = Money::from_cents(3125).calculate_tax(TaxRate::from_bps(1600));
    /// assert_eq!(tax.cents(), 500);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let raw = self.0 as i128 * rate.bps() as i128;
        let rounded = if raw >= 0 {
            (raw + 5000) / 10000
        } else {
            (raw - 5000) / 10000
        };
        Money(rounded as i64)
    }

    /// Rescales a line total from `from_qty` units to `to_qty` units.
    ///
    /// The per-unit rate is taken from the total itself
    /// (`total / from_qty × to_qty`), so any option surcharge already baked
    /// into the total scales with it. Returns `None` when `from_qty` is not
    /// positive: there is no per-unit rate to derive.
    ///
    /// ```rust
    /// use menu_core::money::Money;
    ///
    /// let line = Money::from_cents(3000); // 3 × $10.00
    /// assert_eq!(line.rescale(3, 5), Some(Money::from_cents(5000)));
    /// assert_eq!(line.rescale(0, 5), None);
    /// ```
    pub fn rescale(&self, from_qty: i64, to_qty: i64) -> Option<Money> {
        if from_qty <= 0 {
            return None;
        }
        let numerator = self.0 as i128 * to_qty as i128;
        let denominator = from_qty as i128;
        // Round half away from zero, same as tax.
        let half = denominator / 2;
        let scaled = if numerator >= 0 {
            (numerator + half) / denominator
        } else {
            (numerator - half) / denominator
        };
        Some(Money(scaled as i64))
    }

    /// Clamps this amount into `[min, max]`.
    pub fn clamp_between(self, min: Money, max: Money) -> Money {
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering. The UI formats for its own locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.minor())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
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
