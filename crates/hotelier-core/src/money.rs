//! # Money Module
//!
//! Provides the `Money` type and the fixed-point factors that scale it.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    260.0 × 0.18 = 46.800000000000004  ❌                                │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units + fixed-point factors                │
//! │    26_000 cents × 1_800 bps / 10_000 = 4_680 cents  ✅                  │
//! │                                                                         │
//! │  Factor types:                                                          │
//! │    Percentage         bps      1_000       = 10%                        │
//! │    PackageMultiplier  bps      13_000      = ×1.30                      │
//! │    ExchangeRate       micros   320_000_000 = 320.0 LKR per USD          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation that can leave the `i64` range is checked and returns
//! `Option`; there are no operator impls that could wrap silently.
//!
//! ## Usage
//! ```rust
//! use hotelier_core::money::{ExchangeRate, Money, PackageMultiplier, Percentage};
//!
//! let room = Money::from_major_minor(200, 0);
//! let adjusted = room.scale_by(PackageMultiplier::from_bps(13_000)).unwrap();
//! assert_eq!(adjusted.cents(), 26_000);
//!
//! let vat = adjusted.apply_percentage(Percentage::from_bps(1_800)).unwrap();
//! assert_eq!(vat.cents(), 4_680);
//!
//! let local = Money::from_cents(33_280).convert(ExchangeRate::from_micros(320_000_000)).unwrap();
//! assert_eq!(local.cents(), 10_649_600);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::types::Currency;

/// Basis points in one whole (100%).
const BPS_SCALE: i128 = 10_000;

/// Micro-units in one whole exchange-rate unit.
const MICROS_SCALE: i128 = 1_000_000;

/// Narrows a widened product back to cents.
fn narrow(cents: i128) -> Option<Money> {
    i64::try_from(cents).ok().map(Money)
}

/// Integer division rounding half away from zero.
fn div_round(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// The type carries no currency: everything persisted is local currency, and
/// invoices pair amounts with an explicit [`Currency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use hotelier_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -5.50, not -4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
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

    /// Applies a percentage (service charge, VAT) and returns the levy.
    ///
    /// Rounds half away from zero on the integer product. `None` when the
    /// result does not fit in cents.
    ///
    /// ## Example
    /// ```rust
    /// use hotelier_core::money::{Money, Percentage};
    ///
    /// let adjusted = Money::from_cents(30_000);
    /// let service = adjusted.apply_percentage(Percentage::from_bps(1_000)).unwrap();
    /// assert_eq!(service.cents(), 3_000);
    /// ```
    pub fn apply_percentage(&self, rate: Percentage) -> Option<Money> {
        narrow(div_round(self.0 as i128 * rate.bps() as i128, BPS_SCALE))
    }

    /// Scales the amount by a package multiplier.
    pub fn scale_by(&self, multiplier: PackageMultiplier) -> Option<Money> {
        narrow(div_round(self.0 as i128 * multiplier.bps() as i128, BPS_SCALE))
    }

    /// Converts the amount into the quote currency of `rate`.
    ///
    /// ## Example
    /// ```rust
    /// use hotelier_core::money::{ExchangeRate, Money};
    ///
    /// let usd = Money::from_major_minor(10, 0);
    /// let lkr = usd.convert(ExchangeRate::from_micros(299_500_000)).unwrap();
    /// assert_eq!(lkr.cents(), 299_500);
    ///
    /// assert!(Money::from_cents(i64::MAX).convert(ExchangeRate::from_micros(2_000_000)).is_none());
    /// ```
    pub fn convert(&self, rate: ExchangeRate) -> Option<Money> {
        narrow(div_round(self.0 as i128 * rate.micros() as i128, MICROS_SCALE))
    }

    /// Multiplies money by a count (nights, participants).
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }

    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Sums amounts, stopping at the first overflow.
    ///
    /// ## Example
    /// ```rust
    /// use hotelier_core::money::Money;
    ///
    /// let lines = [Money::from_cents(2_000), Money::from_cents(500)];
    /// assert_eq!(Money::checked_sum(lines), Some(Money::from_cents(2_500)));
    /// assert_eq!(Money::checked_sum([Money::from_cents(i64::MAX), Money::from_cents(1)]), None);
    /// ```
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Formats the amount with a currency code prefix, e.g. `LKR 106496.00`.
    pub fn display_in(&self, currency: Currency) -> String {
        format!("{} {}", currency.code(), self)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering without a currency marker.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Percentage
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1800 bps = 18%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Returns the value in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the value as a percentage (for display only).
    #[inline]
    pub fn as_percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Package Multiplier
// =============================================================================

/// Meal-plan factor applied to the base room price, in basis points.
///
/// `10_000` is room-only (×1.00); `13_000` is full board (×1.30).
/// Values below ×1.00 are rejected by [`crate::validation::validate_multiplier_bps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PackageMultiplier(u32);

impl PackageMultiplier {
    /// Room only.
    pub const ONE: PackageMultiplier = PackageMultiplier(10_000);

    /// Creates a multiplier from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        PackageMultiplier(bps)
    }

    /// Creates a multiplier from a decimal factor (1.3 → 13_000 bps).
    pub fn from_factor(factor: f64) -> Self {
        PackageMultiplier((factor * 10_000.0).round() as u32)
    }

    /// Returns the multiplier in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the multiplier as a decimal factor (for display only).
    #[inline]
    pub fn factor(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }
}

impl Default for PackageMultiplier {
    fn default() -> Self {
        PackageMultiplier::ONE
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// Units of quote currency per one unit of base currency, in micro-units.
///
/// Six decimal places covers every published LKR/USD rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExchangeRate(i64);

impl ExchangeRate {
    /// Creates a rate from micro-units.
    #[inline]
    pub const fn from_micros(micros: i64) -> Self {
        ExchangeRate(micros)
    }

    /// Creates a rate from a provider-supplied decimal.
    ///
    /// Returns `None` for NaN, infinities, zero and negative values, so a
    /// malformed provider payload can never produce a zero-priced stay.
    pub fn from_f64(rate: f64) -> Option<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return None;
        }
        let micros = (rate * MICROS_SCALE as f64).round();
        if micros < 1.0 || micros > i64::MAX as f64 {
            return None;
        }
        Some(ExchangeRate(micros as i64))
    }

    /// Returns the rate in micro-units.
    #[inline]
    pub const fn micros(&self) -> i64 {
        self.0
    }

    /// Returns the rate as a decimal (for display only).
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / MICROS_SCALE as f64
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.0 / 1_000_000, self.0 % 1_000_000)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
