//! # Pricing Calculator
//!
//! Turns a room rate, a stay length and a package into an itemised invoice.
//!
//! ## Calculation Order (fixed)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  nightly rate (local for residents, foreign for everyone else)          │
//! │       │ × nights                                                        │
//! │       ▼                                                                 │
//! │  base_room_price                                                        │
//! │       │ × package multiplier                                            │
//! │       ▼                                                                 │
//! │  adjusted_room_price ──┬── × 10% ──► service_charge                     │
//! │                        └── × 18% ──► vat                                │
//! │                                                                         │
//! │  total_price = adjusted + service_charge + vat   (guest currency)       │
//! │                                                                         │
//! │  total_price_local = total_price × rate   (non-residents)               │
//! │                    = total_price          (residents)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both levies are computed on the adjusted price, never on each other.
//! Nothing here performs I/O: the exchange rate arrives as an input.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, PackageMultiplier};
use crate::types::{Currency, RateQuote, Residency, StayDates};
use crate::{SERVICE_CHARGE, VAT};

/// Everything the calculator needs.
#[derive(Debug, Clone, Copy)]
pub struct PricingInput {
    /// Nightly rate already selected for the guest's residency.
    pub nightly_rate: Money,
    pub nights: u32,
    pub multiplier: PackageMultiplier,
    pub residency: Residency,
    /// Required for non-residents; ignored for residents.
    pub exchange: Option<RateQuote>,
}

/// Itemised stay price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub nights: u32,
    pub base_room_price: Money,
    pub adjusted_room_price: Money,
    pub service_charge: Money,
    pub vat: Money,
    /// In `currency`.
    pub total_price: Money,
    /// Always LKR. This is the amount a reservation records.
    pub total_price_local: Money,
    pub currency: Currency,
    /// `None` for resident invoices.
    pub exchange: Option<RateQuote>,
}

impl Invoice {
    /// True when the local total was derived from the fallback rate.
    pub fn is_rate_estimated(&self) -> bool {
        self.exchange.map(|q| q.is_fallback()).unwrap_or(false)
    }
}

/// Nights between two calendar dates.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use hotelier_core::pricing::nights_between;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
/// assert_eq!(nights_between(d(1), d(4)).unwrap(), 3);
/// assert!(nights_between(d(4), d(4)).is_err());
/// ```
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> CoreResult<u32> {
    StayDates::new(check_in, check_out).nights()
}

/// Computes the invoice for a stay.
///
/// ## Errors
/// - `InvalidStayRange` when `nights` is zero
/// - `MissingExchangeRate` for a non-resident without a rate quote
/// - `AmountOverflow` when any line leaves the `i64` cent range
pub fn compute_invoice(input: &PricingInput) -> CoreResult<Invoice> {
    if input.nights < 1 {
        return Err(CoreError::InvalidStayRange {
            check_in: "-".to_string(),
            check_out: format!("{} nights", input.nights),
        });
    }

    let base_room_price = input
        .nightly_rate
        .multiply_quantity(i64::from(input.nights))
        .ok_or(CoreError::AmountOverflow)?;
    let adjusted_room_price = base_room_price
        .scale_by(input.multiplier)
        .ok_or(CoreError::AmountOverflow)?;
    let service_charge = adjusted_room_price
        .apply_percentage(SERVICE_CHARGE)
        .ok_or(CoreError::AmountOverflow)?;
    let vat = adjusted_room_price
        .apply_percentage(VAT)
        .ok_or(CoreError::AmountOverflow)?;
    let total_price = Money::checked_sum([adjusted_room_price, service_charge, vat])
        .ok_or(CoreError::AmountOverflow)?;

    let (total_price_local, exchange) = match input.residency {
        Residency::Resident => (total_price, None),
        Residency::NonResident => {
            let quote = input.exchange.ok_or(CoreError::MissingExchangeRate)?;
            let local = total_price
                .convert(quote.rate)
                .ok_or(CoreError::AmountOverflow)?;
            (local, Some(quote))
        }
    };

    Ok(Invoice {
        nights: input.nights,
        base_room_price,
        adjusted_room_price,
        service_charge,
        vat,
        total_price,
        total_price_local,
        currency: input.residency.price_currency(),
        exchange,
    })
}

/// Booking-time price of an activity, in LKR.
///
/// Residents pay the local price; everyone else pays the foreign price
/// converted at `exchange`. Settlement deliberately does not use this value
/// (see `settlement`).
pub fn activity_price(
    local_price: Money,
    foreign_price: Money,
    residency: Residency,
    participants: i64,
    exchange: Option<RateQuote>,
) -> CoreResult<Money> {
    let price = match residency {
        Residency::Resident => local_price.multiply_quantity(participants),
        Residency::NonResident => {
            let quote = exchange.ok_or(CoreError::MissingExchangeRate)?;
            foreign_price
                .multiply_quantity(participants)
                .and_then(|foreign| foreign.convert(quote.rate))
        }
    };
    price.ok_or(CoreError::AmountOverflow)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::ExchangeRate;

    fn rate_320() -> RateQuote {
        RateQuote::live(ExchangeRate::from_micros(320_000_000))
    }

    #[test]
    fn test_resident_invoice() {
        let invoice = compute_invoice(&PricingInput {
            nightly_rate: Money::from_major_minor(100, 0),
            nights: 3,
            multiplier: PackageMultiplier::ONE,
            residency: Residency::Resident,
            exchange: None,
        })
        .unwrap();

        assert_eq!(invoice.base_room_price, Money::from_major_minor(300, 0));
        assert_eq!(invoice.adjusted_room_price, Money::from_major_minor(300, 0));
        assert_eq!(invoice.service_charge, Money::from_major_minor(30, 0));
        assert_eq!(invoice.vat, Money::from_major_minor(54, 0));
        assert_eq!(invoice.total_price, Money::from_major_minor(384, 0));
        assert_eq!(invoice.total_price_local, Money::from_major_minor(384, 0));
        assert_eq!(invoice.currency, Currency::Lkr);
        assert!(invoice.exchange.is_none());
        assert!(!invoice.is_rate_estimated());
    }

    #[test]
    fn test_resident_ignores_supplied_rate() {
        let invoice = compute_invoice(&PricingInput {
            nightly_rate: Money::from_major_minor(100, 0),
            nights: 1,
            multiplier: PackageMultiplier::ONE,
            residency: Residency::Resident,
            exchange: Some(rate_320()),
        })
        .unwrap();

        assert_eq!(invoice.total_price_local, invoice.total_price);
        assert!(invoice.exchange.is_none());
    }

    #[test]
    fn test_foreign_conversion() {
        let invoice = compute_invoice(&PricingInput {
            nightly_rate: Money::from_major_minor(100, 0),
            nights: 2,
            multiplier: PackageMultiplier::from_bps(13_000),
            residency: Residency::NonResident,
            exchange: Some(rate_320()),
        })
        .unwrap();

        assert_eq!(invoice.base_room_price, Money::from_major_minor(200, 0));
        assert_eq!(invoice.adjusted_room_price, Money::from_major_minor(260, 0));
        assert_eq!(invoice.service_charge, Money::from_major_minor(26, 0));
        assert_eq!(invoice.vat, Money::from_major_minor(46, 80));
        assert_eq!(invoice.total_price, Money::from_major_minor(332, 80));
        assert_eq!(invoice.total_price_local, Money::from_major_minor(106_496, 0));
        assert_eq!(invoice.currency, Currency::Usd);
    }

    #[test]
    fn test_fallback_rate_is_disclosed() {
        let invoice = compute_invoice(&PricingInput {
            nightly_rate: Money::from_major_minor(100, 0),
            nights: 1,
            multiplier: PackageMultiplier::ONE,
            residency: Residency::NonResident,
            exchange: Some(RateQuote::fallback()),
        })
        .unwrap();

        assert!(invoice.is_rate_estimated());
        assert_eq!(invoice.exchange.unwrap().rate.micros(), 320_000_000);
    }

    #[test]
    fn test_non_resident_requires_rate() {
        let result = compute_invoice(&PricingInput {
            nightly_rate: Money::from_major_minor(100, 0),
            nights: 1,
            multiplier: PackageMultiplier::ONE,
            residency: Residency::NonResident,
            exchange: None,
        });
        assert!(matches!(result, Err(CoreError::MissingExchangeRate)));
    }

    #[test]
    fn test_zero_nights_rejected() {
        let result = compute_invoice(&PricingInput {
            nightly_rate: Money::from_major_minor(100, 0),
            nights: 0,
            multiplier: PackageMultiplier::ONE,
            residency: Residency::Resident,
            exchange: None,
        });
        assert!(matches!(result, Err(CoreError::InvalidStayRange { .. })));
    }

    #[test]
    fn test_deterministic() {
        let input = PricingInput {
            nightly_rate: Money::from_cents(12_345),
            nights: 7,
            multiplier: PackageMultiplier::from_bps(11_500),
            residency: Residency::NonResident,
            exchange: Some(RateQuote::live(ExchangeRate::from_micros(301_250_000))),
        };
        assert_eq!(compute_invoice(&input).unwrap(), compute_invoice(&input).unwrap());
    }

    #[test]
    fn test_activity_price() {
        let local = Money::from_major_minor(3_000, 0);
        let foreign = Money::from_major_minor(15, 0);

        let resident = activity_price(local, foreign, Residency::Resident, 2, None).unwrap();
        assert_eq!(resident, Money::from_major_minor(6_000, 0));

        let visitor =
            activity_price(local, foreign, Residency::NonResident, 2, Some(rate_320())).unwrap();
        assert_eq!(visitor, Money::from_major_minor(9_600, 0));

        assert!(activity_price(local, foreign, Residency::NonResident, 1, None).is_err());
    }

    #[test]
    fn test_activity_price_overflow() {
        let price = Money::from_major_minor(40, 0);
        let huge = i64::MAX / 10;

        let resident = activity_price(price, price, Residency::Resident, huge, None);
        assert!(matches!(resident, Err(CoreError::AmountOverflow)));

        let visitor = activity_price(price, price, Residency::NonResident, huge, Some(rate_320()));
        assert!(matches!(visitor, Err(CoreError::AmountOverflow)));
    }

    #[test]
    fn test_invoice_overflow_is_an_error() {
        let result = compute_invoice(&PricingInput {
            nightly_rate: Money::from_cents(i64::MAX / 2),
            nights: 3,
            multiplier: PackageMultiplier::ONE,
            residency: Residency::Resident,
            exchange: None,
        });
        assert!(matches!(result, Err(CoreError::AmountOverflow)));

        // Fits in USD, overflows once converted to LKR.
        let result = compute_invoice(&PricingInput {
            nightly_rate: Money::from_cents(i64::MAX / 400),
            nights: 1,
            multiplier: PackageMultiplier::ONE,
            residency: Residency::NonResident,
            exchange: Some(rate_320()),
        });
        assert!(matches!(result, Err(CoreError::AmountOverflow)));
    }
}
