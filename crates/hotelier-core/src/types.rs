//! # Domain Types
//!
//! Core domain types used throughout the reservation engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Room       │   │   Reservation   │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  room_number    │◄──│  room_id        │◄──│  reservation_id │       │
//! │  │  local price    │   │  customer_id    │   │  method         │       │
//! │  │  foreign price  │   │  status         │   │  source         │       │
//! │  └─────────────────┘   │  total_amount   │   │  amount_cents   │       │
//! │                        └────────┬────────┘   └─────────────────┘       │
//! │                                 │                                       │
//! │                  ┌──────────────┴──────────────┐                        │
//! │          ┌───────┴─────────┐         ┌─────────┴───────────┐           │
//! │          │  ExtraCharge    │         │ ReservationActivity │           │
//! │          │  amount_cents   │         │ participants, date  │           │
//! │          └─────────────────┘         └─────────────────────┘           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (`room_number`) - human-readable

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{ExchangeRate, Money, PackageMultiplier};
use crate::{FALLBACK_EXCHANGE_RATE, RESIDENT_COUNTRY};

// =============================================================================
// Currency & Residency
// =============================================================================

/// Currencies the engine prices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Sri Lankan rupee - the local, persisted currency.
    Lkr,
    /// US dollar - the foreign price list currency.
    Usd,
}

impl Currency {
    /// ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Lkr => "LKR",
            Currency::Usd => "USD",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Guest classification that selects the room rate and price currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Residency {
    /// Billed at the local price, in LKR.
    Resident,
    /// Billed at the foreign price, in USD, converted for storage.
    NonResident,
}

impl Residency {
    /// Classifies a guest by country of residence.
    ///
    /// ## Example
    /// ```rust
    /// use hotelier_core::types::Residency;
    ///
    /// assert_eq!(Residency::from_country("Sri Lanka"), Residency::Resident);
    /// assert_eq!(Residency::from_country(" sri lanka "), Residency::Resident);
    /// assert_eq!(Residency::from_country("India"), Residency::NonResident);
    /// ```
    pub fn from_country(country: &str) -> Self {
        if country.trim().eq_ignore_ascii_case(RESIDENT_COUNTRY) {
            Residency::Resident
        } else {
            Residency::NonResident
        }
    }

    /// Returns true for residents.
    #[inline]
    pub fn is_resident(&self) -> bool {
        matches!(self, Residency::Resident)
    }

    /// Currency the guest is quoted in.
    pub fn price_currency(&self) -> Currency {
        match self {
            Residency::Resident => Currency::Lkr,
            Residency::NonResident => Currency::Usd,
        }
    }
}

// =============================================================================
// Exchange Rate Quote
// =============================================================================

/// Where an exchange rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Fetched from the provider for this request.
    Live,
    /// Provider unavailable; the fixed fallback rate was substituted.
    Fallback,
}

/// An exchange rate together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
    pub base: Currency,
    pub quote: Currency,
    pub rate: ExchangeRate,
    pub source: RateSource,
}

impl RateQuote {
    /// Currency of the foreign price list.
    pub const BASE: Currency = Currency::Usd;
    /// Currency every total is recorded in.
    pub const QUOTE: Currency = Currency::Lkr;

    /// A live USD→LKR quote.
    pub fn live(rate: ExchangeRate) -> Self {
        RateQuote {
            base: Self::BASE,
            quote: Self::QUOTE,
            rate,
            source: RateSource::Live,
        }
    }

    /// The fixed USD→LKR fallback quote.
    pub fn fallback() -> Self {
        Self::fallback_with(FALLBACK_EXCHANGE_RATE)
    }

    /// A fallback quote with a configured rate.
    pub fn fallback_with(rate: ExchangeRate) -> Self {
        RateQuote {
            base: Self::BASE,
            quote: Self::QUOTE,
            rate,
            source: RateSource::Fallback,
        }
    }

    /// True when the rate is an estimate and must be disclosed as such.
    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.source == RateSource::Fallback
    }
}

// =============================================================================
// Catalog: Room Type & Package Type
// =============================================================================

/// Room category shown alongside available rooms.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RoomType {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_ref: Option<String>,
}

/// Meal plan / board package with its price multiplier.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PackageType {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_ref: Option<String>,
    /// Multiplier in basis points (13_000 = ×1.30).
    pub multiplier_bps: i64,
}

impl PackageType {
    /// Returns the package multiplier.
    #[inline]
    pub fn multiplier(&self) -> PackageMultiplier {
        PackageMultiplier::from_bps(self.multiplier_bps as u32)
    }
}

// =============================================================================
// Room
// =============================================================================

/// A bookable room.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Room {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Room number - the external business key ("101", "A-12").
    pub room_number: String,

    pub room_type_id: String,

    /// Nightly price for residents, LKR cents.
    pub local_price_cents: i64,

    /// Nightly price for non-residents, USD cents.
    pub foreign_price_cents: i64,

    pub max_occupancy: i64,

    pub description: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Returns both nightly rates.
    pub fn rates(&self) -> RoomRates {
        RoomRates {
            local: Money::from_cents(self.local_price_cents),
            foreign: Money::from_cents(self.foreign_price_cents),
        }
    }

    /// Checks whether a party fits in the room.
    pub fn fits(&self, adults: i64, children: i64) -> bool {
        adults + children <= self.max_occupancy
    }
}

/// The two nightly price lists of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomRates {
    pub local: Money,
    pub foreign: Money,
}

impl RoomRates {
    /// Selects the nightly rate that applies to the guest.
    #[inline]
    pub fn nightly_rate(&self, residency: Residency) -> Money {
        match residency {
            Residency::Resident => self.local,
            Residency::NonResident => self.foreign,
        }
    }
}

/// A room returned by the availability search, joined with its type.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AvailableRoom {
    pub id: String,
    pub room_number: String,
    pub room_type_id: String,
    pub type_name: String,
    pub type_description: Option<String>,
    pub type_image_ref: Option<String>,
    pub local_price_cents: i64,
    pub foreign_price_cents: i64,
    pub max_occupancy: i64,
    pub description: Option<String>,
}

// =============================================================================
// Customer
// =============================================================================

/// Guest record, created fresh for every reservation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    /// Residents identify with a national ID card.
    pub national_id: Option<String>,
    /// Non-residents identify with a passport.
    pub passport_number: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Guest residency derived from country.
    #[inline]
    pub fn residency(&self) -> Residency {
        Residency::from_country(&self.country)
    }

    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Stay Dates
// =============================================================================

/// A half-open calendar range `[check_in, check_out)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StayDates {
    #[ts(as = "String")]
    pub check_in: NaiveDate,
    #[ts(as = "String")]
    pub check_out: NaiveDate,
}

impl StayDates {
    /// Creates a stay without validating it.
    pub const fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        StayDates {
            check_in,
            check_out,
        }
    }

    /// Number of nights; fails when the range covers less than one night.
    pub fn nights(&self) -> CoreResult<u32> {
        let days = (self.check_out - self.check_in).num_days();
        if days < 1 {
            return Err(CoreError::InvalidStayRange {
                check_in: self.check_in.to_string(),
                check_out: self.check_out.to_string(),
            });
        }
        Ok(days as u32)
    }

    /// Strict overlap: back-to-back stays (one's check-out equals the
    /// other's check-in) do not conflict.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use hotelier_core::types::StayDates;
    ///
    /// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
    /// let existing = StayDates::new(d(10), d(15));
    ///
    /// assert!(!existing.overlaps(&StayDates::new(d(15), d(18))));
    /// assert!(existing.overlaps(&StayDates::new(d(12), d(20))));
    /// ```
    #[inline]
    pub fn overlaps(&self, other: &StayDates) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }

    /// Whether `date` falls within `[check_in, check_out]` (both inclusive).
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.check_in && date <= self.check_out
    }
}

// =============================================================================
// Reservation Status
// =============================================================================

/// The lifecycle state of a reservation.
///
/// ```text
///   create ──► Confirmed ──checkout──► Completed
///                  │
///                  └────cancel─────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Booked; the room is held for the stay.
    Confirmed,
    /// Settled at checkout.
    Completed,
    /// Released without settlement.
    Cancelled,
}

impl ReservationStatus {
    /// Lower-case name as stored in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Reservation
// =============================================================================

/// A room booking.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Reservation {
    pub id: String,
    pub customer_id: String,
    pub room_id: String,
    pub package_id: String,
    #[ts(as = "String")]
    pub check_in: NaiveDate,
    #[ts(as = "String")]
    pub check_out: NaiveDate,
    /// Booking-time total in LKR cents. Never recomputed after creation.
    pub total_amount_cents: i64,
    pub adults: i64,
    pub children: i64,
    /// Informational only; never used in range comparisons.
    #[ts(as = "Option<String>")]
    pub arrival_time: Option<NaiveTime>,
    #[ts(as = "Option<String>")]
    pub departure_time: Option<NaiveTime>,
    pub special_requests: Option<String>,
    pub status: ReservationStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Returns the recorded total as Money.
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    /// Returns the stay range.
    #[inline]
    pub fn stay(&self) -> StayDates {
        StayDates::new(self.check_in, self.check_out)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// How a payment was tendered.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    /// Charged by the web booking flow.
    Online,
}

impl std::str::FromStr for PaymentMethod {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "online" => Ok(PaymentMethod::Online),
            other => Err(crate::error::ValidationError::InvalidFormat {
                field: "payment_method".to_string(),
                reason: format!("unknown method '{}'", other),
            }),
        }
    }
}

/// Where a payment was taken.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSource {
    Reception,
    Web,
    Restaurant,
}

/// A payment row. Reservations accumulate at most a web prepayment and a
/// reception settlement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    /// LKR cents.
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub reservation_id: Option<String>,
    /// Restaurant order reference (payments taken by the restaurant).
    pub order_id: Option<String>,
    pub source: PaymentSource,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Payments that pre-pay the room charge.
    #[inline]
    pub fn is_online_prepayment(&self) -> bool {
        self.method == PaymentMethod::Online || self.source == PaymentSource::Web
    }
}

// =============================================================================
// Charges accrued during a stay
// =============================================================================

/// An ad-hoc charge (minibar, laundry, damage).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ExtraCharge {
    pub id: String,
    pub reservation_id: String,
    pub description: String,
    /// LKR cents, never negative.
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ExtraCharge {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Bookable activity (excursion, spa session) with two price lists.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Activity {
    pub id: String,
    pub name: String,
    /// Per participant, LKR cents.
    pub local_price_cents: i64,
    /// Per participant, USD cents.
    pub foreign_price_cents: i64,
}

/// An activity scheduled for a reservation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ReservationActivity {
    pub id: String,
    pub reservation_id: String,
    pub activity_id: String,
    #[ts(as = "String")]
    pub scheduled_date: NaiveDate,
    pub participants: i64,
    /// Booking-time price in LKR cents (residency-aware).
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Notification Outbox
// =============================================================================

/// Kinds of outbound notification.
pub const NOTIFICATION_RESERVATION_CONFIRMED: &str = "RESERVATION_CONFIRMED";

/// An entry in the notification outbox.
/// Written in the booking transaction, delivered after commit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct NotificationOutboxEntry {
    pub id: String,
    /// e.g. `RESERVATION_CONFIRMED`.
    pub kind: String,
    pub reservation_id: String,
    /// JSON payload handed to the notifier.
    pub payload: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub attempted_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Details sent to the guest once a booking commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReservationConfirmation {
    pub reservation_id: String,
    pub guest_name: String,
    pub email: String,
    pub room_number: String,
    pub package_name: String,
    #[ts(as = "String")]
    pub check_in: NaiveDate,
    #[ts(as = "String")]
    pub check_out: NaiveDate,
    /// LKR cents.
    pub total_amount_cents: i64,
    /// Paid online at booking time.
    pub prepaid: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_residency_from_country() {
        assert_eq!(Residency::from_country("Sri Lanka"), Residency::Resident);
        assert_eq!(Residency::from_country("SRI LANKA"), Residency::Resident);
        assert_eq!(Residency::from_country("Germany"), Residency::NonResident);
        assert_eq!(Residency::from_country(""), Residency::NonResident);
    }

    #[test]
    fn test_nightly_rate_selection() {
        let rates = RoomRates {
            local: Money::from_cents(25_000_00),
            foreign: Money::from_cents(100_00),
        };
        assert_eq!(rates.nightly_rate(Residency::Resident).cents(), 25_000_00);
        assert_eq!(rates.nightly_rate(Residency::NonResident).cents(), 100_00);
    }

    #[test]
    fn test_stay_nights() {
        assert_eq!(StayDates::new(d(10), d(13)).nights().unwrap(), 3);
        assert!(StayDates::new(d(10), d(10)).nights().is_err());
        assert!(StayDates::new(d(10), d(9)).nights().is_err());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let existing = StayDates::new(d(10), d(15));

        assert!(!existing.overlaps(&StayDates::new(d(15), d(18))));
        assert!(!existing.overlaps(&StayDates::new(d(5), d(10))));
        assert!(existing.overlaps(&StayDates::new(d(12), d(20))));
        assert!(existing.overlaps(&StayDates::new(d(9), d(11))));
        assert!(existing.overlaps(&StayDates::new(d(11), d(12))));
        assert!(existing.overlaps(&StayDates::new(d(1), d(30))));
    }

    #[test]
    fn test_stay_contains_is_inclusive() {
        let stay = StayDates::new(d(10), d(15));
        assert!(stay.contains(d(10)));
        assert!(stay.contains(d(15)));
        assert!(!stay.contains(d(9)));
        assert!(!stay.contains(d(16)));
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("Card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert!("cheque".parse::<PaymentMethod>().is_err());
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }

    #[test]
    fn test_fallback_quote() {
        let quote = RateQuote::fallback();
        assert!(quote.is_fallback());
        assert_eq!(quote.rate.micros(), 320_000_000);
        assert!(!RateQuote::live(quote.rate).is_fallback());
    }
}
