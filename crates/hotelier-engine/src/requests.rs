//! Typed requests and responses for the engine operations.
//!
//! Every request is validated at the boundary before anything is written.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use hotelier_core::validation::validate_guest_counts;
use hotelier_core::{
    CoreError, CoreResult, Invoice, Money, Payment, PaymentMethod, ReservationActivity, Residency,
    SettlementBreakdown, StayDates, ValidationError,
};
use hotelier_db::{NewCustomer, NewReservation};

// =============================================================================
// Quote
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub room_number: String,
    pub package_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    /// Guest's country of residence; selects the rate and currency.
    pub country: String,
}

impl QuoteRequest {
    pub fn stay(&self) -> StayDates {
        StayDates::new(self.check_in, self.check_out)
    }
}

/// A priced stay. `rate_estimated` is set when the fallback rate was used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayQuote {
    pub room_number: String,
    pub package_id: String,
    pub package_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub residency: Residency,
    pub invoice: Invoice,
    pub rate_estimated: bool,
}

// =============================================================================
// Booking
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
}

impl GuestDetails {
    pub fn residency(&self) -> Residency {
        Residency::from_country(&self.country)
    }
}

impl From<GuestDetails> for NewCustomer {
    fn from(guest: GuestDetails) -> Self {
        NewCustomer {
            first_name: guest.first_name,
            last_name: guest.last_name,
            email: guest.email,
            phone: guest.phone,
            country: guest.country,
            national_id: guest.national_id,
            passport_number: guest.passport_number,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayDetails {
    pub room_number: String,
    pub package_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: i64,
    #[serde(default)]
    pub children: i64,
    #[serde(default)]
    pub arrival_time: Option<NaiveTime>,
    #[serde(default)]
    pub departure_time: Option<NaiveTime>,
    #[serde(default)]
    pub special_requests: Option<String>,
}

impl StayDetails {
    pub fn stay(&self) -> StayDates {
        StayDates::new(self.check_in, self.check_out)
    }

    /// The quote request for this stay and a guest from `country`.
    pub fn quote_request(&self, country: &str) -> QuoteRequest {
        QuoteRequest {
            room_number: self.room_number.clone(),
            package_id: self.package_id.clone(),
            check_in: self.check_in,
            check_out: self.check_out,
            country: country.to_string(),
        }
    }
}

/// A booking of a stay the guest was already quoted for.
///
/// `quote` is the [`StayQuote`] the guest accepted. Its local total is
/// recorded as-is; booking never prices the stay again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub guest: GuestDetails,
    pub stay: StayDetails,
    pub quote: StayQuote,
}

impl BookingRequest {
    /// Checks everything that can be checked without the database.
    ///
    /// The accepted quote must have been issued for the same room, package,
    /// dates and residency as the booking.
    pub fn validate(&self) -> CoreResult<()> {
        let customer = NewCustomer::from(self.guest.clone());
        customer.validate().map_err(CoreError::from)?;
        validate_guest_counts(self.stay.adults, self.stay.children)?;
        self.stay.stay().nights()?;

        let quote = &self.quote;
        let matches = quote.room_number == self.stay.room_number.trim()
            && quote.package_id == self.stay.package_id
            && quote.check_in == self.stay.check_in
            && quote.check_out == self.stay.check_out
            && quote.residency == self.guest.residency();
        if !matches {
            return Err(ValidationError::InvalidFormat {
                field: "quote".to_string(),
                reason: "was issued for a different stay or guest".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Local total of the accepted quote.
    pub fn quoted_total(&self) -> Money {
        self.quote.invoice.total_price_local
    }

    /// The insert, priced at the accepted quote's local total.
    pub fn into_new_reservation(self, online_prepayment: bool) -> NewReservation {
        let stay = self.stay.stay();
        let total_amount = self.quoted_total();
        NewReservation {
            customer: self.guest.into(),
            room_number: self.stay.room_number,
            package_id: self.stay.package_id,
            stay,
            total_amount,
            adults: self.stay.adults,
            children: self.stay.children,
            arrival_time: self.stay.arrival_time,
            departure_time: self.stay.departure_time,
            special_requests: self.stay.special_requests,
            online_prepayment,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub reservation_id: String,
    pub room_number: String,
    pub package_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    /// Recorded total, LKR.
    pub total_amount: Money,
    pub invoice: Invoice,
    pub rate_estimated: bool,
    /// Online prepayment taken by the web flow.
    pub prepayment: Option<Payment>,
}

// =============================================================================
// Checkout & charges
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub reservation_id: String,
    pub method: PaymentMethod,
    pub breakdown: SettlementBreakdown,
    pub payment: Option<Payment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraChargeRequest {
    pub reservation_id: String,
    pub description: String,
    /// LKR.
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBookingRequest {
    pub reservation_id: String,
    pub activity_id: String,
    pub scheduled_date: NaiveDate,
    pub participants: i64,
}

/// A booked activity with the rate it was priced at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBooking {
    pub activity: ReservationActivity,
    pub rate_estimated: bool,
}
