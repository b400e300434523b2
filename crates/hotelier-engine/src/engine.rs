//! # Reservation Engine
//!
//! The operations the front desk and the web booking flow call.
//!
//! ## Booking Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  find_available_rooms(check_in, check_out)        advisory read         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  quote_stay(request)                                                    │
//! │        │  room + package lookup                                         │
//! │        │  non-resident? ──► RateConverter::get_rate() (live | fallback) │
//! │        │  compute_invoice                                               │
//! │        ▼                                                                │
//! │  create_reservation / create_web_reservation (request carries quote)    │
//! │        │  one transaction: customer, reservation, [prepayment], outbox  │
//! │        │  overlap trigger ──► Conflict (re-search)                      │
//! │        ▼                                                                │
//! │  dispatcher.wake()                 confirmation delivered after commit  │
//! │                                                                         │
//! │  ... stay: add_extra_charge, book_activity ...                          │
//! │                                                                         │
//! │  complete_checkout(id, method)     one transaction, guarded by status   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine keeps no state between calls besides its handles. Every quote
//! re-reads the catalog and re-queries the rate provider; a booking records
//! the total of the quote the guest accepted and queries nothing.

use chrono::NaiveDate;
use tracing::{debug, info};

use hotelier_core::validation::validate_stay;
use hotelier_core::{
    compute_invoice, AvailableRoom, CoreError, ExtraCharge, PaymentMethod, PricingInput, Residency,
    StayDates,
};
use hotelier_db::Database;

use crate::dispatcher::DispatcherHandle;
use crate::error::EngineResult;
use crate::rates::RateConverter;
use crate::requests::{
    ActivityBooking, ActivityBookingRequest, BookingConfirmation, BookingRequest, CheckoutReceipt,
    ExtraChargeRequest, QuoteRequest, StayQuote,
};

/// Entry point for every reservation and settlement operation.
#[derive(Debug, Clone)]
pub struct ReservationEngine {
    db: Database,
    rates: RateConverter,
    dispatcher: Option<DispatcherHandle>,
}

impl ReservationEngine {
    pub fn new(db: Database, rates: RateConverter) -> Self {
        ReservationEngine {
            db,
            rates,
            dispatcher: None,
        }
    }

    /// Wakes `dispatcher` after every committed booking.
    pub fn with_dispatcher(mut self, dispatcher: DispatcherHandle) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Availability & pricing
    // =========================================================================

    /// Rooms with no confirmed reservation overlapping the range.
    pub async fn find_available_rooms(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> EngineResult<Vec<AvailableRoom>> {
        let stay = StayDates::new(check_in, check_out);
        stay.nights()?;
        validate_stay(&stay).map_err(CoreError::from)?;

        let rooms = self.db.rooms().find_available(&stay).await?;
        debug!(%check_in, %check_out, available = rooms.len(), "Availability search");
        Ok(rooms)
    }

    /// Prices a stay for a guest from `request.country`.
    ///
    /// Only non-resident quotes call the rate provider. A provider failure
    /// yields a quote with `rate_estimated` set, never an error.
    pub async fn quote_stay(&self, request: &QuoteRequest) -> EngineResult<StayQuote> {
        let stay = request.stay();
        let nights = stay.nights()?;
        validate_stay(&stay).map_err(CoreError::from)?;

        let room = self
            .db
            .rooms()
            .get_by_number(request.room_number.trim())
            .await?
            .ok_or_else(|| CoreError::RoomNotFound(request.room_number.trim().to_string()))?;

        let package = self
            .db
            .catalog()
            .get_package_type(&request.package_id)
            .await?
            .ok_or_else(|| CoreError::PackageNotFound(request.package_id.clone()))?;

        let residency = Residency::from_country(&request.country);
        let exchange = match residency {
            Residency::Resident => None,
            Residency::NonResident => Some(self.rates.get_rate().await),
        };

        let invoice = compute_invoice(&PricingInput {
            nightly_rate: room.rates().nightly_rate(residency),
            nights,
            multiplier: package.multiplier(),
            residency,
            exchange,
        })?;

        Ok(StayQuote {
            room_number: room.room_number,
            package_id: package.id,
            package_name: package.name,
            check_in: stay.check_in,
            check_out: stay.check_out,
            residency,
            rate_estimated: invoice.is_rate_estimated(),
            invoice,
        })
    }

    // =========================================================================
    // Booking
    // =========================================================================

    /// Front-desk booking, paid at checkout.
    ///
    /// The recorded total is the accepted quote's local total, unchanged.
    pub async fn create_reservation(&self, request: BookingRequest) -> EngineResult<BookingConfirmation> {
        self.book(request, false).await
    }

    /// Web booking: the quoted total is charged online up front.
    pub async fn create_web_reservation(
        &self,
        request: BookingRequest,
    ) -> EngineResult<BookingConfirmation> {
        self.book(request, true).await
    }

    async fn book(&self, request: BookingRequest, online: bool) -> EngineResult<BookingConfirmation> {
        request.validate()?;

        let quote = request.quote.clone();
        let total_amount = request.quoted_total();

        let new = request.into_new_reservation(online);
        let created = self.db.reservations().create(&new).await?;

        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.wake();
        }

        info!(
            reservation_id = %created.reservation.id,
            room_number = %created.room_number,
            online,
            rate_estimated = quote.rate_estimated,
            "Booking committed"
        );

        Ok(BookingConfirmation {
            reservation_id: created.reservation.id,
            room_number: created.room_number,
            package_name: created.package_name,
            check_in: created.reservation.check_in,
            check_out: created.reservation.check_out,
            total_amount,
            invoice: quote.invoice,
            rate_estimated: quote.rate_estimated,
            prepayment: created.prepayment,
        })
    }

    /// Releases a confirmed reservation's room.
    pub async fn cancel_reservation(&self, reservation_id: &str) -> EngineResult<()> {
        self.db.reservations().cancel(reservation_id).await?;
        Ok(())
    }

    // =========================================================================
    // During the stay
    // =========================================================================

    pub async fn add_extra_charge(&self, request: &ExtraChargeRequest) -> EngineResult<ExtraCharge> {
        let charge = self
            .db
            .charges()
            .add_extra_charge(&request.reservation_id, &request.description, request.amount)
            .await?;
        Ok(charge)
    }

    /// Schedules an activity, priced by the guest's residency.
    pub async fn book_activity(&self, request: &ActivityBookingRequest) -> EngineResult<ActivityBooking> {
        let guest = self
            .db
            .reservations()
            .customer_for(&request.reservation_id)
            .await?;

        // Unknown reservations fall through to the repository's NotFound
        let exchange = match guest {
            Some(customer) if !customer.residency().is_resident() => Some(self.rates.get_rate().await),
            _ => None,
        };

        let activity = self
            .db
            .charges()
            .book_activity(
                &request.reservation_id,
                &request.activity_id,
                request.scheduled_date,
                request.participants,
                exchange,
            )
            .await?;

        Ok(ActivityBooking {
            activity,
            rate_estimated: exchange.map(|q| q.is_fallback()).unwrap_or(false),
        })
    }

    // =========================================================================
    // Settlement
    // =========================================================================

    /// Settles the stay. `method` defaults to cash.
    pub async fn complete_checkout(
        &self,
        reservation_id: &str,
        method: Option<PaymentMethod>,
    ) -> EngineResult<CheckoutReceipt> {
        let method = method.unwrap_or_default();
        let settlement = self
            .db
            .settlement()
            .complete_checkout(reservation_id, method)
            .await?;

        Ok(CheckoutReceipt {
            reservation_id: settlement.reservation_id,
            method,
            breakdown: settlement.breakdown,
            payment: settlement.payment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateSettings;
    use crate::error::{EngineError, ErrorCode};
    use crate::rates::tests::FixedRate;
    use crate::test_support::*;
    use hotelier_core::{Money, PaymentSource, RateSource, ReservationStatus};
    use std::sync::Arc;

    async fn engine_with(provider: Arc<FixedRate>) -> (ReservationEngine, Catalog) {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let rates = RateConverter::new(provider, &RateSettings::default()).unwrap();
        (ReservationEngine::new(db, rates), catalog)
    }

    fn quote(catalog: &Catalog, room: &str, country: &str, check_in: u32, check_out: u32) -> QuoteRequest {
        QuoteRequest {
            room_number: room.to_string(),
            package_id: catalog.package.id.clone(),
            check_in: d(check_in),
            check_out: d(check_out),
            country: country.to_string(),
        }
    }

    #[tokio::test]
    async fn test_resident_quote_skips_rate_lookup() {
        let provider = FixedRate::live(300.0);
        let (engine, catalog) = engine_with(provider.clone()).await;

        let quote = engine
            .quote_stay(&quote(&catalog, "101", "Sri Lanka", 10, 12))
            .await
            .unwrap();

        // 25,000 × 2 × 1.30 = 65,000; +10% +18%
        assert_eq!(quote.invoice.adjusted_room_price, Money::from_major_minor(65_000, 0));
        assert_eq!(quote.invoice.total_price, Money::from_major_minor(83_200, 0));
        assert_eq!(quote.invoice.total_price_local, quote.invoice.total_price);
        assert!(quote.invoice.exchange.is_none());
        assert!(!quote.rate_estimated);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_foreign_quote_converts_at_live_rate() {
        let provider = FixedRate::live(320.0);
        let (engine, catalog) = engine_with(provider.clone()).await;

        let quote = engine
            .quote_stay(&quote(&catalog, "101", "Germany", 10, 12))
            .await
            .unwrap();

        assert_eq!(quote.invoice.total_price, Money::from_major_minor(332, 80));
        assert_eq!(quote.invoice.total_price_local, Money::from_major_minor(106_496, 0));
        assert_eq!(quote.invoice.exchange.unwrap().source, RateSource::Live);
        assert!(!quote.rate_estimated);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_provider_outage_is_disclosed_on_quote() {
        let (engine, catalog) = engine_with(FixedRate::down()).await;

        let quote = engine
            .quote_stay(&quote(&catalog, "101", "Germany", 10, 12))
            .await
            .unwrap();

        assert!(quote.rate_estimated);
        assert_eq!(quote.invoice.exchange.unwrap().rate.as_f64(), 320.0);
        assert_eq!(quote.invoice.total_price_local, Money::from_major_minor(106_496, 0));
    }

    #[tokio::test]
    async fn test_quote_rejections() {
        let (engine, catalog) = engine_with(FixedRate::live(320.0)).await;

        let err = engine
            .quote_stay(&quote(&catalog, "101", "Sri Lanka", 12, 12))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = engine
            .quote_stay(&quote(&catalog, "999", "Sri Lanka", 10, 12))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { ref entity, .. } if entity == "Room"));

        let mut request = quote(&catalog, "101", "Sri Lanka", 10, 12);
        request.package_id = "missing".to_string();
        let err = engine.quote_stay(&request).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_create_reservation_records_quoted_total() {
        let (engine, catalog) = engine_with(FixedRate::live(320.0)).await;

        let confirmation = engine
            .create_reservation(booking_request(&engine, resident(), "101", &catalog, 10, 12).await)
            .await
            .unwrap();

        assert_eq!(confirmation.total_amount, Money::from_major_minor(83_200, 0));
        assert_eq!(confirmation.package_name, "Half Board");
        assert!(confirmation.prepayment.is_none());

        let stored = engine
            .database()
            .reservations()
            .get_by_id(&confirmation.reservation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_amount(), confirmation.total_amount);
        assert_eq!(stored.status, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_booking_keeps_accepted_total_when_rate_moves() {
        let provider = FixedRate::live(300.0);
        let (engine, catalog) = engine_with(provider.clone()).await;

        // 332.80 USD × 300
        let request = booking_request(&engine, foreigner(), "102", &catalog, 10, 12).await;
        assert_eq!(request.quoted_total(), Money::from_major_minor(99_840, 0));

        provider.set_rate(320.0);
        let calls_before_booking = provider.calls();

        let confirmation = engine.create_web_reservation(request).await.unwrap();

        assert_eq!(provider.calls(), calls_before_booking);
        assert_eq!(confirmation.total_amount, Money::from_major_minor(99_840, 0));
        assert_eq!(
            confirmation.invoice.exchange.unwrap().rate,
            hotelier_core::ExchangeRate::from_micros(300_000_000)
        );
        let prepayment = confirmation.prepayment.unwrap();
        assert_eq!(prepayment.amount(), Money::from_major_minor(99_840, 0));

        let stored = engine
            .database()
            .reservations()
            .get_by_id(&confirmation.reservation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_amount(), Money::from_major_minor(99_840, 0));
    }

    #[tokio::test]
    async fn test_booking_with_mismatched_quote_writes_nothing() {
        let (engine, catalog) = engine_with(FixedRate::live(320.0)).await;

        let mut request = booking_request(&engine, resident(), "101", &catalog, 10, 12).await;
        request.stay.check_out = d(14);

        let err = engine.create_reservation(request).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(engine.database().notifications().count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_availability_and_overlap_conflict() {
        let (engine, catalog) = engine_with(FixedRate::live(320.0)).await;
        engine
            .create_reservation(booking_request(&engine, resident(), "101", &catalog, 10, 15).await)
            .await
            .unwrap();

        // Back-to-back turnover is allowed
        let rooms = engine.find_available_rooms(d(15), d(18)).await.unwrap();
        assert!(rooms.iter().any(|r| r.room_number == "101"));

        let rooms = engine.find_available_rooms(d(12), d(20)).await.unwrap();
        assert!(rooms.iter().all(|r| r.room_number != "101"));
        assert!(rooms.iter().any(|r| r.room_number == "102"));

        // Booking from a stale search is rejected distinctly
        let err = engine
            .create_reservation(booking_request(&engine, foreigner(), "101", &catalog, 12, 20).await)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert!(matches!(err, EngineError::Conflict { ref room } if room == "101"));
    }

    #[tokio::test]
    async fn test_unknown_room_writes_nothing() {
        let (engine, catalog) = engine_with(FixedRate::live(320.0)).await;

        let mut request = booking_request(&engine, resident(), "101", &catalog, 10, 12).await;
        request.stay.room_number = "999".to_string();
        request.quote.room_number = "999".to_string();

        let err = engine.create_reservation(request).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        assert_eq!(engine.database().notifications().count_pending().await.unwrap(), 0);
        let rooms = engine.find_available_rooms(d(10), d(12)).await.unwrap();
        assert_eq!(rooms.len(), 2);
    }

    #[tokio::test]
    async fn test_web_reservation_settles_extras_only() {
        let (engine, catalog) = engine_with(FixedRate::live(320.0)).await;

        let confirmation = engine
            .create_web_reservation(booking_request(&engine, foreigner(), "102", &catalog, 10, 12).await)
            .await
            .unwrap();
        let prepayment = confirmation.prepayment.clone().unwrap();
        assert_eq!(prepayment.amount(), Money::from_major_minor(106_496, 0));
        assert_eq!(prepayment.method, PaymentMethod::Online);

        engine
            .add_extra_charge(&ExtraChargeRequest {
                reservation_id: confirmation.reservation_id.clone(),
                description: "Minibar".to_string(),
                amount: Money::from_major_minor(1_500, 0),
            })
            .await
            .unwrap();

        let receipt = engine
            .complete_checkout(&confirmation.reservation_id, Some(PaymentMethod::Card))
            .await
            .unwrap();

        assert!(receipt.breakdown.has_paid_online);
        assert_eq!(receipt.breakdown.room_charge_due, Money::zero());
        assert_eq!(receipt.breakdown.final_total, Money::from_major_minor(1_500, 0));
        let payment = receipt.payment.unwrap();
        assert_eq!(payment.method, PaymentMethod::Card);
        assert_eq!(payment.source, PaymentSource::Reception);
    }

    #[tokio::test]
    async fn test_checkout_defaults_to_cash_and_rejects_second_settlement() {
        let (engine, catalog) = engine_with(FixedRate::live(320.0)).await;
        let confirmation = engine
            .create_reservation(booking_request(&engine, resident(), "101", &catalog, 10, 12).await)
            .await
            .unwrap();

        let receipt = engine
            .complete_checkout(&confirmation.reservation_id, None)
            .await
            .unwrap();
        assert_eq!(receipt.method, PaymentMethod::Cash);
        assert_eq!(receipt.breakdown.final_total, Money::from_major_minor(83_200, 0));

        let err = engine
            .complete_checkout(&confirmation.reservation_id, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadySettled);

        let paid = engine
            .database()
            .payments()
            .total_for_reservation(&confirmation.reservation_id)
            .await
            .unwrap();
        assert_eq!(paid, Money::from_major_minor(83_200, 0));
    }

    #[tokio::test]
    async fn test_cancelled_reservation_cannot_be_settled_or_charged() {
        let (engine, catalog) = engine_with(FixedRate::live(320.0)).await;
        let confirmation = engine
            .create_reservation(booking_request(&engine, resident(), "101", &catalog, 10, 12).await)
            .await
            .unwrap();

        engine
            .cancel_reservation(&confirmation.reservation_id)
            .await
            .unwrap();

        let err = engine
            .complete_checkout(&confirmation.reservation_id, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidState);

        let err = engine
            .add_extra_charge(&ExtraChargeRequest {
                reservation_id: confirmation.reservation_id.clone(),
                description: "Laundry".to_string(),
                amount: Money::from_major_minor(500, 0),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidState);

        // The room is free again
        let rooms = engine.find_available_rooms(d(10), d(12)).await.unwrap();
        assert!(rooms.iter().any(|r| r.room_number == "101"));
    }

    #[tokio::test]
    async fn test_activity_pricing_by_residency() {
        let provider = FixedRate::live(300.0);
        let (engine, catalog) = engine_with(provider.clone()).await;

        let local = engine
            .create_reservation(booking_request(&engine, resident(), "101", &catalog, 10, 14).await)
            .await
            .unwrap();
        let calls_after_booking = provider.calls();

        let booked = engine
            .book_activity(&ActivityBookingRequest {
                reservation_id: local.reservation_id.clone(),
                activity_id: catalog.safari.id.clone(),
                scheduled_date: d(11),
                participants: 2,
            })
            .await
            .unwrap();
        assert_eq!(booked.activity.amount_cents, Money::from_major_minor(8_000, 0).cents());
        assert_eq!(provider.calls(), calls_after_booking);

        let foreign = engine
            .create_reservation(booking_request(&engine, foreigner(), "102", &catalog, 10, 14).await)
            .await
            .unwrap();
        let booked = engine
            .book_activity(&ActivityBookingRequest {
                reservation_id: foreign.reservation_id.clone(),
                activity_id: catalog.safari.id.clone(),
                scheduled_date: d(12),
                participants: 2,
            })
            .await
            .unwrap();
        // 2 × 40 USD × 300
        assert_eq!(booked.activity.amount_cents, Money::from_major_minor(24_000, 0).cents());
        assert!(!booked.rate_estimated);

        // Settlement re-prices at the local catalog price
        let receipt = engine
            .complete_checkout(&foreign.reservation_id, None)
            .await
            .unwrap();
        assert_eq!(receipt.breakdown.activities_total, Money::from_major_minor(8_000, 0));
    }

    #[tokio::test]
    async fn test_activity_outside_stay_is_rejected() {
        let (engine, catalog) = engine_with(FixedRate::live(320.0)).await;
        let confirmation = engine
            .create_reservation(booking_request(&engine, resident(), "101", &catalog, 10, 12).await)
            .await
            .unwrap();

        let err = engine
            .book_activity(&ActivityBookingRequest {
                reservation_id: confirmation.reservation_id,
                activity_id: catalog.safari.id.clone(),
                scheduled_date: d(20),
                participants: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = engine
            .book_activity(&ActivityBookingRequest {
                reservation_id: "missing".to_string(),
                activity_id: catalog.safari.id.clone(),
                scheduled_date: d(11),
                participants: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_booking_wakes_dispatcher() {
        use crate::dispatcher::NotificationDispatcher;
        use crate::notifier::LogNotifier;

        let (engine, catalog) = engine_with(FixedRate::live(320.0)).await;
        let (dispatcher, handle) = NotificationDispatcher::new(
            engine.database().clone(),
            Arc::new(LogNotifier),
            Default::default(),
        );
        let engine = engine.with_dispatcher(handle.clone());

        engine
            .create_reservation(booking_request(&engine, resident(), "101", &catalog, 10, 12).await)
            .await
            .unwrap();

        // The wake is queued; one pass delivers the confirmation
        let report = dispatcher.deliver_pending().await.unwrap();
        assert_eq!(report.delivered, 1);
        handle.shutdown().await;
    }
}
