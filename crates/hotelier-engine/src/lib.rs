//! # hotelier-engine: Reservation & Settlement Orchestration
//!
//! Ties the pure pricing rules of `hotelier-core` and the transactions of
//! `hotelier-db` to the two external collaborators: the exchange-rate
//! provider and the guest notification relay.
//!
//! ## Modules
//!
//! - [`engine`] - `ReservationEngine`, the operations callers use
//! - [`requests`] - Typed request and response structures
//! - [`rates`] - Exchange-rate provider and fallback
//! - [`notifier`] - Confirmation delivery
//! - [`dispatcher`] - Background outbox delivery
//! - [`config`] - TOML + environment configuration
//! - [`error`] - `EngineError` and its error codes
//!
//! ## Example
//!
//! ```rust,no_run
//! use hotelier_db::{Database, DbConfig};
//! use hotelier_engine::{EngineConfig, RateConverter, ReservationEngine};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::load(None)?;
//! let db = Database::new(DbConfig::new(&config.database.path)).await?;
//! let engine = ReservationEngine::new(db, RateConverter::from_settings(&config.rates)?);
//!
//! let check_in = chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
//! let check_out = chrono::NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();
//! let rooms = engine.find_available_rooms(check_in, check_out).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod notifier;
pub mod rates;
pub mod requests;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{DatabaseSettings, EngineConfig, NotificationSettings, RateSettings};
pub use dispatcher::{DeliveryReport, DispatcherHandle, NotificationDispatcher};
pub use engine::ReservationEngine;
pub use error::{EngineError, EngineResult, ErrorCode, ErrorResponse};
pub use notifier::{LogNotifier, Notifier, NotifyError, WebhookNotifier};
pub use rates::{HttpRateProvider, RateConverter, RateError, RateProvider};
pub use requests::{
    ActivityBooking, ActivityBookingRequest, BookingConfirmation, BookingRequest, CheckoutReceipt,
    ExtraChargeRequest, GuestDetails, QuoteRequest, StayDetails, StayQuote,
};
