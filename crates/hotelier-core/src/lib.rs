//! # hotelier-core: Pure Business Logic for the Reservation Engine
//!
//! This crate holds every monetary and booking rule of the engine as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Hotelier Engine Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 hotelier-engine (orchestration)                 │   │
//! │  │   quote_stay, create_reservation, complete_checkout, ...        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ hotelier-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌────────────┐  ┌────────────┐     │   │
//! │  │   │  types  │  │  money  │  │  pricing   │  │ settlement │     │   │
//! │  │   │  Room   │  │  Money  │  │  Invoice   │  │ Breakdown  │     │   │
//! │  │   │ Booking │  │  Rates  │  │            │  │            │     │   │
//! │  │   └─────────┘  └─────────┘  └────────────┘  └────────────┘     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  hotelier-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Room, Reservation, Payment, etc.)
//! - [`money`] - Integer money, percentages, package multipliers, exchange rates
//! - [`pricing`] - The invoice calculator
//! - [`settlement`] - Checkout aggregation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use hotelier_core::money::{Money, PackageMultiplier};
//! use hotelier_core::pricing::{compute_invoice, PricingInput};
//! use hotelier_core::types::Residency;
//!
//! let invoice = compute_invoice(&PricingInput {
//!     nightly_rate: Money::from_major_minor(100, 0),
//!     nights: 3,
//!     multiplier: PackageMultiplier::ONE,
//!     residency: Residency::Resident,
//!     exchange: None,
//! })
//! .unwrap();
//!
//! assert_eq!(invoice.total_price.cents(), 38_400);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{ExchangeRate, Money, PackageMultiplier, Percentage};
pub use pricing::{compute_invoice, nights_between, Invoice, PricingInput};
pub use settlement::{ActivityLine, SettlementBreakdown};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Country whose guests are billed at the local (resident) room rate.
pub const RESIDENT_COUNTRY: &str = "Sri Lanka";

/// Service charge applied to the package-adjusted room price (10%).
pub const SERVICE_CHARGE: Percentage = Percentage::from_bps(1000);

/// Value-added tax applied to the package-adjusted room price (18%).
pub const VAT: Percentage = Percentage::from_bps(1800);

/// Exchange rate used when the live provider cannot be reached (320.0).
pub const FALLBACK_EXCHANGE_RATE: ExchangeRate = ExchangeRate::from_micros(320_000_000);

/// Maximum number of nights a single reservation may span.
///
/// ## Business Reason
/// Catches swapped years and typos (2205 instead of 2025) at the boundary.
pub const MAX_STAY_NIGHTS: u32 = 365;
