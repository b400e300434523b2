//! # hotelier-db: Database Layer for the Reservation Engine
//!
//! SQLite storage for rooms, reservations, payments and accrued charges,
//! plus the two transactional protocols of the engine: booking and
//! settlement.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Reservation Engine Data Flow                       │
//! │                                                                         │
//! │  ReservationEngine (hotelier-engine)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   hotelier-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ RoomRepo       │    │ 001_schema   │  │   │
//! │  │   │ SqlitePool    │◄───│ ReservationRepo│    │ 002_overlap  │  │   │
//! │  │   │               │    │ SettlementRepo │    │              │  │   │
//! │  │   │               │    │ OutboxRepo ... │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys on, overlap triggers)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hotelier_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("hotelier.db")).await?;
//! let free = db.rooms().find_available(&stay).await?;
//! let booked = db.reservations().create(&new_reservation).await?;
//! let settled = db.settlement().complete_checkout(&booked.reservation.id, PaymentMethod::Cash).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::charge::ChargeRepository;
pub use repository::outbox::NotificationOutboxRepository;
pub use repository::payment::PaymentRepository;
pub use repository::reservation::{
    CreatedReservation, NewCustomer, NewReservation, ReservationRepository,
};
pub use repository::room::{NewRoom, RoomRepository};
pub use repository::settlement::{Settlement, SettlementRepository};
