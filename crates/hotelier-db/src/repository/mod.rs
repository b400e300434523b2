//! # Repository Module
//!
//! Database repository implementations for the reservation engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and what they own                       │
//! │                                                                         │
//! │  ReservationEngine                                                     │
//! │       │                                                                 │
//! │       │  db.reservations().create(&booking)                            │
//! │       ▼                                                                 │
//! │  ┌──────────────────────┬──────────────────────────────────────────┐   │
//! │  │ RoomRepository       │ rooms, availability index                │   │
//! │  │ CatalogRepository    │ room types, package types                │   │
//! │  │ ReservationRepository│ customers + reservations (booking tx)    │   │
//! │  │ SettlementRepository │ checkout tx                              │   │
//! │  │ ChargeRepository     │ extra charges, activities                │   │
//! │  │ PaymentRepository    │ payment history                          │   │
//! │  │ NotificationOutbox.. │ post-commit notifications                │   │
//! │  └──────────────────────┴──────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Multi-statement operations open one transaction, run every statement on
//! it and commit at the end. Returning early with `?` drops the transaction,
//! which rolls it back.

pub mod catalog;
pub mod charge;
pub mod outbox;
pub mod payment;
pub mod reservation;
pub mod room;
pub mod settlement;

// =============================================================================
// Shared test fixtures
// =============================================================================
