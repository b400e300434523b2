//! # Engine Error Types
//!
//! The error every `ReservationEngine` operation returns.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Engine                             │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──► DbError ──► EngineError ──► caller  │
//! │                                                                         │
//! │  ┌──────────────────┬─────────────────────┬──────────────────────────┐ │
//! │  │ EngineError      │ ErrorCode           │ Caller should...         │ │
//! │  ├──────────────────┼─────────────────────┼──────────────────────────┤ │
//! │  │ Validation       │ VALIDATION_ERROR    │ fix the input            │ │
//! │  │ NotFound         │ NOT_FOUND           │ re-select                │ │
//! │  │ Conflict         │ CONFLICT            │ search rooms again       │ │
//! │  │ AlreadySettled   │ ALREADY_SETTLED     │ show the old receipt     │ │
//! │  │ InvalidState     │ INVALID_STATE       │ refresh the reservation  │ │
//! │  │ Persistence      │ PERSISTENCE_ERROR   │ retry later (opaque)     │ │
//! │  │ Config           │ CONFIG_ERROR        │ fix the deployment       │ │
//! │  └──────────────────┴─────────────────────┴──────────────────────────┘ │
//! │                                                                         │
//! │  Rate-provider failures never appear here: they degrade to the         │
//! │  fallback rate and are disclosed on the quote instead.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use hotelier_core::CoreError;
use hotelier_db::DbError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    Conflict,
    AlreadySettled,
    InvalidState,
    PersistenceError,
    ConfigError,
}

/// Engine error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or out-of-range input. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// Unknown room, reservation, package or activity.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The room was taken between search and booking.
    #[error("Room {room} is no longer available for the requested dates")]
    Conflict { room: String },

    #[error("Reservation {0} has already been settled")]
    AlreadySettled(String),

    /// Operation not allowed in the reservation's current status.
    #[error("{0}")]
    InvalidState(String),

    /// Opaque storage failure. The transaction was rolled back.
    #[error("The operation could not be completed; no changes were saved")]
    Persistence,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Validation(_) => ErrorCode::ValidationError,
            EngineError::NotFound { .. } => ErrorCode::NotFound,
            EngineError::Conflict { .. } => ErrorCode::Conflict,
            EngineError::AlreadySettled(_) => ErrorCode::AlreadySettled,
            EngineError::InvalidState(_) => ErrorCode::InvalidState,
            EngineError::Persistence => ErrorCode::PersistenceError,
            EngineError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// Serializable form handed to callers.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// What a caller receives when an operation fails.
///
/// ```json
/// { "code": "CONFLICT", "message": "Room 101 is no longer available for the requested dates" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::RoomNotFound(number) => EngineError::not_found("Room", number),
            CoreError::ReservationNotFound(id) => EngineError::not_found("Reservation", id),
            CoreError::PackageNotFound(id) => EngineError::not_found("Package", id),
            CoreError::ActivityNotFound(id) => EngineError::not_found("Activity", id),
            CoreError::AlreadySettled(id) => EngineError::AlreadySettled(id),
            e @ CoreError::InvalidReservationStatus { .. } => EngineError::InvalidState(e.to_string()),
            e @ CoreError::RoomInUse(_) => EngineError::InvalidState(e.to_string()),
            e @ CoreError::TypeInUse { .. } => EngineError::InvalidState(e.to_string()),
            e @ CoreError::InvalidStayRange { .. } => EngineError::Validation(e.to_string()),
            e @ CoreError::MissingExchangeRate => EngineError::Validation(e.to_string()),
            e @ CoreError::AmountOverflow => EngineError::Validation(e.to_string()),
            CoreError::Validation(e) => EngineError::Validation(e.to_string()),
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::Conflict { room } => EngineError::Conflict { room },
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => {
                EngineError::Validation(format!("{} '{}' already exists", field, value))
            }
            other => {
                // Log the actual error but return an opaque one
                error!(error = %other, "Persistence failure");
                EngineError::Persistence
            }
        }
    }
}
