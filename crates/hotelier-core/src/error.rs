//! # Error Types
//!
//! Domain-specific error types for hotelier-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  hotelier-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  hotelier-db errors (separate crate)                                   │
//! │  └── DbError          - Database failures (wraps CoreError)            │
//! │                                                                         │
//! │  hotelier-engine errors                                                │
//! │  └── EngineError      - What callers see ({code, message})             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → EngineError             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No room carries the requested room number.
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Reservation ID does not exist.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),

    /// Package type ID does not exist.
    #[error("Package type not found: {0}")]
    PackageNotFound(String),

    /// Activity ID does not exist.
    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    /// The stay covers less than one night (or runs backwards).
    ///
    /// ## When This Occurs
    /// - check_out == check_in
    /// - check_out before check_in
    #[error("Invalid stay range {check_in} → {check_out}: at least one night is required")]
    InvalidStayRange { check_in: String, check_out: String },

    /// A non-resident invoice was requested without an exchange rate.
    #[error("Exchange rate is required to price a non-resident stay")]
    MissingExchangeRate,

    /// Checkout was already performed for this reservation.
    ///
    /// ## User Workflow
    /// ```text
    /// Front desk presses "Checkout" twice
    ///      │
    ///      ▼
    /// First call: Confirmed → Completed, payment recorded
    ///      │
    ///      ▼
    /// Second call: AlreadySettled (no second payment row)
    /// ```
    #[error("Reservation {0} has already been settled")]
    AlreadySettled(String),

    /// An amount left the representable range while being priced or summed.
    #[error("Amount is too large to be represented")]
    AmountOverflow,

    /// Reservation is not in a state that allows the requested operation.
    #[error("Reservation {reservation_id} is {current_status}, cannot {operation}")]
    InvalidReservationStatus {
        reservation_id: String,
        current_status: String,
        operation: String,
    },

    /// Room is referenced by at least one reservation.
    #[error("Room {0} has reservations and cannot be deleted")]
    RoomInUse(String),

    /// Catalog type (room type / package type) is still referenced.
    #[error("{kind} {id} is still referenced and cannot be deleted")]
    TypeInUse { kind: String, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Builds an `InvalidReservationStatus` error.
    pub fn invalid_status(
        reservation_id: impl Into<String>,
        current_status: impl std::fmt::Display,
        operation: impl Into<String>,
    ) -> Self {
        CoreError::InvalidReservationStatus {
            reservation_id: reservation_id.into(),
            current_status: current_status.to_string(),
            operation: operation.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at the boundary, before any write happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields that must not both be set were both set.
    #[error("{field} must not be provided together with {other}")]
    MutuallyExclusive { field: String, other: String },

    /// Date lies outside the reservation's stay.
    #[error("{field} {date} must fall within the stay {check_in} → {check_out}")]
    OutsideStay {
        field: String,
        date: String,
        check_in: String,
        check_out: String,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidStayRange {
            check_in: "2024-01-10".to_string(),
            check_out: "2024-01-10".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid stay range 2024-01-10 → 2024-01-10: at least one night is required"
        );

        let err = CoreError::invalid_status("res-1", "cancelled", "check out");
        assert_eq!(err.to_string(), "Reservation res-1 is cancelled, cannot check out");

        assert_eq!(
            CoreError::AmountOverflow.to_string(),
            "Amount is too large to be represented"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "first_name".to_string(),
        };
        assert_eq!(err.to_string(), "first_name is required");

        let err = ValidationError::MutuallyExclusive {
            field: "passport_number".to_string(),
            other: "national_id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "passport_number must not be provided together with national_id"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "participants".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
