//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        CoreError (business rule)           │
//! │       │                                 │                               │
//! │       ▼                                 ▼                               │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  EngineError (hotelier-engine) ← {code, message} for callers           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Message Classification
//! SQLite reports constraint failures only through the message text:
//! ```text
//! "reservation_overlap"                  → Conflict   (overlap trigger)
//! "UNIQUE constraint failed: t.c"        → UniqueViolation
//! "FOREIGN KEY constraint failed"        → ForeignKeyViolation
//! "CHECK constraint failed: ..."         → CheckViolation
//! ```

use hotelier_core::CoreError;
use thiserror::Error;

/// Message raised by the overlap triggers (see migration 002).
pub const OVERLAP_TRIGGER_MESSAGE: &str = "reservation_overlap";

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate room number
    /// - Duplicate room type / package / activity name
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent package_id or room_type_id
    /// - Deleting a row that is still referenced
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative amount, zero participants, ...).
    #[error("Check constraint violated: {message}")]
    CheckViolation { message: String },

    /// The room was taken by a concurrent booking.
    ///
    /// ## When This Occurs
    /// ```text
    /// Guest A: search 10→15 (room 101 free) ──┐
    /// Guest B: search 12→20 (room 101 free) ──┤  both pass the advisory check
    /// Guest A: book  ─► COMMIT                │
    /// Guest B: book  ─► trigger RAISE ────────┘  → Conflict
    /// ```
    /// The caller should prompt the user to search again.
    #[error("Room {room} is no longer available for the requested dates")]
    Conflict { room: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Payload could not be (de)serialized.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),

    /// Business rule rejected the operation (room not found, already settled, ...).
    #[error(transparent)]
    Domain(#[from] CoreError),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Attaches the room number to a conflict raised without one.
    pub fn with_room(self, room_number: &str) -> Self {
        match self {
            DbError::Conflict { .. } => DbError::Conflict {
                room: room_number.to_string(),
            },
            other => other,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains(OVERLAP_TRIGGER_MESSAGE) {
                    DbError::Conflict {
                        room: "unknown".to_string(),
                    }
                } else if let Some(field) = msg.split("UNIQUE constraint failed: ").nth(1) {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_carries_room() {
        let err = DbError::Conflict {
            room: "unknown".to_string(),
        }
        .with_room("101");
        assert_eq!(
            err.to_string(),
            "Room 101 is no longer available for the requested dates"
        );

        // Other variants pass through untouched
        let err = DbError::PoolExhausted.with_room("101");
        assert!(matches!(err, DbError::PoolExhausted));
    }

    #[test]
    fn test_domain_error_is_transparent() {
        let err: DbError = CoreError::AlreadySettled("res-1".to_string()).into();
        assert_eq!(err.to_string(), "Reservation res-1 has already been settled");
    }
}
