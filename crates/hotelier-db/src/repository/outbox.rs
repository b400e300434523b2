//! # Notification Outbox Repository
//!
//! Confirmation notifications are recorded in the booking transaction and
//! delivered after commit.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  ReservationRepository::create                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  INSERT customers / reservations / payments                    │   │
//! │  │  INSERT INTO notification_outbox (kind, reservation_id,        │   │
//! │  │         payload) VALUES ('RESERVATION_CONFIRMED', ?, <json>)   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← booking and its notification exist together or not at all    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        NotificationDispatcher (hotelier-engine, async)          │   │
//! │  │                                                                 │   │
//! │  │  1. get_pending(batch, max_attempts)                           │   │
//! │  │  2. Notifier::send_reservation_confirmation(payload)           │   │
//! │  │     ok  → mark_delivered                                       │   │
//! │  │     err → mark_failed (attempts += 1, last_error)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  A failed delivery never touches the reservation.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use hotelier_core::NotificationOutboxEntry;

const OUTBOX_COLUMNS: &str = r#"
    id, kind, reservation_id, payload,
    attempts, last_error, created_at, attempted_at, delivered_at
"#;

/// Writes an outbox entry on an open transaction.
pub(crate) async fn enqueue_in(
    conn: &mut SqliteConnection,
    kind: &str,
    reservation_id: &str,
    payload: &str,
) -> DbResult<NotificationOutboxEntry> {
    let entry = NotificationOutboxEntry {
        id: Uuid::new_v4().to_string(),
        kind: kind.to_string(),
        reservation_id: reservation_id.to_string(),
        payload: payload.to_string(),
        attempts: 0,
        last_error: None,
        created_at: Utc::now(),
        attempted_at: None,
        delivered_at: None,
    };

    debug!(kind = %kind, reservation_id = %reservation_id, "Queuing notification");

    sqlx::query(
        r#"
        INSERT INTO notification_outbox (
            id, kind, reservation_id, payload,
            attempts, last_error, created_at, attempted_at, delivered_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.kind)
    .bind(&entry.reservation_id)
    .bind(&entry.payload)
    .bind(entry.attempts)
    .bind(&entry.last_error)
    .bind(entry.created_at)
    .bind(entry.attempted_at)
    .bind(entry.delivered_at)
    .execute(&mut *conn)
    .await?;

    Ok(entry)
}

/// Repository for notification outbox operations.
#[derive(Debug, Clone)]
pub struct NotificationOutboxRepository {
    pool: SqlitePool,
}

impl NotificationOutboxRepository {
    /// Creates a new NotificationOutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationOutboxRepository { pool }
    }

    /// Queues a notification outside a booking (e.g. a manual resend).
    pub async fn enqueue(
        &self,
        kind: &str,
        reservation_id: &str,
        payload: &str,
    ) -> DbResult<NotificationOutboxEntry> {
        let mut conn = self.pool.acquire().await?;
        enqueue_in(&mut conn, kind, reservation_id, payload).await
    }

    /// Gets undelivered entries that still have attempts left.
    ///
    /// ## Returns
    /// Entries where `delivered_at IS NULL AND attempts < max_attempts`,
    /// oldest first.
    pub async fn get_pending(
        &self,
        limit: u32,
        max_attempts: u32,
    ) -> DbResult<Vec<NotificationOutboxEntry>> {
        let entries = sqlx::query_as::<_, NotificationOutboxEntry>(&format!(
            r#"
            SELECT {OUTBOX_COLUMNS}
            FROM notification_outbox
            WHERE delivered_at IS NULL
              AND attempts < ?2
            ORDER BY created_at ASC
            LIMIT ?1
            "#
        ))
        .bind(limit as i64)
        .bind(max_attempts as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Gets an entry by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<NotificationOutboxEntry>> {
        let entry = sqlx::query_as::<_, NotificationOutboxEntry>(&format!(
            "SELECT {OUTBOX_COLUMNS} FROM notification_outbox WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Marks an entry as delivered.
    pub async fn mark_delivered(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE notification_outbox SET
                delivered_at = ?2,
                attempted_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a failed delivery attempt.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE notification_outbox SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts undelivered entries (including exhausted ones).
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notification_outbox WHERE delivered_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Counts undelivered entries that ran out of attempts.
    pub async fn count_exhausted(&self, max_attempts: u32) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification_outbox WHERE delivered_at IS NULL AND attempts >= ?1",
        )
        .bind(max_attempts as i64)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Deletes delivered entries older than `days_old` days.
    ///
    /// ## Returns
    /// Number of deleted entries.
    pub async fn cleanup_old_entries(&self, days_old: u32) -> DbResult<u64> {
        let cutoff = Utc::now() - Duration::days(days_old as i64);

        let result = sqlx::query(
            r#"
            DELETE FROM notification_outbox
            WHERE delivered_at IS NOT NULL
              AND delivered_at < ?1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
