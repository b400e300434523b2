//! # Settlement Repository
//!
//! Checkout: aggregate everything the guest owes, record one reception
//! payment and close the reservation, in one transaction.
//!
//! ## Checkout Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                complete_checkout(reservation_id, method)                │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   1. UPDATE reservations SET status = 'completed'                      │
//! │      WHERE id = ? AND status = 'confirmed'                             │
//! │         └── 0 rows → NotFound / AlreadySettled / Cancelled ► ROLLBACK  │
//! │   2. Σ online/web payments          → paid_online                      │
//! │   3. Σ extra_charges.amount         → extras                           │
//! │   4. Σ activity.local_price × pax   → activities                       │
//! │   5. SettlementBreakdown::compute   (overflow ► ROLLBACK)              │
//! │   6. final_total > 0 ? INSERT payments (source = reception)            │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded status flip runs first. It is both the idempotence guard
//! (a second checkout finds zero rows) and the statement that takes the
//! SQLite write lock, so the sums below cannot race with a concurrent
//! checkout of the same reservation.

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::payment::{insert_payment, online_total, reservation_payment};
use crate::repository::reservation::reservation_by_id;
use hotelier_core::settlement::ActivityLine;
use hotelier_core::{
    CoreError, Money, Payment, PaymentMethod, PaymentSource, ReservationStatus, SettlementBreakdown,
};

/// Result of a completed checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub reservation_id: String,
    pub breakdown: SettlementBreakdown,
    /// The reception payment, absent when nothing was due.
    pub payment: Option<Payment>,
}

/// Repository for the checkout transaction.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    pool: SqlitePool,
}

impl SettlementRepository {
    /// Creates a new SettlementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettlementRepository { pool }
    }

    /// Settles a confirmed reservation.
    ///
    /// ## Errors
    /// - `Domain(ReservationNotFound)`
    /// - `Domain(AlreadySettled)` for a completed reservation
    /// - `Domain(InvalidReservationStatus)` for a cancelled reservation
    /// - `Domain(AmountOverflow)` when the totals do not fit; nothing is written
    pub async fn complete_checkout(
        &self,
        reservation_id: &str,
        method: PaymentMethod,
    ) -> DbResult<Settlement> {
        let mut tx = self.pool.begin().await?;

        // 1. Close the reservation (guarded)
        let result = sqlx::query(
            r#"
            UPDATE reservations SET
                status = 'completed',
                updated_at = ?2
            WHERE id = ?1 AND status = 'confirmed'
            "#,
        )
        .bind(reservation_id)
        .bind(chrono::Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(rejection(&mut tx, reservation_id).await?.into());
        }

        let reservation = reservation_by_id(&mut tx, reservation_id)
            .await?
            .ok_or_else(|| CoreError::ReservationNotFound(reservation_id.to_string()))?;

        // 2-4. Accrued amounts
        let paid_online = online_total(&mut tx, reservation_id).await?;
        let extra_charges = extra_charge_amounts(&mut tx, reservation_id).await?;
        let activities = activity_lines(&mut tx, reservation_id).await?;

        // 5. Breakdown
        let breakdown = SettlementBreakdown::compute(
            reservation.total_amount(),
            paid_online,
            &extra_charges,
            &activities,
        )?;

        debug!(
            reservation_id = %reservation_id,
            room_charge_due = breakdown.room_charge_due.cents(),
            extras = breakdown.extra_charges_total.cents(),
            activities = breakdown.activities_total.cents(),
            final_total = breakdown.final_total.cents(),
            "Settlement computed"
        );

        // 6. Reception payment
        let payment = if breakdown.requires_payment() {
            let payment = reservation_payment(
                reservation_id,
                breakdown.final_total,
                method,
                PaymentSource::Reception,
            );
            insert_payment(&mut tx, &payment).await?;
            Some(payment)
        } else {
            None
        };

        tx.commit().await?;

        info!(
            reservation_id = %reservation_id,
            final_total = breakdown.final_total.cents(),
            paid_online = breakdown.has_paid_online,
            method = ?method,
            "Checkout completed"
        );

        Ok(Settlement {
            reservation_id: reservation_id.to_string(),
            breakdown,
            payment,
        })
    }
}

/// Explains why the guarded update matched nothing.
async fn rejection(conn: &mut SqliteConnection, reservation_id: &str) -> DbResult<CoreError> {
    let error = match reservation_by_id(conn, reservation_id).await? {
        None => CoreError::ReservationNotFound(reservation_id.to_string()),
        Some(r) if r.status == ReservationStatus::Completed => {
            CoreError::AlreadySettled(reservation_id.to_string())
        }
        Some(r) => CoreError::invalid_status(reservation_id, r.status, "check out"),
    };
    Ok(error)
}

async fn extra_charge_amounts(conn: &mut SqliteConnection, reservation_id: &str) -> DbResult<Vec<Money>> {
    let cents: Vec<i64> =
        sqlx::query_scalar("SELECT amount_cents FROM extra_charges WHERE reservation_id = ?1")
            .bind(reservation_id)
            .fetch_all(&mut *conn)
            .await?;

    Ok(cents.into_iter().map(Money::from_cents).collect())
}

/// Activities at their current local catalog price.
async fn activity_lines(conn: &mut SqliteConnection, reservation_id: &str) -> DbResult<Vec<ActivityLine>> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT a.local_price_cents, ra.participants
        FROM reservation_activities ra
        JOIN activities a ON a.id = ra.activity_id
        WHERE ra.reservation_id = ?1
        "#,
    )
    .bind(reservation_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(local_price_cents, participants)| ActivityLine {
            local_price: Money::from_cents(local_price_cents),
            participants,
        })
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
