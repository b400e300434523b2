//! # Payment Repository
//!
//! Read access to payment rows. Payments are only ever written inside the
//! booking and settlement transactions, through [`insert_payment`].

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use hotelier_core::{Money, Payment, PaymentMethod, PaymentSource};

const PAYMENT_COLUMNS: &str =
    "id, amount_cents, method, reservation_id, order_id, source, created_at";

/// Builds a payment row for a reservation.
pub(crate) fn reservation_payment(
    reservation_id: &str,
    amount: Money,
    method: PaymentMethod,
    source: PaymentSource,
) -> Payment {
    Payment {
        id: Uuid::new_v4().to_string(),
        amount_cents: amount.cents(),
        method,
        reservation_id: Some(reservation_id.to_string()),
        order_id: None,
        source,
        created_at: Utc::now(),
    }
}

/// Inserts a payment on an open connection or transaction.
pub(crate) async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    debug!(
        reservation_id = ?payment.reservation_id,
        amount = payment.amount_cents,
        method = ?payment.method,
        source = ?payment.source,
        "Recording payment"
    );

    sqlx::query(
        r#"
        INSERT INTO payments (
            id, amount_cents, method, reservation_id, order_id, source, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&payment.id)
    .bind(payment.amount_cents)
    .bind(payment.method)
    .bind(&payment.reservation_id)
    .bind(&payment.order_id)
    .bind(payment.source)
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Sum of online / web payments already made for a reservation.
pub(crate) async fn online_total(conn: &mut SqliteConnection, reservation_id: &str) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(amount_cents), 0)
        FROM payments
        WHERE reservation_id = ?1
          AND (method = 'online' OR source = 'web')
        "#,
    )
    .bind(reservation_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_cents(cents))
}

/// Repository for payment queries.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Gets all payments for a reservation, oldest first.
    pub async fn list_for_reservation(&self, reservation_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE reservation_id = ?1 ORDER BY created_at"
        ))
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Total of every payment recorded against a reservation.
    pub async fn total_for_reservation(&self, reservation_id: &str) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE reservation_id = ?1",
        )
        .bind(reservation_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents))
    }

    /// Sum of online / web prepayments for a reservation.
    pub async fn online_total(&self, reservation_id: &str) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        online_total(&mut conn, reservation_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::*;

    #[tokio::test]
    async fn test_web_booking_records_online_prepayment() {
        let db = test_db().await;
        seed_rooms(&db, &["101"]).await;
        let package = seed_package(&db).await;

        let mut booking = booking("101", &package.id, stay(10, 12), 120_000);
        booking.online_prepayment = true;
        let created = db.reservations().create(&booking).await.unwrap();

        let payments = db
            .payments()
            .list_for_reservation(&created.reservation.id)
            .await
            .unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].method, PaymentMethod::Online);
        assert_eq!(payments[0].source, PaymentSource::Web);
        assert_eq!(payments[0].amount(), Money::from_cents(120_000));
        assert!(payments[0].is_online_prepayment());

        let online = db.payments().online_total(&created.reservation.id).await.unwrap();
        assert_eq!(online, Money::from_cents(120_000));
    }

    #[tokio::test]
    async fn test_counter_booking_has_no_payment() {
        let db = test_db().await;
        seed_rooms(&db, &["101"]).await;
        let package = seed_package(&db).await;
        let created = book(&db, "101", &package.id, stay(10, 12), 120_000).await;

        let total = db
            .payments()
            .total_for_reservation(&created.reservation.id)
            .await
            .unwrap();
        assert!(total.is_zero());
    }
}
