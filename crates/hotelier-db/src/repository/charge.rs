//! # Charge Repository
//!
//! Everything accrued during a stay: ad-hoc extra charges and scheduled
//! activities, plus the activity catalog itself.
//!
//! Charges can only be attached to a `confirmed` reservation. The insert is
//! a single `INSERT ... SELECT ... WHERE status = 'confirmed'`, so a charge
//! racing a checkout either lands before the settlement sums it or is
//! rejected; it can never be recorded against a closed reservation.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::reservation::reservation_by_id;
use hotelier_core::pricing::activity_price;
use hotelier_core::validation::{
    validate_activity_date, validate_amount_cents, validate_description, validate_name,
    validate_participants,
};
use hotelier_core::{
    Activity, CoreError, ExtraCharge, Money, RateQuote, ReservationActivity, ReservationStatus,
    Residency,
};

/// Repository for stay charges and the activity catalog.
#[derive(Debug, Clone)]
pub struct ChargeRepository {
    pool: SqlitePool,
}

impl ChargeRepository {
    /// Creates a new ChargeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ChargeRepository { pool }
    }

    // =========================================================================
    // Extra charges
    // =========================================================================

    /// Attaches an extra charge to a confirmed reservation.
    pub async fn add_extra_charge(
        &self,
        reservation_id: &str,
        description: &str,
        amount: Money,
    ) -> DbResult<ExtraCharge> {
        validate_description("description", description).map_err(CoreError::from)?;
        validate_amount_cents("amount", amount.cents()).map_err(CoreError::from)?;

        let charge = ExtraCharge {
            id: Uuid::new_v4().to_string(),
            reservation_id: reservation_id.to_string(),
            description: description.trim().to_string(),
            amount_cents: amount.cents(),
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO extra_charges (id, reservation_id, description, amount_cents, created_at)
            SELECT ?1, id, ?3, ?4, ?5
            FROM reservations
            WHERE id = ?2 AND status = 'confirmed'
            "#,
        )
        .bind(&charge.id)
        .bind(&charge.reservation_id)
        .bind(&charge.description)
        .bind(charge.amount_cents)
        .bind(charge.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.not_chargeable(reservation_id, "add a charge").await);
        }

        info!(
            reservation_id = %reservation_id,
            amount = charge.amount_cents,
            description = %charge.description,
            "Extra charge added"
        );
        Ok(charge)
    }

    /// Lists extra charges for a reservation, oldest first.
    pub async fn list_extra_charges(&self, reservation_id: &str) -> DbResult<Vec<ExtraCharge>> {
        let charges = sqlx::query_as::<_, ExtraCharge>(
            r#"
            SELECT id, reservation_id, description, amount_cents, created_at
            FROM extra_charges
            WHERE reservation_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(charges)
    }

    // =========================================================================
    // Activity catalog
    // =========================================================================

    /// Adds an activity. `local_price` is LKR, `foreign_price` is USD.
    pub async fn insert_activity(
        &self,
        name: &str,
        local_price: Money,
        foreign_price: Money,
    ) -> DbResult<Activity> {
        validate_name("name", name).map_err(CoreError::from)?;
        validate_amount_cents("local_price", local_price.cents()).map_err(CoreError::from)?;
        validate_amount_cents("foreign_price", foreign_price.cents()).map_err(CoreError::from)?;

        let activity = Activity {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            local_price_cents: local_price.cents(),
            foreign_price_cents: foreign_price.cents(),
        };

        sqlx::query(
            r#"
            INSERT INTO activities (id, name, local_price_cents, foreign_price_cents)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&activity.id)
        .bind(&activity.name)
        .bind(activity.local_price_cents)
        .bind(activity.foreign_price_cents)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &activity.name),
            other => other,
        })?;

        debug!(id = %activity.id, name = %activity.name, "Activity created");
        Ok(activity)
    }

    pub async fn get_activity(&self, id: &str) -> DbResult<Option<Activity>> {
        let activity = sqlx::query_as::<_, Activity>(
            "SELECT id, name, local_price_cents, foreign_price_cents FROM activities WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(activity)
    }

    pub async fn list_activities(&self) -> DbResult<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(
            "SELECT id, name, local_price_cents, foreign_price_cents FROM activities ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    // =========================================================================
    // Activity bookings
    // =========================================================================

    /// Schedules an activity within a confirmed stay.
    ///
    /// The recorded amount is the booking-time price: local price for
    /// residents, foreign price converted at `exchange` for everyone else.
    /// Settlement re-prices activities at the local catalog price.
    ///
    /// ## Errors
    /// - `Domain(ReservationNotFound)` / `Domain(ActivityNotFound)`
    /// - `Domain(InvalidReservationStatus)` unless confirmed
    /// - `Domain(Validation)` for a date outside the stay or no participants
    /// - `Domain(MissingExchangeRate)` for a non-resident without a quote
    pub async fn book_activity(
        &self,
        reservation_id: &str,
        activity_id: &str,
        scheduled_date: NaiveDate,
        participants: i64,
        exchange: Option<RateQuote>,
    ) -> DbResult<ReservationActivity> {
        validate_participants(participants).map_err(CoreError::from)?;

        let (reservation, residency) = {
            let mut conn = self.pool.acquire().await?;
            let reservation = reservation_by_id(&mut conn, reservation_id)
                .await?
                .ok_or_else(|| CoreError::ReservationNotFound(reservation_id.to_string()))?;

            let country: String = sqlx::query_scalar("SELECT country FROM customers WHERE id = ?1")
                .bind(&reservation.customer_id)
                .fetch_one(&mut *conn)
                .await?;

            (reservation, Residency::from_country(&country))
        };

        if reservation.status != ReservationStatus::Confirmed {
            return Err(CoreError::invalid_status(
                reservation_id,
                reservation.status,
                "book an activity",
            )
            .into());
        }
        validate_activity_date(&reservation.stay(), scheduled_date).map_err(CoreError::from)?;

        let activity = self
            .get_activity(activity_id)
            .await?
            .ok_or_else(|| CoreError::ActivityNotFound(activity_id.to_string()))?;

        let amount = activity_price(
            Money::from_cents(activity.local_price_cents),
            Money::from_cents(activity.foreign_price_cents),
            residency,
            participants,
            exchange,
        )?;

        let booked = ReservationActivity {
            id: Uuid::new_v4().to_string(),
            reservation_id: reservation_id.to_string(),
            activity_id: activity.id.clone(),
            scheduled_date,
            participants,
            amount_cents: amount.cents(),
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO reservation_activities (
                id, reservation_id, activity_id, scheduled_date,
                participants, amount_cents, created_at
            )
            SELECT ?1, id, ?3, ?4, ?5, ?6, ?7
            FROM reservations
            WHERE id = ?2 AND status = 'confirmed'
            "#,
        )
        .bind(&booked.id)
        .bind(&booked.reservation_id)
        .bind(&booked.activity_id)
        .bind(booked.scheduled_date)
        .bind(booked.participants)
        .bind(booked.amount_cents)
        .bind(booked.created_at)
        .execute(&self.pool)
        .await?;

        // Checked out or cancelled since the read above
        if result.rows_affected() == 0 {
            return Err(self.not_chargeable(reservation_id, "book an activity").await);
        }

        info!(
            reservation_id = %reservation_id,
            activity = %activity.name,
            participants,
            amount = booked.amount_cents,
            residency = ?residency,
            "Activity booked"
        );
        Ok(booked)
    }

    /// Activities scheduled for a reservation, by date.
    pub async fn list_activities_for(
        &self,
        reservation_id: &str,
    ) -> DbResult<Vec<ReservationActivity>> {
        let booked = sqlx::query_as::<_, ReservationActivity>(
            r#"
            SELECT id, reservation_id, activity_id, scheduled_date,
                   participants, amount_cents, created_at
            FROM reservation_activities
            WHERE reservation_id = ?1
            ORDER BY scheduled_date, created_at
            "#,
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(booked)
    }

    /// Explains why a guarded insert found no confirmed reservation.
    async fn not_chargeable(&self, reservation_id: &str, operation: &str) -> DbError {
        let loaded = match self.pool.acquire().await {
            Ok(mut conn) => reservation_by_id(&mut conn, reservation_id).await,
            Err(e) => Err(e.into()),
        };

        match loaded {
            Ok(Some(r)) => CoreError::invalid_status(reservation_id, r.status, operation).into(),
            Ok(None) => CoreError::ReservationNotFound(reservation_id.to_string()).into(),
            Err(e) => e,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::*;
    use hotelier_core::{ExchangeRate, PaymentMethod};

    fn lkr(major: i64) -> Money {
        Money::from_major_minor(major, 0)
    }

    #[tokio::test]
    async fn test_extra_charges_accumulate() {
        let db = test_db().await;
        seed_rooms(&db, &["101"]).await;
        let package = seed_package(&db).await;
        let created = book(&db, "101", &package.id, stay(10, 15), 100_000).await;
        let id = created.reservation.id.clone();

        db.charges().add_extra_charge(&id, "Minibar", lkr(20)).await.unwrap();
        db.charges().add_extra_charge(&id, "  Laundry ", lkr(5)).await.unwrap();

        let charges = db.charges().list_extra_charges(&id).await.unwrap();
        assert_eq!(charges.len(), 2);
        assert_eq!(charges[1].description, "Laundry");
        let total = Money::checked_sum(charges.iter().map(ExtraCharge::amount));
        assert_eq!(total, Some(lkr(25)));
    }

    #[tokio::test]
    async fn test_extra_charge_rejections() {
        let db = test_db().await;
        seed_rooms(&db, &["101"]).await;
        let package = seed_package(&db).await;
        let created = book(&db, "101", &package.id, stay(10, 15), 100_000).await;
        let id = created.reservation.id.clone();

        let negative = db
            .charges()
            .add_extra_charge(&id, "Refund", Money::from_cents(-100))
            .await;
        assert!(matches!(negative, Err(DbError::Domain(CoreError::Validation(_)))));

        let huge = db
            .charges()
            .add_extra_charge(&id, "Minibar", Money::from_cents(i64::MAX / 2 + 1))
            .await;
        assert!(matches!(huge, Err(DbError::Domain(CoreError::Validation(_)))));

        let missing = db.charges().add_extra_charge("missing", "Minibar", lkr(1)).await;
        assert!(matches!(
            missing,
            Err(DbError::Domain(CoreError::ReservationNotFound(_)))
        ));

        db.settlement().complete_checkout(&id, PaymentMethod::Cash).await.unwrap();
        let closed = db.charges().add_extra_charge(&id, "Minibar", lkr(1)).await;
        assert!(matches!(
            closed,
            Err(DbError::Domain(CoreError::InvalidReservationStatus { .. }))
        ));
        assert!(db.charges().list_extra_charges(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_activity_name_rejected() {
        let db = test_db().await;
        db.charges().insert_activity("Safari", lkr(4_000), lkr(40)).await.unwrap();

        let result = db.charges().insert_activity("Safari", lkr(1), lkr(1)).await;
        assert!(matches!(result, Err(DbError::UniqueViolation { .. })));
        assert_eq!(db.charges().list_activities().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resident_books_at_local_price() {
        let db = test_db().await;
        seed_rooms(&db, &["101"]).await;
        let package = seed_package(&db).await;
        let created = book(&db, "101", &package.id, stay(10, 15), 100_000).await;
        let safari = db
            .charges()
            .insert_activity("Safari", lkr(4_000), lkr(40))
            .await
            .unwrap();

        let booked = db
            .charges()
            .book_activity(&created.reservation.id, &safari.id, d(15), 3, None)
            .await
            .unwrap();

        assert_eq!(booked.amount_cents, lkr(12_000).cents());
        let listed = db
            .charges()
            .list_activities_for(&created.reservation.id)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].scheduled_date, d(15));
    }

    #[tokio::test]
    async fn test_non_resident_needs_exchange_rate() {
        let db = test_db().await;
        seed_rooms(&db, &["101"]).await;
        let package = seed_package(&db).await;
        let mut new = booking("101", &package.id, stay(10, 15), 50_000);
        new.customer = foreign_guest();
        let created = db.reservations().create(&new).await.unwrap();
        let safari = db
            .charges()
            .insert_activity("Safari", lkr(4_000), lkr(40))
            .await
            .unwrap();

        let without = db
            .charges()
            .book_activity(&created.reservation.id, &safari.id, d(11), 1, None)
            .await;
        assert!(matches!(
            without,
            Err(DbError::Domain(CoreError::MissingExchangeRate))
        ));

        let quote = RateQuote::live(ExchangeRate::from_micros(300_000_000));
        let booked = db
            .charges()
            .book_activity(&created.reservation.id, &safari.id, d(11), 1, Some(quote))
            .await
            .unwrap();
        assert_eq!(booked.amount_cents, lkr(12_000).cents());
    }

    #[tokio::test]
    async fn test_activity_booking_rejections() {
        let db = test_db().await;
        seed_rooms(&db, &["101"]).await;
        let package = seed_package(&db).await;
        let created = book(&db, "101", &package.id, stay(10, 15), 100_000).await;
        let id = created.reservation.id.clone();
        let safari = db
            .charges()
            .insert_activity("Safari", lkr(4_000), lkr(40))
            .await
            .unwrap();

        let outside = db.charges().book_activity(&id, &safari.id, d(16), 1, None).await;
        assert!(matches!(outside, Err(DbError::Domain(CoreError::Validation(_)))));

        let nobody = db.charges().book_activity(&id, &safari.id, d(12), 0, None).await;
        assert!(matches!(nobody, Err(DbError::Domain(CoreError::Validation(_)))));

        let crowd = db
            .charges()
            .book_activity(&id, &safari.id, d(12), i64::MAX / 10, None)
            .await;
        assert!(matches!(crowd, Err(DbError::Domain(CoreError::Validation(_)))));

        let unknown = db.charges().book_activity(&id, "missing", d(12), 1, None).await;
        assert!(matches!(
            unknown,
            Err(DbError::Domain(CoreError::ActivityNotFound(_)))
        ));

        db.reservations().cancel(&id).await.unwrap();
        let cancelled = db.charges().book_activity(&id, &safari.id, d(12), 1, None).await;
        assert!(matches!(
            cancelled,
            Err(DbError::Domain(CoreError::InvalidReservationStatus { .. }))
        ));
        assert!(db.charges().list_activities_for(&id).await.unwrap().is_empty());
    }
}
