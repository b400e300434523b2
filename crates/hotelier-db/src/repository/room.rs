//! # Room Repository
//!
//! Rooms and the availability index.
//!
//! ## Availability
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A room is UNAVAILABLE for [in, out) if any CONFIRMED reservation      │
//! │  on it satisfies   existing.check_in  < out                            │
//! │                AND existing.check_out > in                             │
//! │                                                                         │
//! │  existing   |====10────15====|                                         │
//! │  request                     |==15────18==|     available (turnover)   │
//! │  request          |==12──────────20==|          unavailable            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The search is advisory. Migration 002 re-checks the same predicate
//! inside the booking write.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use hotelier_core::validation::{validate_amount_cents, validate_max_occupancy, validate_room_number};
use hotelier_core::{AvailableRoom, CoreError, Room, RoomRates, StayDates};

/// Fields required to create a room.
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub room_number: String,
    pub room_type_id: String,
    pub rates: RoomRates,
    pub max_occupancy: i64,
    pub description: Option<String>,
}

const ROOM_COLUMNS: &str = r#"
    id, room_number, room_type_id,
    local_price_cents, foreign_price_cents, max_occupancy,
    description, created_at, updated_at
"#;

/// Repository for room database operations.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

impl RoomRepository {
    /// Creates a new RoomRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RoomRepository { pool }
    }

    /// Returns every room with no overlapping confirmed reservation,
    /// joined with its room type, ordered by room number.
    ///
    /// Cancelled and completed reservations never block a room.
    pub async fn find_available(&self, stay: &StayDates) -> DbResult<Vec<AvailableRoom>> {
        debug!(check_in = %stay.check_in, check_out = %stay.check_out, "Searching available rooms");

        let rooms = sqlx::query_as::<_, AvailableRoom>(
            r#"
            SELECT
                r.id,
                r.room_number,
                r.room_type_id,
                t.name        AS type_name,
                t.description AS type_description,
                t.image_ref   AS type_image_ref,
                r.local_price_cents,
                r.foreign_price_cents,
                r.max_occupancy,
                r.description
            FROM rooms r
            JOIN room_types t ON t.id = r.room_type_id
            WHERE NOT EXISTS (
                SELECT 1 FROM reservations res
                WHERE res.room_id = r.id
                  AND res.status = 'confirmed'
                  AND res.check_in < ?2
                  AND res.check_out > ?1
            )
            ORDER BY r.room_number
            "#,
        )
        .bind(stay.check_in)
        .bind(stay.check_out)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rooms.len(), "Available rooms found");
        Ok(rooms)
    }

    /// Gets a room by its room number.
    pub async fn get_by_number(&self, room_number: &str) -> DbResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE room_number = ?1"
        ))
        .bind(room_number.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    /// Gets a room by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(room)
    }

    /// Lists all rooms ordered by room number.
    pub async fn list(&self) -> DbResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms ORDER BY room_number"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    /// Inserts a new room.
    ///
    /// ## Errors
    /// - `UniqueViolation` for a duplicate room number
    /// - `ForeignKeyViolation` for an unknown room type
    pub async fn insert(&self, new: &NewRoom) -> DbResult<Room> {
        validate_room_number(&new.room_number).map_err(CoreError::from)?;
        validate_amount_cents("local_price", new.rates.local.cents()).map_err(CoreError::from)?;
        validate_amount_cents("foreign_price", new.rates.foreign.cents()).map_err(CoreError::from)?;
        validate_max_occupancy(new.max_occupancy).map_err(CoreError::from)?;

        let now = Utc::now();
        let room = Room {
            id: Uuid::new_v4().to_string(),
            room_number: new.room_number.trim().to_string(),
            room_type_id: new.room_type_id.clone(),
            local_price_cents: new.rates.local.cents(),
            foreign_price_cents: new.rates.foreign.cents(),
            max_occupancy: new.max_occupancy,
            description: new.description.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %room.id, room_number = %room.room_number, "Inserting room");

        sqlx::query(
            r#"
            INSERT INTO rooms (
                id, room_number, room_type_id,
                local_price_cents, foreign_price_cents, max_occupancy,
                description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&room.id)
        .bind(&room.room_number)
        .bind(&room.room_type_id)
        .bind(room.local_price_cents)
        .bind(room.foreign_price_cents)
        .bind(room.max_occupancy)
        .bind(&room.description)
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: room.room_number.clone(),
            },
            other => other,
        })?;

        Ok(room)
    }

    /// Updates both nightly prices.
    ///
    /// Existing reservations keep their recorded totals.
    pub async fn update_prices(&self, id: &str, rates: RoomRates) -> DbResult<()> {
        validate_amount_cents("local_price", rates.local.cents()).map_err(CoreError::from)?;
        validate_amount_cents("foreign_price", rates.foreign.cents()).map_err(CoreError::from)?;

        let result = sqlx::query(
            r#"
            UPDATE rooms SET
                local_price_cents = ?2,
                foreign_price_cents = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(rates.local.cents())
        .bind(rates.foreign.cents())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Room", id));
        }

        Ok(())
    }

    /// Deletes a room that has never been booked.
    ///
    /// ## Errors
    /// - `CoreError::RoomInUse` if any reservation (in any status) references it
    /// - `NotFound` if the room doesn't exist
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let room_number: Option<String> =
            sqlx::query_scalar("SELECT room_number FROM rooms WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let room_number = room_number.ok_or_else(|| DbError::not_found("Room", id))?;

        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE room_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if references > 0 {
            return Err(CoreError::RoomInUse(room_number).into());
        }

        sqlx::query("DELETE FROM rooms WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(id = %id, room_number = %room_number, "Room deleted");
        Ok(())
    }

    /// Counts rooms.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::*;
    use hotelier_core::Money;

    fn numbers(rooms: &[AvailableRoom]) -> Vec<&str> {
        rooms.iter().map(|r| r.room_number.as_str()).collect()
    }

    #[tokio::test]
    async fn test_all_rooms_available_without_bookings() {
        let db = test_db().await;
        seed_rooms(&db, &["102", "101"]).await;

        let free = db.rooms().find_available(&stay(10, 15)).await.unwrap();
        assert_eq!(numbers(&free), vec!["101", "102"]);
        assert_eq!(free[0].type_name, "Deluxe");
        assert_eq!(free[0].type_description.as_deref(), Some("Sea view"));
    }

    #[tokio::test]
    async fn test_half_open_overlap() {
        let db = test_db().await;
        seed_rooms(&db, &["101", "102"]).await;
        let package = seed_package(&db).await;
        book(&db, "101", &package.id, stay(10, 15), 100_000).await;

        // Same-day turnover is allowed
        let free = db.rooms().find_available(&stay(15, 18)).await.unwrap();
        assert_eq!(numbers(&free), vec!["101", "102"]);

        let free = db.rooms().find_available(&stay(5, 10)).await.unwrap();
        assert_eq!(numbers(&free), vec!["101", "102"]);

        // Partial, inner and enclosing overlaps block the room
        for (a, b) in [(12, 20), (9, 11), (11, 12), (1, 30)] {
            let free = db.rooms().find_available(&stay(a, b)).await.unwrap();
            assert_eq!(numbers(&free), vec!["102"], "stay {a}→{b}");
        }
    }

    #[tokio::test]
    async fn test_cancelled_reservation_frees_room() {
        let db = test_db().await;
        seed_rooms(&db, &["101"]).await;
        let package = seed_package(&db).await;
        let booked = book(&db, "101", &package.id, stay(10, 15), 100_000).await;

        assert!(db.rooms().find_available(&stay(12, 13)).await.unwrap().is_empty());

        db.reservations().cancel(&booked.reservation.id).await.unwrap();

        let free = db.rooms().find_available(&stay(12, 13)).await.unwrap();
        assert_eq!(numbers(&free), vec!["101"]);
    }

    #[tokio::test]
    async fn test_get_by_number() {
        let db = test_db().await;
        let rooms = seed_rooms(&db, &["101"]).await;

        let room = db.rooms().get_by_number("101").await.unwrap().unwrap();
        assert_eq!(room.id, rooms[0].id);
        assert_eq!(room.rates().local, Money::from_major_minor(25_000, 0));

        assert!(db.rooms().get_by_number("999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_room_number_rejected() {
        let db = test_db().await;
        let rooms = seed_rooms(&db, &["101"]).await;

        let result = db
            .rooms()
            .insert(&NewRoom {
                room_number: "101".to_string(),
                room_type_id: rooms[0].room_type_id.clone(),
                rates: rooms[0].rates(),
                max_occupancy: 2,
                description: None,
            })
            .await;

        assert!(matches!(result, Err(DbError::UniqueViolation { .. })));
        assert_eq!(db.rooms().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_prices() {
        let db = test_db().await;
        let rooms = seed_rooms(&db, &["101"]).await;

        let rates = RoomRates {
            local: Money::from_major_minor(30_000, 0),
            foreign: Money::from_major_minor(120, 0),
        };
        db.rooms().update_prices(&rooms[0].id, rates).await.unwrap();

        let room = db.rooms().get_by_id(&rooms[0].id).await.unwrap().unwrap();
        assert_eq!(room.rates(), rates);

        let missing = db.rooms().update_prices("missing", rates).await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_room_with_reservation_is_blocked() {
        let db = test_db().await;
        let rooms = seed_rooms(&db, &["101", "102"]).await;
        let package = seed_package(&db).await;
        book(&db, "101", &package.id, stay(10, 15), 100_000).await;

        let result = db.rooms().delete(&rooms[0].id).await;
        assert!(matches!(
            result,
            Err(DbError::Domain(CoreError::RoomInUse(ref number))) if number == "101"
        ));

        db.rooms().delete(&rooms[1].id).await.unwrap();
        assert_eq!(db.rooms().count().await.unwrap(), 1);
    }
}
