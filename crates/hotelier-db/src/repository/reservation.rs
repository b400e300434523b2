//! # Reservation Repository
//!
//! The booking transaction: customer, reservation, optional prepayment and
//! the confirmation notification commit together or not at all.
//!
//! ## Booking Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      create(NewReservation)                             │
//! │                                                                         │
//! │  validate()  ──────────────────────────── ValidationError, no writes   │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │   1. INSERT customers               (takes the SQLite write lock)      │
//! │   2. SELECT room BY room_number ─── RoomNotFound ──► ROLLBACK          │
//! │   3. INSERT reservations (confirmed, caller's total)                   │
//! │         └── overlap trigger ─────── Conflict ──────► ROLLBACK          │
//! │   4. INSERT payments (online/web)   web bookings only                  │
//! │   5. SELECT package name ────────── PackageNotFound ► ROLLBACK         │
//! │   6. INSERT notification_outbox                                        │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Delivery happens after COMMIT (NotificationDispatcher).               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The recorded total is the amount the caller priced. It is never
//! recomputed here, so a rate that moves between quote and booking cannot
//! change what the guest was shown.

use chrono::{NaiveTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::outbox::enqueue_in;
use crate::repository::payment::{insert_payment, reservation_payment};
use hotelier_core::validation::{
    validate_amount_cents, validate_description, validate_email, validate_guest_counts,
    validate_identity, validate_name, validate_phone, validate_room_number, validate_stay,
    ValidationResult,
};
use hotelier_core::{
    CoreError, Customer, Money, Payment, PaymentMethod, PaymentSource, Reservation,
    ReservationConfirmation, ReservationStatus, Residency, Room, StayDates, ValidationError,
    NOTIFICATION_RESERVATION_CONFIRMED,
};

const RESERVATION_COLUMNS: &str = r#"
    id, customer_id, room_id, package_id,
    check_in, check_out, total_amount_cents,
    adults, children, arrival_time, departure_time, special_requests,
    status, created_at, updated_at
"#;

// =============================================================================
// Inputs & outputs
// =============================================================================

/// Guest details captured with a booking.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub national_id: Option<String>,
    pub passport_number: Option<String>,
}

impl NewCustomer {
    pub fn residency(&self) -> Residency {
        Residency::from_country(&self.country)
    }

    /// Validates contact details and the residency-specific document.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)?;
        validate_email(&self.email)?;
        validate_phone(&self.phone)?;
        validate_name("country", &self.country)?;
        validate_identity(
            self.residency(),
            self.national_id.as_deref(),
            self.passport_number.as_deref(),
        )
    }
}

/// A booking ready to be written.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub customer: NewCustomer,
    /// External room key.
    pub room_number: String,
    pub package_id: String,
    pub stay: StayDates,
    /// Local-currency total produced by the pricing calculator.
    pub total_amount: Money,
    pub adults: i64,
    pub children: i64,
    pub arrival_time: Option<NaiveTime>,
    pub departure_time: Option<NaiveTime>,
    pub special_requests: Option<String>,
    /// Record an online payment for the full total (web bookings).
    pub online_prepayment: bool,
}

impl NewReservation {
    /// Boundary validation. Returns the number of nights.
    pub fn validate(&self) -> ValidationResult<u32> {
        self.customer.validate()?;
        validate_room_number(&self.room_number)?;
        if self.package_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "package_id".to_string(),
            });
        }
        validate_guest_counts(self.adults, self.children)?;
        validate_amount_cents("total_amount", self.total_amount.cents())?;
        if let Some(text) = self.special_requests.as_deref().filter(|s| !s.trim().is_empty()) {
            validate_description("special_requests", text)?;
        }
        validate_stay(&self.stay)
    }
}

/// Everything written by a successful booking.
#[derive(Debug, Clone)]
pub struct CreatedReservation {
    pub reservation: Reservation,
    pub customer: Customer,
    pub room_number: String,
    pub package_name: String,
    pub prepayment: Option<Payment>,
    /// Outbox entry holding the confirmation.
    pub notification_id: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for reservations and their customers.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    /// Creates a new ReservationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReservationRepository { pool }
    }

    /// Creates a confirmed reservation in one transaction.
    ///
    /// ## Errors
    /// - `Domain(Validation)` before any write
    /// - `Domain(RoomNotFound)` / `Domain(PackageNotFound)`, rolled back
    /// - `Conflict` when a concurrent booking took the room, rolled back
    /// - any other `DbError`, rolled back
    pub async fn create(&self, new: &NewReservation) -> DbResult<CreatedReservation> {
        new.validate().map_err(CoreError::from)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // 1. Customer (first write: holds the write lock from here on)
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            first_name: new.customer.first_name.trim().to_string(),
            last_name: new.customer.last_name.trim().to_string(),
            email: new.customer.email.trim().to_string(),
            phone: new.customer.phone.trim().to_string(),
            country: new.customer.country.trim().to_string(),
            national_id: non_blank(&new.customer.national_id),
            passport_number: non_blank(&new.customer.passport_number),
            created_at: now,
        };
        insert_customer(&mut tx, &customer).await?;

        // 2. Room
        let room = room_by_number(&mut tx, new.room_number.trim())
            .await?
            .ok_or_else(|| CoreError::RoomNotFound(new.room_number.trim().to_string()))?;

        if !room.fits(new.adults, new.children) {
            return Err(CoreError::from(ValidationError::OutOfRange {
                field: "guests".to_string(),
                min: 1,
                max: room.max_occupancy,
            })
            .into());
        }

        // 3. Reservation
        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            customer_id: customer.id.clone(),
            room_id: room.id.clone(),
            package_id: new.package_id.clone(),
            check_in: new.stay.check_in,
            check_out: new.stay.check_out,
            total_amount_cents: new.total_amount.cents(),
            adults: new.adults,
            children: new.children,
            arrival_time: new.arrival_time,
            departure_time: new.departure_time,
            special_requests: non_blank(&new.special_requests),
            status: ReservationStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };
        insert_reservation(&mut tx, &reservation)
            .await
            .map_err(|e| e.with_room(&room.room_number))?;

        // 4. Prepayment (web variant)
        let prepayment = if new.online_prepayment {
            let payment = reservation_payment(
                &reservation.id,
                new.total_amount,
                PaymentMethod::Online,
                PaymentSource::Web,
            );
            insert_payment(&mut tx, &payment).await?;
            Some(payment)
        } else {
            None
        };

        // 5. Package name for the confirmation
        let package_name: String =
            sqlx::query_scalar::<_, String>("SELECT name FROM package_types WHERE id = ?1")
                .bind(&new.package_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| CoreError::PackageNotFound(new.package_id.clone()))?;

        // 6. Confirmation, delivered after commit
        let confirmation = ReservationConfirmation {
            reservation_id: reservation.id.clone(),
            guest_name: customer.full_name(),
            email: customer.email.clone(),
            room_number: room.room_number.clone(),
            package_name: package_name.clone(),
            check_in: reservation.check_in,
            check_out: reservation.check_out,
            total_amount_cents: reservation.total_amount_cents,
            prepaid: prepayment.is_some(),
        };
        let payload = serde_json::to_string(&confirmation)?;
        let notification =
            enqueue_in(&mut tx, NOTIFICATION_RESERVATION_CONFIRMED, &reservation.id, &payload)
                .await?;

        // 7. Commit
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            reservation_id = %reservation.id,
            room_number = %room.room_number,
            check_in = %reservation.check_in,
            check_out = %reservation.check_out,
            total_cents = reservation.total_amount_cents,
            prepaid = prepayment.is_some(),
            "Reservation confirmed"
        );

        Ok(CreatedReservation {
            reservation,
            customer,
            room_number: room.room_number,
            package_name,
            prepayment,
            notification_id: notification.id,
        })
    }

    /// Gets a reservation by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Reservation>> {
        let mut conn = self.pool.acquire().await?;
        reservation_by_id(&mut conn, id).await
    }

    /// Lists reservations for a room, most recent stay first.
    pub async fn list_for_room(&self, room_id: &str) -> DbResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE room_id = ?1 ORDER BY check_in DESC"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    /// Gets the guest a reservation was made for.
    pub async fn customer_for(&self, reservation_id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT c.id, c.first_name, c.last_name, c.email, c.phone, c.country,
                   c.national_id, c.passport_number, c.created_at
            FROM customers c
            JOIN reservations r ON r.customer_id = c.id
            WHERE r.id = ?1
            "#,
        )
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Cancels a confirmed reservation, releasing its room.
    ///
    /// ## Errors
    /// - `Domain(ReservationNotFound)`
    /// - `Domain(InvalidReservationStatus)` for completed or cancelled stays
    pub async fn cancel(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE reservations SET
                status = 'cancelled',
                updated_at = ?2
            WHERE id = ?1 AND status = 'confirmed'
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let current = reservation_by_id(&mut tx, id)
                .await?
                .ok_or_else(|| CoreError::ReservationNotFound(id.to_string()))?;
            return Err(CoreError::invalid_status(id, current.status, "cancel").into());
        }

        tx.commit().await?;

        info!(reservation_id = %id, "Reservation cancelled");
        Ok(())
    }
}

// =============================================================================
// Statement helpers (run on an open transaction)
// =============================================================================

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

async fn insert_customer(conn: &mut SqliteConnection, customer: &Customer) -> DbResult<()> {
    debug!(id = %customer.id, "Inserting customer");

    sqlx::query(
        r#"
        INSERT INTO customers (
            id, first_name, last_name, email, phone, country,
            national_id, passport_number, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.first_name)
    .bind(&customer.last_name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(&customer.country)
    .bind(&customer.national_id)
    .bind(&customer.passport_number)
    .bind(customer.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_reservation(conn: &mut SqliteConnection, reservation: &Reservation) -> DbResult<()> {
    debug!(id = %reservation.id, room_id = %reservation.room_id, "Inserting reservation");

    sqlx::query(
        r#"
        INSERT INTO reservations (
            id, customer_id, room_id, package_id,
            check_in, check_out, total_amount_cents,
            adults, children, arrival_time, departure_time, special_requests,
            status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
    )
    .bind(&reservation.id)
    .bind(&reservation.customer_id)
    .bind(&reservation.room_id)
    .bind(&reservation.package_id)
    .bind(reservation.check_in)
    .bind(reservation.check_out)
    .bind(reservation.total_amount_cents)
    .bind(reservation.adults)
    .bind(reservation.children)
    .bind(reservation.arrival_time)
    .bind(reservation.departure_time)
    .bind(&reservation.special_requests)
    .bind(reservation.status)
    .bind(reservation.created_at)
    .bind(reservation.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn room_by_number(conn: &mut SqliteConnection, room_number: &str) -> DbResult<Option<Room>> {
    let room = sqlx::query_as::<_, Room>(
        r#"
        SELECT id, room_number, room_type_id,
               local_price_cents, foreign_price_cents, max_occupancy,
               description, created_at, updated_at
        FROM rooms
        WHERE room_number = ?1
        "#,
    )
    .bind(room_number)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(room)
}

/// Loads a reservation on an open connection or transaction.
pub(crate) async fn reservation_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Reservation>> {
    let reservation = sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(reservation)
}

// =============================================================================
// Unit Tests
// =============================================================================
