//! Fixtures shared by the engine tests.

use chrono::NaiveDate;

use hotelier_core::{Activity, Money, PackageMultiplier, PackageType, RoomRates, StayDates};
use hotelier_db::{CreatedReservation, Database, DbConfig, NewCustomer, NewReservation, NewRoom};

use crate::engine::ReservationEngine;
use crate::requests::{BookingRequest, GuestDetails, StayDetails};

pub struct Catalog {
    pub package: PackageType,
    pub safari: Activity,
}

pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

/// Rooms 101 and 102 at 25,000.00 LKR / 100.00 USD, a ×1.30 package and
/// an activity at 4,000.00 LKR / 40.00 USD.
pub async fn seed_catalog(db: &Database) -> Catalog {
    let room_type = db
        .catalog()
        .insert_room_type("Deluxe", Some("Sea view"), None)
        .await
        .unwrap();

    for number in ["101", "102"] {
        db.rooms()
            .insert(&NewRoom {
                room_number: number.to_string(),
                room_type_id: room_type.id.clone(),
                rates: RoomRates {
                    local: Money::from_major_minor(25_000, 0),
                    foreign: Money::from_major_minor(100, 0),
                },
                max_occupancy: 3,
                description: None,
            })
            .await
            .unwrap();
    }

    let package = db
        .catalog()
        .insert_package_type("Half Board", None, None, PackageMultiplier::from_bps(13_000))
        .await
        .unwrap();

    let safari = db
        .charges()
        .insert_activity(
            "Safari",
            Money::from_major_minor(4_000, 0),
            Money::from_major_minor(40, 0),
        )
        .await
        .unwrap();

    Catalog { package, safari }
}

pub fn resident() -> GuestDetails {
    GuestDetails {
        first_name: "Nimal".to_string(),
        last_name: "Perera".to_string(),
        email: "nimal@example.lk".to_string(),
        phone: "+94 77 123 4567".to_string(),
        country: "Sri Lanka".to_string(),
        national_id: Some("852341234V".to_string()),
        passport_number: None,
    }
}

pub fn foreigner() -> GuestDetails {
    GuestDetails {
        first_name: "Anna".to_string(),
        last_name: "Schmidt".to_string(),
        email: "anna@example.de".to_string(),
        phone: "+49 30 1234567".to_string(),
        country: "Germany".to_string(),
        national_id: None,
        passport_number: Some("C01X00T47".to_string()),
    }
}

pub fn stay_details(room_number: &str, catalog: &Catalog, check_in: u32, check_out: u32) -> StayDetails {
    StayDetails {
        room_number: room_number.to_string(),
        package_id: catalog.package.id.clone(),
        check_in: d(check_in),
        check_out: d(check_out),
        adults: 2,
        children: 0,
        arrival_time: None,
        departure_time: None,
        special_requests: None,
    }
}

/// Quotes the stay through `engine` and returns the booking that accepts it.
pub async fn booking_request(
    engine: &ReservationEngine,
    guest: GuestDetails,
    room_number: &str,
    catalog: &Catalog,
    check_in: u32,
    check_out: u32,
) -> BookingRequest {
    let stay = stay_details(room_number, catalog, check_in, check_out);
    let quote = engine
        .quote_stay(&stay.quote_request(&guest.country))
        .await
        .unwrap();
    BookingRequest { guest, stay, quote }
}

/// Books room 101 for a resident directly through the repository.
pub async fn book_resident(
    db: &Database,
    catalog: &Catalog,
    check_in: u32,
    check_out: u32,
) -> CreatedReservation {
    db.reservations()
        .create(&NewReservation {
            customer: NewCustomer::from(resident()),
            room_number: "101".to_string(),
            package_id: catalog.package.id.clone(),
            stay: StayDates::new(d(check_in), d(check_out)),
            total_amount: Money::from_major_minor(1_000, 0),
            adults: 2,
            children: 0,
            arrival_time: None,
            departure_time: None,
            special_requests: None,
            online_prepayment: false,
        })
        .await
        .unwrap()
}
