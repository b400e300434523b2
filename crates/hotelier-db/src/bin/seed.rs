//! # Seed Data Generator
//!
//! Populates the database with a development catalog.
//!
//! ## Usage
//! ```bash
//! # Seed ./hotelier_dev.db with 3 floors (default)
//! cargo run -p hotelier-db --bin seed
//!
//! # More floors
//! cargo run -p hotelier-db --bin seed -- --floors 5
//!
//! # Specify database path
//! cargo run -p hotelier-db --bin seed -- --db ./data/hotelier.db
//! ```
//!
//! ## Generated Catalog
//! - Room types: Standard, Deluxe, Family Suite
//! - Packages: Room Only (×1.00), Bed & Breakfast (×1.15),
//!   Half Board (×1.30), Full Board (×1.50)
//! - Rooms: `{floor}{01..08}`, cycling through the room types
//! - Activities: a handful of excursions with local/foreign prices

use std::env;

use hotelier_core::{Money, PackageMultiplier, RoomRates};
use hotelier_db::{Database, DbConfig, NewRoom};

/// (name, description, local LKR, foreign USD, max occupancy)
const ROOM_TYPES: &[(&str, &str, i64, i64, i64)] = &[
    ("Standard", "Garden view, queen bed", 18_000, 75, 2),
    ("Deluxe", "Sea view, king bed, balcony", 25_000, 100, 3),
    ("Family Suite", "Two bedrooms, sea view", 42_000, 165, 5),
];

/// (name, description, multiplier bps)
const PACKAGES: &[(&str, &str, u32)] = &[
    ("Room Only", "Accommodation only", 10_000),
    ("Bed & Breakfast", "Breakfast buffet included", 11_500),
    ("Half Board", "Breakfast and dinner", 13_000),
    ("Full Board", "All meals", 15_000),
];

/// (name, local LKR, foreign USD) per participant
const ACTIVITIES: &[(&str, i64, i64)] = &[
    ("Whale Watching", 9_500, 55),
    ("Snorkelling", 3_000, 20),
    ("Galle Fort Tour", 4_500, 30),
    ("Ayurvedic Massage", 7_000, 45),
    ("Cooking Class", 5_500, 35),
];

const ROOMS_PER_FLOOR: u32 = 8;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut floors: u32 = 3;
    let mut db_path = String::from("./hotelier_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--floors" | "-f" => {
                if i + 1 < args.len() {
                    floors = args[i + 1].parse().unwrap_or(3).clamp(1, 9);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Hotelier Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -f, --floors <N>   Number of floors, 1-9 (default: 3)");
                println!("  -d, --db <PATH>    Database file path (default: ./hotelier_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Hotelier Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Floors:   {}", floors);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.rooms().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} rooms", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Catalog
    let mut room_types = Vec::new();
    for (name, description, local, foreign, occupancy) in ROOM_TYPES {
        let room_type = db
            .catalog()
            .insert_room_type(name, Some(description), None)
            .await?;
        room_types.push((room_type, *local, *foreign, *occupancy));
    }
    println!("✓ {} room types", room_types.len());

    for (name, description, bps) in PACKAGES {
        db.catalog()
            .insert_package_type(name, Some(description), None, PackageMultiplier::from_bps(*bps))
            .await?;
    }
    println!("✓ {} packages", PACKAGES.len());

    // Rooms
    let mut generated = 0;
    for floor in 1..=floors {
        for slot in 1..=ROOMS_PER_FLOOR {
            let (room_type, local, foreign, occupancy) =
                &room_types[(slot as usize - 1) % room_types.len()];
            let room = NewRoom {
                room_number: format!("{}{:02}", floor, slot),
                room_type_id: room_type.id.clone(),
                rates: RoomRates {
                    local: Money::from_major_minor(*local, 0),
                    foreign: Money::from_major_minor(*foreign, 0),
                },
                max_occupancy: *occupancy,
                description: None,
            };

            if let Err(e) = db.rooms().insert(&room).await {
                eprintln!("Failed to insert room {}: {}", room.room_number, e);
                continue;
            }
            generated += 1;
        }
    }
    println!("✓ {} rooms", generated);

    for (name, local, foreign) in ACTIVITIES {
        db.charges()
            .insert_activity(
                name,
                Money::from_major_minor(*local, 0),
                Money::from_major_minor(*foreign, 0),
            )
            .await?;
    }
    println!("✓ {} activities", ACTIVITIES.len());

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    Ok(())
}
