//! # Seed Data Generator
//!
//! Populates a database with sample locations and items for development.
//!
//! ## Usage
//! ```bash
//! # Three sheets of items (default)
//! cargo run -p tally-db --bin seed
//!
//! # Custom amount
//! cargo run -p tally-db --bin seed -- --sheets 5
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! - One location per entry in [`LOCATIONS`]
//! - `sheets × 9` items with minted codes
//! - Roughly two thirds of the items named, assigned and rated; the rest
//!   left blank, the way freshly printed stickers look

use chrono::Utc;
use std::env;
use tally_core::{minter, Assignment, Item, Location, Quality, ITEMS_COLLECTION, LOCATIONS_COLLECTION};
use tally_db::{Database, DbConfig};

/// Sample locations.
const LOCATIONS: &[&str] = &["Garage", "Kitchen", "Office", "Attic", "Basement"];

/// Sample item names with an optional comment.
const ITEMS: &[(&str, Option<&str>)] = &[
    ("Cordless drill", Some("spare battery in the drawer")),
    ("Hammer", None),
    ("Extension cord", Some("10 m, orange")),
    ("Toolbox", None),
    ("Camping stove", Some("needs a new gas canister")),
    ("Sleeping bag", None),
    ("Desk lamp", None),
    ("Printer", Some("paper jam on tray 2")),
    ("Winter tyres", None),
    ("Christmas lights", Some("one string is broken")),
    ("Folding chair", None),
    ("Folding chair", None),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut sheets: usize = 3;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sheets" | "-s" => {
                if i + 1 < args.len() {
                    sheets = args[i + 1].parse().unwrap_or(3);
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
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sheets <N>   Sheets of 9 items to generate (default: 3)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tally Seed Data Generator");
    println!("=========================");
    println!("Database: {}", db_path);
    println!("Sheets:   {}", sheets);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let docs = db.documents();

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = docs.count(ITEMS_COLLECTION).await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let mut location_ids = Vec::with_capacity(LOCATIONS.len());
    for name in LOCATIONS {
        let id = docs
            .create(LOCATIONS_COLLECTION, &Location::new_fields(name, now))
            .await?;
        location_ids.push(id);
    }
    println!("✓ Created {} locations", location_ids.len());

    let start = std::time::Instant::now();
    let codes = minter::mint(sheets * minter::BATCH_SIZE);
    let mut assigned = 0;

    for (index, code) in codes.iter().enumerate() {
        let id = docs
            .create(ITEMS_COLLECTION, &Item::new_fields(code, now))
            .await?;

        // every third sticker stays blank
        if index % 3 == 2 {
            continue;
        }

        let (name, comment) = ITEMS[index % ITEMS.len()];
        let assignment = Assignment {
            location_id: Some(location_ids[index % location_ids.len()].clone()),
            name: Some(name.to_string()),
            quality: Quality::clamped(5 - (index % 5) as i64),
            comment: comment.map(String::from),
        };
        docs.update(ITEMS_COLLECTION, &id, &assignment.to_fields())
            .await?;
        assigned += 1;
    }

    let elapsed = start.elapsed();
    println!(
        "✓ Created {} items ({} assigned) in {:.2?}",
        codes.len(),
        assigned,
        elapsed
    );

    db.close().await;
    Ok(())
}
