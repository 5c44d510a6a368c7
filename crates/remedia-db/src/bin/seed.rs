//! # Seed Data Generator
//!
//! Populates the database with demo users, a medicine catalog and a few
//! ledger entries for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p remedia-db --bin seed
//!
//! # Specify database path
//! cargo run -p remedia-db --bin seed -- --db ./data/remedia.db
//! ```
//!
//! ## Generated Data
//! - Two users: `owner` / `owner123` and `worker` / `worker123`
//! - A catalog of common pharmacy items with opening stock
//! - One purchase and one sale so the listings and audit trail are
//!   non-empty out of the box

use std::env;

use remedia_core::{CartLine, Money, Role};
use remedia_db::{Database, DbConfig};

/// (name, opening stock, shelf price in cents)
const CATALOG: &[(&str, i64, i64)] = &[
    ("Paracetamol 500mg", 120, 350),
    ("Ibuprofen 200mg", 90, 499),
    ("Aspirin 300mg", 80, 299),
    ("Amoxicillin 250mg", 40, 1250),
    ("Azithromycin 500mg", 25, 1799),
    ("Cetirizine 10mg", 60, 450),
    ("Loratadine 10mg", 55, 650),
    ("Omeprazole 20mg", 70, 899),
    ("Ranitidine 150mg", 30, 550),
    ("Metformin 500mg", 100, 799),
    ("Amlodipine 5mg", 65, 699),
    ("Atorvastatin 20mg", 50, 1150),
    ("Salbutamol Inhaler", 20, 1499),
    ("ORS Sachet", 200, 120),
    ("Vitamin C 1000mg", 150, 899),
    ("Vitamin D3 2000IU", 85, 1050),
    ("Multivitamin Daily", 95, 1299),
    ("Cough Syrup 120ml", 45, 575),
    ("Antiseptic Cream 25g", 35, 425),
    ("Bandage Roll", 110, 250),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remedia_db=info,seed=info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./remedia_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Remedia Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./remedia_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Remedia Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");

    let (total, applied) = remedia_db::migrations::migration_status(db.pool()).await?;
    println!("✓ Migrations applied ({}/{})", applied, total);

    // Check existing catalog
    let existing = db.medicines().list().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} medicines", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Users
    let owner = db.users().insert("owner", "owner123", Role::Owner).await?;
    db.users().insert("worker", "worker123", Role::Worker).await?;
    println!("✓ Created users: owner, worker");

    // Catalog
    println!();
    println!("Seeding catalog...");

    let start = std::time::Instant::now();
    let mut first_ids = Vec::new();

    for &(name, stock, price_cents) in CATALOG {
        let medicine = db.medicines().insert(name, stock, price_cents).await?;
        if first_ids.len() < 3 {
            first_ids.push((medicine.medicine_id, price_cents));
        }
    }

    println!("✓ Seeded {} medicines in {:?}", CATALOG.len(), start.elapsed());

    // A purchase and a sale so listings have content
    let purchase_lines: Vec<CartLine> = first_ids
        .iter()
        .map(|&(id, price)| CartLine::new(id, 10, Money::from_cents(price * 6 / 10)))
        .collect();
    let purchase_id = db.ledger().record_purchase(owner.user_id, &purchase_lines).await?;
    println!("✓ Recorded demo purchase #{}", purchase_id);

    let sale_lines: Vec<CartLine> = first_ids
        .iter()
        .map(|&(id, price)| CartLine::new(id, 2, Money::from_cents(price)))
        .collect();
    let sale_id = db.ledger().record_sale(None, owner.user_id, &sale_lines).await?;
    println!("✓ Recorded demo sale #{}", sale_id);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
