//! # Seed Data Generator
//!
//! Populates the database with listings, profiles and identities for
//! development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 listings (default)
//! cargo run -p estate-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p estate-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p estate-db --bin seed -- --db ./data/estate.db
//! ```
//!
//! ## Generated Data
//! - One identity and one profile per owner in `OWNERS`
//! - Listings alternating between `rent` and `sale`, every fourth one an offer
//! - Timestamps one minute apart, newest first from now

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use std::env;
use tracing_subscriber::EnvFilter;

use estate_core::{CategoryTag, IdentityUser, Listing, ListingId, UserId, UserProfile};
use estate_db::{migrations, Database, DbConfig};

/// (id, name, email)
const OWNERS: &[(&str, &str, &str)] = &[
    ("owner-ada", "Ada Lovelace", "ada@example.com"),
    ("owner-alan", "Alan Turing", "alan@example.com"),
    ("owner-grace", "Grace Hopper", "grace@example.com"),
];

const STREETS: &[&str] = &[
    "Harbour View",
    "Maple Court",
    "Station Road",
    "Kingfisher Lane",
    "Orchard Rise",
    "Mill Street",
];

const KINDS: &[&str] = &["Apartment", "Townhouse", "Cottage", "Loft", "Villa"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./estate_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
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
                println!("Estate Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of listings to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./estate_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Estate Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Listings: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let (total, applied) = migrations::migration_status(db.pool()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied ({applied}/{total})");

    let existing = db.listings().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} listings", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (id, name, email) in OWNERS {
        let id = UserId::new(*id)?;
        db.identities()
            .insert(&IdentityUser {
                id: id.clone(),
                display_name: name.to_string(),
                email: email.to_string(),
            })
            .await?;
        db.users()
            .insert(&UserProfile {
                id,
                name: name.to_string(),
                email: email.to_string(),
            })
            .await?;
    }
    println!("✓ Created {} users", OWNERS.len());

    println!();
    println!("Generating listings...");

    let start = std::time::Instant::now();
    let now = Utc::now();
    let mut generated = 0;

    for n in 0..count {
        let listing = generate_listing(n, now - Duration::minutes(n as i64))?;

        if let Err(e) = db.listings().insert(&listing).await {
            eprintln!("Failed to insert {}: {}", listing.id, e);
            continue;
        }

        generated += 1;
        if generated % 50 == 0 {
            println!("  Generated {} listings...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} listings in {:?}", generated, elapsed);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one listing with a plausible payload.
fn generate_listing(
    n: usize,
    timestamp: chrono::DateTime<Utc>,
) -> Result<Listing, Box<dyn std::error::Error>> {
    let (owner, _, _) = OWNERS[n % OWNERS.len()];
    let street = STREETS[n % STREETS.len()];
    let kind = KINDS[(n / 2) % KINDS.len()];
    let is_rent = n % 2 == 0;
    let offer = n % 4 == 0;

    let regular_price: i64 = if is_rent {
        900 + (n as i64 % 12) * 75
    } else {
        180_000 + (n as i64 % 40) * 12_500
    };

    let mut data: Map<String, Value> = Map::new();
    data.insert("name".into(), json!(format!("{kind} on {street}")));
    data.insert("address".into(), json!(format!("{} {street}", n + 1)));
    data.insert("bedrooms".into(), json!(1 + n % 5));
    data.insert("bathrooms".into(), json!(1 + n % 3));
    data.insert("parking".into(), json!(n % 3 == 0));
    data.insert("furnished".into(), json!(n % 5 == 0));
    data.insert("regularPrice".into(), json!(regular_price));
    if offer {
        data.insert("discountedPrice".into(), json!(regular_price * 9 / 10));
    }

    Ok(Listing {
        id: ListingId::generate(),
        listing_type: if is_rent {
            CategoryTag::rent()
        } else {
            CategoryTag::sale()
        },
        offer,
        user_ref: UserId::new(owner)?,
        timestamp,
        data,
    })
}
