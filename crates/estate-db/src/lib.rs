//! # estate-db: SQLite Reference Store for Estate
//!
//! Local implementation of the document store (listings, user profiles) and
//! the identity store, on SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Estate Data Flow                                 │
//! │                                                                         │
//! │  ListingPage / ProfileSync (estate-client)                             │
//! │       │                                                                 │
//! │       ▼  RemoteStore / IdentityStore ports                             │
//! │  SqliteRemoteStore / SqliteIdentityStore (estate-client adapters)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     estate-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ ListingRepo    │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ UserRepo       │   │ 001_init.sql │  │   │
//! │  │   │               │    │ IdentityRepo   │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (estate.db)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Listing, user and identity repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use estate_core::{FilterSpec, PageQuery};
//! use estate_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("estate.db")).await?;
//!
//! let query = PageQuery::for_spec(&FilterSpec::Offers, 10)?;
//! let listings = db.listings().fetch_page(&query.first_page()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::identity::IdentityRepository;
pub use repository::listing::{ListingRepository, NewListing};
pub use repository::user::UserRepository;
