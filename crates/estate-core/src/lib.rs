//! # estate-core: Pure Domain Types for Estate
//!
//! Listings, users, and the query model used to page through listings.
//! Everything here is plain data plus pure functions; no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Estate Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Page-level consumers (UI, hosts)                │   │
//! │  │      Category page ──► Offers page ──► Profile page             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    estate-client                                │   │
//! │  │      ListingPage, Paginator, ProfileSync, store ports           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ estate-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │   query   │  │ validation│                  │   │
//! │  │   │  Listing  │  │ PageQuery │  │   rules   │                  │   │
//! │  │   │  UserId   │  │  Cursor   │  │  checks   │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Listing, UserProfile, ids)
//! - [`query`] - Filters, sort order, cursors and page requests
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use estate_core::query::{FilterSpec, PageQuery};
//! use estate_core::DEFAULT_PAGE_SIZE;
//!
//! let query = PageQuery::for_spec(&FilterSpec::Offers, DEFAULT_PAGE_SIZE).unwrap();
//! assert_eq!(query.limit(), 10);
//! assert_eq!(query.filters().len(), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod query;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use query::{
    Collection, Cursor, FieldFilter, FilterSpec, FilterValue, ListingField, PageQuery,
    PageRequest,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of listings fetched per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound for a configured page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Maximum length of a profile display name, in characters.
pub const MAX_DISPLAY_NAME_LEN: usize = 100;
