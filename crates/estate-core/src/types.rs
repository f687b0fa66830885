//! # Domain Types
//!
//! Core domain types used throughout Estate.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐          ┌─────────────────────┐              │
//! │  │      Listing        │          │    UserProfile      │              │
//! │  │  ─────────────────  │  userRef │  ─────────────────  │              │
//! │  │  id (store-owned)   │ ───────► │  id (both stores)   │              │
//! │  │  type (category)    │  (not    │  name (dual-homed)  │              │
//! │  │  offer              │ enforced)│  email (identity)   │              │
//! │  │  userRef (owner)    │          └─────────────────────┘              │
//! │  │  timestamp (sort)   │                                               │
//! │  │  data (payload)     │          ┌─────────────────────┐              │
//! │  └─────────────────────┘          │    IdentityUser     │              │
//! │                                   │  id, display_name,  │              │
//! │                                   │  email              │              │
//! │                                   └─────────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `id`, `userRef` and `timestamp` are assigned by the store and never
//! modified by clients. Pagination relies on `timestamp` staying put.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::validation::{validate_category_tag, validate_record_id, ValidationResult};

// =============================================================================
// Identifiers
// =============================================================================

/// Store-assigned listing identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> ValidationResult<Self> {
        let id = id.into();
        validate_record_id("listing id", &id)?;
        Ok(ListingId(id))
    }

    /// Generates a fresh identifier (stores call this on insert).
    pub fn generate() -> Self {
        ListingId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ListingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// User identifier, the primary key in both the identity and document store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> ValidationResult<Self> {
        let id = id.into();
        validate_record_id("user id", &id)?;
        Ok(UserId(id))
    }

    pub fn generate() -> Self {
        UserId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Category Tag
// =============================================================================

/// Category a listing belongs to (the `type` field), e.g. `rent` or `sale`.
///
/// Categories are open-ended: the store decides which tags exist, the client
/// only requires a short lowercase slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct CategoryTag(String);

impl CategoryTag {
    pub fn new(tag: impl Into<String>) -> ValidationResult<Self> {
        let tag = tag.into();
        validate_category_tag(&tag)?;
        Ok(CategoryTag(tag))
    }

    /// Listings offered for rent.
    pub fn rent() -> Self {
        CategoryTag("rent".to_string())
    }

    /// Listings offered for sale.
    pub fn sale() -> Self {
        CategoryTag("sale".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Listing
// =============================================================================

/// A real-estate listing as returned by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Store-assigned identifier (immutable).
    pub id: ListingId,

    /// Category tag.
    #[serde(rename = "type")]
    pub listing_type: CategoryTag,

    /// Whether the listing is a discounted offer.
    pub offer: bool,

    /// Owner of the listing (immutable).
    pub user_ref: UserId,

    /// Creation order key, assigned by the store. Pages are sorted on it.
    pub timestamp: DateTime<Utc>,

    /// Remaining listing fields (name, address, prices, images, ...).
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Listing {
    /// Compares two listings in newest-first order.
    ///
    /// Timestamps decide; equal timestamps fall back to the id (descending)
    /// so the order is total for a given store snapshot.
    pub fn cmp_newest_first(&self, other: &Listing) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.id.cmp(&self.id))
    }

    /// Returns a payload field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Display name of the listing, if the payload carries one.
    pub fn name(&self) -> Option<&str> {
        self.data.get("name").and_then(Value::as_str)
    }
}

/// Checks that `listings` is non-increasing by timestamp.
pub fn is_newest_first(listings: &[Listing]) -> bool {
    listings
        .windows(2)
        .all(|pair| pair[0].cmp_newest_first(&pair[1]) != Ordering::Greater)
}

// =============================================================================
// Users
// =============================================================================

/// A user's profile document in the document store (`users/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,

    /// Display name, mirrored from the identity store.
    pub name: String,

    /// Email, display-only here (the identity store is authoritative).
    pub email: String,
}

/// The signed-in user as the identity store sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
}
