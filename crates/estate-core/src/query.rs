//! # Query Model
//!
//! Describes a bounded, filtered, ordered read of a document collection and
//! the cursor used to continue it.
//!
//! ## Keyset Pagination
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Page Request Is Built                          │
//! │                                                                         │
//! │  FilterSpec::Offers                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PageQuery { listings, [offer = true], timestamp DESC, limit 10 }      │
//! │       │                                                                 │
//! │       ├── first_page()         → PageRequest { after: None }           │
//! │       │                                                                 │
//! │       └── page_after(cursor)   → PageRequest { after: Some(cursor) }   │
//! │                                                                         │
//! │  Cursor = (timestamp, id) of the last listing of the previous page.    │
//! │  The next page holds listings strictly after it in sort order:         │
//! │                                                                         │
//! │    timestamp < c.timestamp  OR  (timestamp = c.timestamp AND id < c.id) │
//! │                                                                         │
//! │  The cursor is a pair of values, not a live reference, so deleting     │
//! │  the listing it was taken from does not invalidate it.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{CategoryTag, Listing, ListingId, UserId};
use crate::validation::{validate_page_size, ValidationResult};

// =============================================================================
// Collections
// =============================================================================

/// Document collections known to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Real-estate listings.
    Listings,
    /// Public user profile documents.
    Users,
}

impl Collection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Collection::Listings => "listings",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Fields & Filters
// =============================================================================

/// Listing fields that can appear in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingField {
    #[serde(rename = "type")]
    Type,
    #[serde(rename = "offer")]
    Offer,
    #[serde(rename = "userRef")]
    UserRef,
    #[serde(rename = "timestamp")]
    Timestamp,
}

impl ListingField {
    /// Field name as stored in documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            ListingField::Type => "type",
            ListingField::Offer => "offer",
            ListingField::UserRef => "userRef",
            ListingField::Timestamp => "timestamp",
        }
    }

    /// Whether the field supports equality filters.
    pub const fn is_filterable(self) -> bool {
        !matches!(self, ListingField::Timestamp)
    }

    /// Whether pages can be ordered on the field.
    pub const fn is_sortable(self) -> bool {
        matches!(self, ListingField::Timestamp)
    }
}

impl fmt::Display for ListingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of an equality filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(text) => f.write_str(text),
            FilterValue::Bool(flag) => write!(f, "{flag}"),
        }
    }
}

/// Exact-match predicate `field == value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    field: ListingField,
    value: FilterValue,
}

impl FieldFilter {
    /// Builds a filter, checking that the field is filterable and that the
    /// value has the field's type.
    pub fn new(field: ListingField, value: FilterValue) -> ValidationResult<Self> {
        if !field.is_filterable() {
            return Err(ValidationError::NotAllowed {
                field: "filter field".to_string(),
                allowed: vec!["type".into(), "offer".into(), "userRef".into()],
            });
        }

        let type_matches = matches!(
            (field, &value),
            (ListingField::Offer, FilterValue::Bool(_))
                | (ListingField::Type | ListingField::UserRef, FilterValue::Text(_))
        );
        if !type_matches {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: format!("unexpected filter value '{value}'"),
            });
        }

        Ok(FieldFilter { field, value })
    }

    /// `type == tag`
    pub fn category(tag: &CategoryTag) -> Self {
        FieldFilter {
            field: ListingField::Type,
            value: FilterValue::Text(tag.as_str().to_string()),
        }
    }

    /// `offer == true`
    pub fn offers() -> Self {
        FieldFilter {
            field: ListingField::Offer,
            value: FilterValue::Bool(true),
        }
    }

    /// `userRef == owner`
    pub fn owner(owner: &UserId) -> Self {
        FieldFilter {
            field: ListingField::UserRef,
            value: FilterValue::Text(owner.as_str().to_string()),
        }
    }

    pub fn field(&self) -> ListingField {
        self.field
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    /// Evaluates the predicate against a listing.
    pub fn matches(&self, listing: &Listing) -> bool {
        match (self.field, &self.value) {
            (ListingField::Type, FilterValue::Text(tag)) => listing.listing_type.as_str() == tag,
            (ListingField::Offer, FilterValue::Bool(flag)) => listing.offer == *flag,
            (ListingField::UserRef, FilterValue::Text(owner)) => listing.user_ref.as_str() == owner,
            _ => false,
        }
    }
}

impl fmt::Display for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} == {}", self.field, self.value)
    }
}

// =============================================================================
// Filter Spec
// =============================================================================

/// The fixed filter a listing page uses for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum FilterSpec {
    /// Listings of one category (`type == tag`).
    Category(CategoryTag),
    /// Discounted listings (`offer == true`).
    Offers,
    /// Listings owned by a user (`userRef == id`).
    Owner(UserId),
}

impl FilterSpec {
    /// The equality conjunction this spec stands for.
    ///
    /// Every fetch of a page, first or subsequent, uses exactly these filters.
    pub fn filters(&self) -> Vec<FieldFilter> {
        match self {
            FilterSpec::Category(tag) => vec![FieldFilter::category(tag)],
            FilterSpec::Offers => vec![FieldFilter::offers()],
            FilterSpec::Owner(owner) => vec![FieldFilter::owner(owner)],
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::Category(tag) => write!(f, "category:{tag}"),
            FilterSpec::Offers => f.write_str("offers"),
            FilterSpec::Owner(owner) => write!(f, "owner:{owner}"),
        }
    }
}

// =============================================================================
// Ordering & Cursor
// =============================================================================

/// Position after the last listing of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    timestamp: DateTime<Utc>,
    id: ListingId,
}

impl Cursor {
    pub fn new(timestamp: DateTime<Utc>, id: ListingId) -> Self {
        Cursor { timestamp, id }
    }

    /// Cursor pointing just past `listing`.
    pub fn after(listing: &Listing) -> Self {
        Cursor {
            timestamp: listing.timestamp,
            id: listing.id.clone(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn id(&self) -> &ListingId {
        &self.id
    }

    /// Whether `listing` sorts strictly after this cursor, newest first.
    pub fn precedes(&self, listing: &Listing) -> bool {
        (listing.timestamp, &listing.id) < (self.timestamp, &self.id)
    }
}

// =============================================================================
// Page Query
// =============================================================================

/// A bounded, filtered read of a collection, always newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    collection: Collection,
    filters: Vec<FieldFilter>,
    sort_field: ListingField,
    limit: u32,
}

impl PageQuery {
    /// Builds a query after validating the sort field and page size.
    pub fn new(
        collection: Collection,
        filters: Vec<FieldFilter>,
        sort_field: ListingField,
        limit: u32,
    ) -> ValidationResult<Self> {
        validate_page_size(limit)?;

        if !sort_field.is_sortable() {
            return Err(ValidationError::NotAllowed {
                field: "sort field".to_string(),
                allowed: vec![ListingField::Timestamp.to_string()],
            });
        }

        Ok(PageQuery {
            collection,
            filters,
            sort_field,
            limit,
        })
    }

    /// Newest-first listing query for a page's filter spec.
    pub fn for_spec(spec: &FilterSpec, limit: u32) -> ValidationResult<Self> {
        PageQuery::new(
            Collection::Listings,
            spec.filters(),
            ListingField::Timestamp,
            limit,
        )
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn sort_field(&self) -> ListingField {
        self.sort_field
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Whether a listing satisfies every filter.
    pub fn matches(&self, listing: &Listing) -> bool {
        self.filters.iter().all(|filter| filter.matches(listing))
    }

    /// Orders two listings the way this query returns them.
    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        a.cmp_newest_first(b)
    }

    /// Request for the first page (no cursor).
    pub fn first_page(&self) -> PageRequest {
        PageRequest {
            query: self.clone(),
            after: None,
        }
    }

    /// Request for the page following `cursor`.
    pub fn page_after(&self, cursor: Cursor) -> PageRequest {
        PageRequest {
            query: self.clone(),
            after: Some(cursor),
        }
    }
}

/// A page query plus the cursor to start after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    query: PageQuery,
    after: Option<Cursor>,
}

impl PageRequest {
    pub fn query(&self) -> &PageQuery {
        &self.query
    }

    pub fn after(&self) -> Option<&Cursor> {
        self.after.as_ref()
    }

    pub fn limit(&self) -> u32 {
        self.query.limit
    }

    /// Whether `listing` belongs in the page this request asks for
    /// (ignoring the limit).
    pub fn admits(&self, listing: &Listing) -> bool {
        self.query.matches(listing)
            && self
                .after
                .as_ref()
                .map_or(true, |cursor| cursor.precedes(listing))
    }
}
