//! # Listing Repository
//!
//! Database operations for listings.
//!
//! ## Key Operations
//! - Keyset page reads (filters, newest first, limit, cursor)
//! - Point reads, inserts and deletes
//! - Partial updates merged into the listing document
//!
//! ## Page Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 PageRequest → SQL                                       │
//! │                                                                         │
//! │  filters  [offer == true]                                              │
//! │  cursor   (ts = 1700000000000, id = "L7")                              │
//! │  limit    10                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT ... FROM listings                                              │
//! │  WHERE 1 = 1                                                           │
//! │    AND offer = ?                                                       │
//! │    AND (timestamp_ms < ? OR (timestamp_ms = ? AND id < ?))             │
//! │  ORDER BY timestamp_ms DESC, id DESC                                   │
//! │  LIMIT ?                                                               │
//! │                                                                         │
//! │  Column names come from a fixed match on ListingField; only values     │
//! │  are bound.                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use estate_core::validation::validate_update_fields;
use estate_core::{
    CategoryTag, Collection, CoreError, FilterValue, Listing, ListingField, ListingId,
    PageRequest, UserId, ValidationError,
};

use super::{decode_data, encode_data};
use crate::error::{DbError, DbResult};

const SELECT_COLUMNS: &str =
    "SELECT id, listing_type, offer, user_ref, timestamp_ms, data FROM listings";

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct ListingRow {
    id: String,
    listing_type: String,
    offer: bool,
    user_ref: String,
    timestamp_ms: i64,
    data: String,
}

impl TryFrom<ListingRow> for Listing {
    type Error = DbError;

    fn try_from(row: ListingRow) -> DbResult<Self> {
        let corrupt = |reason: String| DbError::corrupt("Listing", row.id.as_str(), reason);

        let timestamp = DateTime::<Utc>::from_timestamp_millis(row.timestamp_ms)
            .ok_or_else(|| corrupt(format!("timestamp out of range: {}", row.timestamp_ms)))?;

        Ok(Listing {
            id: ListingId::new(row.id.as_str()).map_err(|e| corrupt(e.to_string()))?,
            listing_type: CategoryTag::new(row.listing_type.as_str())
                .map_err(|e| corrupt(e.to_string()))?,
            offer: row.offer,
            user_ref: UserId::new(row.user_ref.as_str()).map_err(|e| corrupt(e.to_string()))?,
            timestamp,
            data: decode_data("Listing", &row.id, &row.data)?,
        })
    }
}

/// A listing to create; the store assigns `id` and `timestamp`.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub listing_type: CategoryTag,
    pub offer: bool,
    pub user_ref: UserId,
    pub data: Map<String, Value>,
}

/// Column backing a listing field.
fn column(field: ListingField) -> &'static str {
    match field {
        ListingField::Type => "listing_type",
        ListingField::Offer => "offer",
        ListingField::UserRef => "user_ref",
        ListingField::Timestamp => "timestamp_ms",
    }
}

/// Drops sub-millisecond precision so a stored listing equals the one read back.
fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for listing database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ListingRepository::new(pool);
///
/// let query = PageQuery::for_spec(&FilterSpec::Category(CategoryTag::rent()), 10)?;
/// let first = repo.fetch_page(&query.first_page()).await?;
/// let next = repo
///     .fetch_page(&query.page_after(Cursor::after(first.last().unwrap())))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct ListingRepository {
    pool: SqlitePool,
}

impl ListingRepository {
    /// Creates a new ListingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ListingRepository { pool }
    }

    /// Fetches one page of listings.
    ///
    /// ## Returns
    /// At most `limit` listings matching every filter, strictly after the
    /// cursor (if any), ordered newest first by `(timestamp, id)`.
    pub async fn fetch_page(&self, request: &PageRequest) -> DbResult<Vec<Listing>> {
        let query = request.query();

        if query.collection() != Collection::Listings {
            return Err(CoreError::UnsupportedOperation {
                collection: query.collection().to_string(),
                operation: "paged reads".to_string(),
            }
            .into());
        }

        debug!(
            filters = query.filters().len(),
            limit = query.limit(),
            has_cursor = request.after().is_some(),
            "Fetching listing page"
        );

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        builder.push(" WHERE 1 = 1");

        for filter in query.filters() {
            builder
                .push(" AND ")
                .push(column(filter.field()))
                .push(" = ");
            match filter.value() {
                FilterValue::Text(text) => {
                    builder.push_bind(text.clone());
                }
                FilterValue::Bool(flag) => {
                    builder.push_bind(*flag);
                }
            }
        }

        if let Some(cursor) = request.after() {
            let ts = cursor.timestamp().timestamp_millis();
            builder
                .push(" AND (timestamp_ms < ")
                .push_bind(ts)
                .push(" OR (timestamp_ms = ")
                .push_bind(ts)
                .push(" AND id < ")
                .push_bind(cursor.id().as_str().to_string())
                .push("))");
        }

        builder
            .push(" ORDER BY timestamp_ms DESC, id DESC LIMIT ")
            .push_bind(i64::from(query.limit()));

        let rows: Vec<ListingRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        let listings = rows
            .into_iter()
            .map(Listing::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = listings.len(), "Listing page fetched");
        Ok(listings)
    }

    /// Gets a listing by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Listing))` - Listing found
    /// * `Ok(None)` - Listing not found
    pub async fn get_by_id(&self, id: &ListingId) -> DbResult<Option<Listing>> {
        let row: Option<ListingRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Listing::try_from).transpose()
    }

    /// Creates a listing, assigning a fresh id and the current time.
    pub async fn create(&self, new: NewListing) -> DbResult<Listing> {
        let listing = Listing {
            id: ListingId::generate(),
            listing_type: new.listing_type,
            offer: new.offer,
            user_ref: new.user_ref,
            timestamp: Utc::now(),
            data: new.data,
        };

        self.insert(&listing).await
    }

    /// Inserts a listing with caller-chosen id and timestamp (imports, seeding).
    ///
    /// ## Returns
    /// * `Ok(Listing)` - The listing as stored (timestamp at millisecond precision)
    /// * `Err(DbError::UniqueViolation)` - ID already exists
    pub async fn insert(&self, listing: &Listing) -> DbResult<Listing> {
        debug!(id = %listing.id, listing_type = %listing.listing_type, "Inserting listing");

        let stored = Listing {
            timestamp: truncate_to_millis(listing.timestamp),
            ..listing.clone()
        };

        sqlx::query(
            r#"
            INSERT INTO listings (id, listing_type, offer, user_ref, timestamp_ms, data)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.listing_type)
        .bind(stored.offer)
        .bind(&stored.user_ref)
        .bind(stored.timestamp.timestamp_millis())
        .bind(encode_data(&stored.data))
        .execute(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Applies a partial update to a listing.
    ///
    /// `type` and `offer` update their columns; any other key is merged into
    /// the listing document. `id`, `userRef` and `timestamp` are refused.
    ///
    /// ## Returns
    /// * `Ok(())` - Update committed
    /// * `Err(DbError::Rule)` - Empty update, immutable field or bad value
    /// * `Err(DbError::NotFound)` - Listing doesn't exist
    pub async fn update_fields(&self, id: &ListingId, fields: &Map<String, Value>) -> DbResult<()> {
        validate_update_fields(Collection::Listings, fields)?;

        debug!(id = %id, fields = fields.len(), "Updating listing fields");

        let mut tx = self.pool.begin().await?;

        let row: Option<ListingRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let mut listing = match row {
            Some(row) => Listing::try_from(row)?,
            None => return Err(DbError::not_found("Listing", id.as_str())),
        };

        for (key, value) in fields {
            match key.as_str() {
                "type" => {
                    let tag = value.as_str().ok_or_else(|| invalid_value("type", "expected a string"))?;
                    listing.listing_type = CategoryTag::new(tag).map_err(CoreError::from)?;
                }
                "offer" => {
                    listing.offer = value
                        .as_bool()
                        .ok_or_else(|| invalid_value("offer", "expected a boolean"))?;
                }
                _ => {
                    listing.data.insert(key.clone(), value.clone());
                }
            }
        }

        sqlx::query("UPDATE listings SET listing_type = ?2, offer = ?3, data = ?4 WHERE id = ?1")
            .bind(id)
            .bind(&listing.listing_type)
            .bind(listing.offer)
            .bind(encode_data(&listing.data))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a listing.
    ///
    /// ## Returns
    /// * `Ok(())` - Listing removed
    /// * `Err(DbError::NotFound)` - Listing doesn't exist
    pub async fn delete(&self, id: &ListingId) -> DbResult<()> {
        debug!(id = %id, "Deleting listing");

        let result = sqlx::query("DELETE FROM listings WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Listing", id.as_str()));
        }

        Ok(())
    }

    /// Counts all listings (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn invalid_value(field: &str, reason: &str) -> DbError {
    CoreError::from(ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    })
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use estate_core::{is_newest_first, Cursor, FilterSpec, PageQuery};
    use serde_json::json;

    fn listing(id: &str, tag: CategoryTag, offer: bool, owner: &str, secs: i64) -> Listing {
        let mut data = Map::new();
        data.insert("name".into(), json!(format!("Listing {id}")));
        Listing {
            id: ListingId::new(id).unwrap(),
            listing_type: tag,
            offer,
            user_ref: UserId::new(owner).unwrap(),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            data,
        }
    }

    /// 12 rent listings (ts 100..=111, every third one an offer) and 3 sale listings.
    async fn seeded() -> ListingRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.listings();

        for i in 0..12 {
            let item = listing(
                &format!("R{i:02}"),
                CategoryTag::rent(),
                i % 3 == 0,
                "U1",
                100 + i,
            );
            repo.insert(&item).await.unwrap();
        }
        for i in 0..3 {
            let item = listing(&format!("S{i}"), CategoryTag::sale(), false, "U2", 200 + i);
            repo.insert(&item).await.unwrap();
        }

        repo
    }

    fn ids(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_first_page_is_newest_first_and_bounded() {
        let repo = seeded().await;
        let query = PageQuery::for_spec(&FilterSpec::Category(CategoryTag::rent()), 10).unwrap();

        let page = repo.fetch_page(&query.first_page()).await.unwrap();

        assert_eq!(page.len(), 10);
        assert!(is_newest_first(&page));
        assert_eq!(page[0].id.as_str(), "R11");
        assert!(page.iter().all(|l| l.listing_type == CategoryTag::rent()));
    }

    #[tokio::test]
    async fn test_cursor_continues_without_overlap() {
        let repo = seeded().await;
        let query = PageQuery::for_spec(&FilterSpec::Category(CategoryTag::rent()), 10).unwrap();

        let first = repo.fetch_page(&query.first_page()).await.unwrap();
        let cursor = Cursor::after(first.last().unwrap());
        let second = repo.fetch_page(&query.page_after(cursor)).await.unwrap();

        assert_eq!(ids(&second), vec!["R01", "R00"]);
    }

    #[tokio::test]
    async fn test_cursor_survives_deleting_its_listing() {
        let repo = seeded().await;
        let query = PageQuery::for_spec(&FilterSpec::Category(CategoryTag::rent()), 5).unwrap();

        let first = repo.fetch_page(&query.first_page()).await.unwrap();
        let last = first.last().unwrap().clone();
        repo.delete(&last.id).await.unwrap();

        let second = repo
            .fetch_page(&query.page_after(Cursor::after(&last)))
            .await
            .unwrap();

        assert_eq!(ids(&second), vec!["R06", "R05", "R04", "R03", "R02"]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_page_by_id() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.listings();
        for id in ["A", "B", "C"] {
            repo.insert(&listing(id, CategoryTag::rent(), true, "U1", 500))
                .await
                .unwrap();
        }

        let query = PageQuery::for_spec(&FilterSpec::Offers, 2).unwrap();
        let first = repo.fetch_page(&query.first_page()).await.unwrap();
        let second = repo
            .fetch_page(&query.page_after(Cursor::after(first.last().unwrap())))
            .await
            .unwrap();

        assert_eq!(ids(&first), vec!["C", "B"]);
        assert_eq!(ids(&second), vec!["A"]);
    }

    #[tokio::test]
    async fn test_offer_and_owner_filters() {
        let repo = seeded().await;

        let offers = PageQuery::for_spec(&FilterSpec::Offers, 100).unwrap();
        let page = repo.fetch_page(&offers.first_page()).await.unwrap();
        assert_eq!(ids(&page), vec!["R09", "R06", "R03", "R00"]);

        let owner = PageQuery::for_spec(&FilterSpec::Owner(UserId::new("U2").unwrap()), 100).unwrap();
        let page = repo.fetch_page(&owner.first_page()).await.unwrap();
        assert_eq!(ids(&page), vec!["S2", "S1", "S0"]);
    }

    #[tokio::test]
    async fn test_users_collection_cannot_be_paged() {
        let repo = seeded().await;
        let query = PageQuery::new(
            Collection::Users,
            Vec::new(),
            ListingField::Timestamp,
            10,
        )
        .unwrap();

        let err = repo.fetch_page(&query.first_page()).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::UnsupportedOperation { .. })));
    }

    #[tokio::test]
    async fn test_delete_missing_listing_is_not_found() {
        let repo = seeded().await;
        let id = ListingId::new("R00").unwrap();

        repo.delete(&id).await.unwrap();
        assert!(repo.get_by_id(&id).await.unwrap().is_none());

        let err = repo.delete(&id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(repo.count().await.unwrap(), 14);
    }

    #[tokio::test]
    async fn test_update_fields_merges_into_document() {
        let repo = seeded().await;
        let id = ListingId::new("S0").unwrap();

        let mut fields = Map::new();
        fields.insert("offer".into(), json!(true));
        fields.insert("regularPrice".into(), json!(250_000));
        repo.update_fields(&id, &fields).await.unwrap();

        let stored = repo.get_by_id(&id).await.unwrap().unwrap();
        assert!(stored.offer);
        assert_eq!(stored.field("regularPrice"), Some(&json!(250_000)));
        assert_eq!(stored.name(), Some("Listing S0"));
    }

    #[tokio::test]
    async fn test_update_fields_refuses_immutable_keys() {
        let repo = seeded().await;
        let id = ListingId::new("S0").unwrap();

        let mut fields = Map::new();
        fields.insert("userRef".into(), json!("U9"));
        let err = repo.update_fields(&id, &fields).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::ImmutableField { .. })));

        let mut fields = Map::new();
        fields.insert("offer".into(), json!("yes"));
        assert!(repo.update_fields(&id, &fields).await.is_err());

        let stored = repo.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.user_ref.as_str(), "U2");
        assert!(!stored.offer);
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamp() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.listings();

        let created = repo
            .create(NewListing {
                listing_type: CategoryTag::sale(),
                offer: false,
                user_ref: UserId::new("U1").unwrap(),
                data: Map::new(),
            })
            .await
            .unwrap();

        let stored = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(stored, created);
    }
}
