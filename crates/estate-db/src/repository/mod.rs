//! # Repository Module
//!
//! Database repository implementations for the Estate reference store.
//!
//! ## Repository Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories                                         │
//! │                                                                         │
//! │  Document store                                                        │
//! │  ├── ListingRepository                                                 │
//! │  │   ├── fetch_page(&request)       keyset page, newest first          │
//! │  │   ├── get_by_id / create / insert                                   │
//! │  │   ├── update_fields(&id, &fields)                                   │
//! │  │   └── delete(&id)                                                   │
//! │  └── UserRepository                                                    │
//! │      ├── get / insert                                                  │
//! │      └── update_fields(&id, &fields)                                   │
//! │                                                                         │
//! │  Identity store                                                        │
//! │  └── IdentityRepository                                                │
//! │      ├── get / insert                                                  │
//! │      └── update_display_name(&id, name)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`listing::ListingRepository`] - Listing pages, reads, deletes and partial updates
//! - [`user::UserRepository`] - Public profile documents
//! - [`identity::IdentityRepository`] - Identity records (display name, email)

pub mod identity;
pub mod listing;
pub mod user;

use serde_json::{Map, Value};

use crate::error::{DbError, DbResult};

/// Parses a JSON object stored in a `data` column.
pub(crate) fn decode_data(entity: &str, id: &str, raw: &str) -> DbResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DbError::corrupt(
            entity,
            id,
            format!("data is not an object: {other}"),
        )),
        Err(e) => Err(DbError::corrupt(entity, id, e)),
    }
}

/// Serializes a `data` column value.
pub(crate) fn encode_data(data: &Map<String, Value>) -> String {
    Value::Object(data.clone()).to_string()
}
