//! # Store Ports
//!
//! The two stores the client talks to, as object-safe async traits.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Ports                                        │
//! │                                                                         │
//! │  RemoteStore (document store)          IdentityStore                   │
//! │  ├── fetch_page(&request)              ├── update_display_name(id, n)  │
//! │  ├── update_record(coll, id, fields)   ├── sign_out()                  │
//! │  └── delete_record(coll, id)           └── current_user()              │
//! │                                                                         │
//! │  Implementations:                                                      │
//! │  ├── SqliteRemoteStore / SqliteIdentityStore  (adapters.rs)            │
//! │  └── scripted fakes                           (testing.rs, tests only) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ports hold no client state and never cache. Every call is a suspension
//! point for the controller that issues it.

use async_trait::async_trait;
use serde_json::{Map, Value};

use estate_core::{Collection, IdentityUser, Listing, PageRequest, UserId};

use crate::error::{AuthError, StoreResult};

/// Typed query and mutation interface over the remote document store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns at most `request.limit()` listings matching the request's
    /// filters, strictly after its cursor, in its sort order.
    async fn fetch_page(&self, request: &PageRequest) -> StoreResult<Vec<Listing>>;

    /// Merges `fields` into the record `collection/id`.
    async fn update_record(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> StoreResult<()>;

    /// Removes the record `collection/id`.
    async fn delete_record(&self, collection: Collection, id: &str) -> StoreResult<()>;
}

/// The authoritative store for user identity attributes.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Sets the display name of the signed-in user.
    async fn update_display_name(&self, user_id: &UserId, name: &str) -> Result<(), AuthError>;

    /// Ends the current session.
    async fn sign_out(&self);

    /// The signed-in user, if any.
    async fn current_user(&self) -> Option<IdentityUser>;
}
