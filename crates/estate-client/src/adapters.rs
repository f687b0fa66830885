//! # SQLite Adapters
//!
//! Port implementations over the estate-db reference store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RemoteStore::fetch_page      → ListingRepository::fetch_page          │
//! │  RemoteStore::update_record   → ListingRepository / UserRepository     │
//! │                                  ::update_fields                       │
//! │  RemoteStore::delete_record   → ListingRepository::delete              │
//! │                                                                         │
//! │  IdentityStore::*             → IdentityRepository + signed-in user    │
//! │                                                                         │
//! │  DbError ──From──► StoreError / AuthError                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use estate_core::{Collection, CoreError, IdentityUser, Listing, ListingId, PageRequest, UserId};
use estate_db::{Database, DbError};

use crate::error::{AuthError, StoreError, StoreResult};
use crate::store::{IdentityStore, RemoteStore};

// =============================================================================
// Document Store
// =============================================================================

/// [`RemoteStore`] backed by the SQLite `listings` and `users` tables.
#[derive(Debug, Clone)]
pub struct SqliteRemoteStore {
    db: Database,
}

impl SqliteRemoteStore {
    pub fn new(db: Database) -> Self {
        SqliteRemoteStore { db }
    }
}

fn listing_id(id: &str) -> StoreResult<ListingId> {
    ListingId::new(id).map_err(|e| StoreError::Rejected(e.to_string()))
}

fn user_id(id: &str) -> StoreResult<UserId> {
    UserId::new(id).map_err(|e| StoreError::Rejected(e.to_string()))
}

#[async_trait]
impl RemoteStore for SqliteRemoteStore {
    async fn fetch_page(&self, request: &PageRequest) -> StoreResult<Vec<Listing>> {
        Ok(self.db.listings().fetch_page(request).await?)
    }

    async fn update_record(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> StoreResult<()> {
        debug!(%collection, id, "Updating record");

        match collection {
            Collection::Listings => {
                let id = listing_id(id)?;
                self.db.listings().update_fields(&id, &fields).await?;
            }
            Collection::Users => {
                let id = user_id(id)?;
                self.db.users().update_fields(&id, &fields).await?;
            }
        }

        Ok(())
    }

    async fn delete_record(&self, collection: Collection, id: &str) -> StoreResult<()> {
        debug!(%collection, id, "Deleting record");

        match collection {
            Collection::Listings => {
                let id = listing_id(id)?;
                self.db.listings().delete(&id).await?;
                Ok(())
            }
            Collection::Users => Err(DbError::from(CoreError::UnsupportedOperation {
                collection: collection.to_string(),
                operation: "delete".to_string(),
            })
            .into()),
        }
    }
}

// =============================================================================
// Identity Store
// =============================================================================

/// [`IdentityStore`] backed by the SQLite `identities` table.
///
/// Holds the signed-in user id; `sign_in` replaces it, `sign_out` clears it.
#[derive(Debug)]
pub struct SqliteIdentityStore {
    db: Database,
    signed_in: RwLock<Option<UserId>>,
}

impl SqliteIdentityStore {
    pub fn new(db: Database) -> Self {
        SqliteIdentityStore {
            db,
            signed_in: RwLock::new(None),
        }
    }

    /// Signs in a registered user.
    ///
    /// ## Returns
    /// * `Ok(IdentityUser)` - The user is now current
    /// * `Err(AuthError::Rejected)` - No identity with this id
    pub async fn sign_in(&self, user_id: &UserId) -> Result<IdentityUser, AuthError> {
        let user = self
            .db
            .identities()
            .get(user_id)
            .await?
            .ok_or_else(|| AuthError::Rejected(format!("unknown user {user_id}")))?;

        *self.signed_in.write().await = Some(user.id.clone());
        info!(user_id = %user.id, "Signed in");

        Ok(user)
    }
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn update_display_name(&self, user_id: &UserId, name: &str) -> Result<(), AuthError> {
        if self.signed_in.read().await.as_ref() != Some(user_id) {
            return Err(AuthError::NotSignedIn);
        }

        debug!(user_id = %user_id, "Updating display name");
        self.db
            .identities()
            .update_display_name(user_id, name)
            .await?;
        Ok(())
    }

    async fn sign_out(&self) {
        if let Some(user_id) = self.signed_in.write().await.take() {
            info!(user_id = %user_id, "Signed out");
        }
    }

    async fn current_user(&self) -> Option<IdentityUser> {
        let user_id = self.signed_in.read().await.clone()?;

        match self.db.identities().get(&user_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to read current user");
                None
            }
        }
    }
}
