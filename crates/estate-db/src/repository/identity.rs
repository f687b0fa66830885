//! # Identity Repository
//!
//! Local identity records: the authoritative display name and email of each
//! user. The client's identity store adapter reads and writes through here.

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use estate_core::{IdentityUser, UserId};

use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct IdentityRow {
    id: String,
    display_name: String,
    email: String,
}

impl TryFrom<IdentityRow> for IdentityUser {
    type Error = DbError;

    fn try_from(row: IdentityRow) -> DbResult<Self> {
        let id = UserId::new(row.id.as_str())
            .map_err(|e| DbError::corrupt("Identity", row.id.as_str(), e))?;

        Ok(IdentityUser {
            id,
            display_name: row.display_name,
            email: row.email,
        })
    }
}

/// Repository for identity records.
#[derive(Debug, Clone)]
pub struct IdentityRepository {
    pool: SqlitePool,
}

impl IdentityRepository {
    /// Creates a new IdentityRepository.
    pub fn new(pool: SqlitePool) -> Self {
        IdentityRepository { pool }
    }

    /// Gets an identity by user ID.
    pub async fn get(&self, id: &UserId) -> DbResult<Option<IdentityUser>> {
        let row: Option<IdentityRow> =
            sqlx::query_as("SELECT id, display_name, email FROM identities WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(IdentityUser::try_from).transpose()
    }

    /// Registers an identity.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - ID or email already registered
    pub async fn insert(&self, user: &IdentityUser) -> DbResult<()> {
        debug!(id = %user.id, "Inserting identity");

        sqlx::query("INSERT INTO identities (id, display_name, email) VALUES (?1, ?2, ?3)")
            .bind(&user.id)
            .bind(&user.display_name)
            .bind(&user.email)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Sets the display name of an identity.
    pub async fn update_display_name(&self, id: &UserId, display_name: &str) -> DbResult<()> {
        debug!(id = %id, "Updating identity display name");

        let result = sqlx::query("UPDATE identities SET display_name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(display_name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Identity", id.as_str()));
        }

        Ok(())
    }
}
