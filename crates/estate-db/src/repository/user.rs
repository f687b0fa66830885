//! # User Repository
//!
//! Public profile documents (`users/{id}`).
//!
//! `name` and `email` are columns; anything else a client writes is kept in
//! the `data` document. The profile sync only ever writes `name`.

use serde_json::{Map, Value};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use estate_core::validation::validate_update_fields;
use estate_core::{Collection, CoreError, UserId, UserProfile, ValidationError};

use super::{decode_data, encode_data};
use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    data: String,
}

impl UserRow {
    fn into_parts(self) -> DbResult<(UserProfile, Map<String, Value>)> {
        let data = decode_data("User", &self.id, &self.data)?;
        let id = UserId::new(self.id.as_str())
            .map_err(|e| DbError::corrupt("User", self.id.as_str(), e))?;

        Ok((
            UserProfile {
                id,
                name: self.name,
                email: self.email,
            },
            data,
        ))
    }
}

/// Repository for user profile documents.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a profile by user ID.
    pub async fn get(&self, id: &UserId) -> DbResult<Option<UserProfile>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, name, email, data FROM users WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|row| row.into_parts().map(|(profile, _)| profile))
            .transpose()
    }


    /// Inserts a profile document.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - A profile with this ID exists
    pub async fn insert(&self, profile: &UserProfile) -> DbResult<()> {
        debug!(id = %profile.id, "Inserting user profile");

        sqlx::query("INSERT INTO users (id, name, email, data) VALUES (?1, ?2, ?3, '{}')")
            .bind(&profile.id)
            .bind(&profile.name)
            .bind(&profile.email)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Applies a partial update to a profile document.
    ///
    /// ## Returns
    /// * `Ok(())` - Update committed
    /// * `Err(DbError::Rule)` - Empty update, `id` touched, or non-string name/email
    /// * `Err(DbError::NotFound)` - No profile for this user
    pub async fn update_fields(&self, id: &UserId, fields: &Map<String, Value>) -> DbResult<()> {
        validate_update_fields(Collection::Users, fields)?;

        debug!(id = %id, fields = fields.len(), "Updating user fields");

        let mut tx = self.pool.begin().await?;

        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, name, email, data FROM users WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (mut profile, mut data) = match row {
            Some(row) => row.into_parts()?,
            None => return Err(DbError::not_found("User", id.as_str())),
        };

        for (key, value) in fields {
            match key.as_str() {
                "name" => profile.name = text_value("name", value)?,
                "email" => profile.email = text_value("email", value)?,
                _ => {
                    data.insert(key.clone(), value.clone());
                }
            }
        }

        sqlx::query("UPDATE users SET name = ?2, email = ?3, data = ?4 WHERE id = ?1")
            .bind(id)
            .bind(&profile.name)
            .bind(&profile.email)
            .bind(encode_data(&data))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn text_value(field: &str, value: &Value) -> DbResult<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        CoreError::from(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected a string".to_string(),
        })
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use serde_json::json;

    fn alice() -> UserProfile {
        UserProfile {
            id: UserId::new("U1").unwrap(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_update_name_keeps_other_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        repo.insert(&alice()).await.unwrap();

        let mut fields = Map::new();
        fields.insert("phone".into(), json!("555-0100"));
        repo.update_fields(&alice().id, &fields).await.unwrap();

        let mut fields = Map::new();
        fields.insert("name".into(), json!("Alicia"));
        repo.update_fields(&alice().id, &fields).await.unwrap();

        let stored = repo.get(&alice().id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Alicia");
        assert_eq!(stored.email, "alice@example.com");

        let data: String = sqlx::query_scalar("SELECT data FROM users WHERE id = ?1")
            .bind(&alice().id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        let document: Map<String, Value> = serde_json::from_str(&data).unwrap();
        assert_eq!(document.get("phone"), Some(&json!("555-0100")));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut fields = Map::new();
        fields.insert("name".into(), json!("Bob"));
        let err = db
            .users()
            .update_fields(&UserId::new("nobody").unwrap(), &fields)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_refuses_id_and_bad_types() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        repo.insert(&alice()).await.unwrap();

        let mut fields = Map::new();
        fields.insert("id".into(), json!("U2"));
        assert!(matches!(
            repo.update_fields(&alice().id, &fields).await,
            Err(DbError::Rule(CoreError::ImmutableField { .. }))
        ));

        let mut fields = Map::new();
        fields.insert("name".into(), json!(42));
        assert!(repo.update_fields(&alice().id, &fields).await.is_err());

        assert_eq!(repo.get(&alice().id).await.unwrap().unwrap(), alice());
    }

    #[tokio::test]
    async fn test_duplicate_insert() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().insert(&alice()).await.unwrap();

        let err = db.users().insert(&alice()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
