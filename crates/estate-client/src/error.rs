//! # Client Error Types
//!
//! Error types for store ports, controllers and configuration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   StoreError    │  │   AuthError     │  │      ClientError        │ │
//! │  │  (RemoteStore)  │  │ (IdentityStore) │  │  (controllers, config)  │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Transient      │  │  Transient      │  │  Transient / NotFound   │ │
//! │  │  NotFound       │  │  NotSignedIn    │  │  Identity               │ │
//! │  │  Rejected       │  │  Rejected       │  │  PartialSync            │ │
//! │  └────────┬────────┘  └────────┬────────┘  │  Validation, Config...  │ │
//! │           │                    │           └─────────────────────────┘ │
//! │           └──────── From ──────┴──────────────────► ClientError         │
//! │                                                                         │
//! │  DbError ──From──► StoreError / AuthError  (SQLite adapters)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Controllers catch every store error, report it, and hand it back as a
//! `ClientError`. Nothing here panics.

use estate_core::{Collection, UserId, ValidationError};
use estate_db::DbError;
use thiserror::Error;

/// Result type alias for store port calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for controller operations.
pub type ClientResult<T> = Result<T, ClientError>;

// =============================================================================
// Port Errors
// =============================================================================

/// Failure reported by a [`RemoteStore`](crate::store::RemoteStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store unreachable or busy. The same call may succeed later.
    #[error("Store unavailable: {0}")]
    Transient(String),

    /// The record addressed by a delete or update does not exist.
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// The store refused the request (bad field, constraint, corrupt data).
    #[error("Store rejected the request: {0}")]
    Rejected(String),
}

/// Failure reported by an [`IdentityStore`](crate::store::IdentityStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Identity store unreachable or busy.
    #[error("Identity store unavailable: {0}")]
    Transient(String),

    /// No user is signed in, or a different user is.
    #[error("No user is signed in")]
    NotSignedIn,

    /// The identity store refused the request.
    #[error("Identity store rejected the request: {0}")]
    Rejected(String),
}

// =============================================================================
// Client Error
// =============================================================================

/// Error returned by controllers and the composition root.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Store Errors
    // =========================================================================
    /// Store unavailable. Reported; the user re-triggers the action.
    #[error("Store unavailable: {0}")]
    Transient(String),

    /// Record missing on delete or update. Local state is left untouched.
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// The store refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    // =========================================================================
    // Profile Errors
    // =========================================================================
    /// The identity store write failed; the document store was not touched.
    #[error("Identity update failed: {0}")]
    Identity(#[from] AuthError),

    /// The identity store holds the new name but the profile document
    /// still holds the old one.
    #[error("Profile of {user_id} partially synced: identity name is '{identity_name}' but the profile document was not updated: {source}")]
    PartialSync {
        user_id: UserId,
        identity_name: String,
        #[source]
        source: StoreError,
    },

    /// Input rejected before any store call.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    // =========================================================================
    // Controller Errors
    // =========================================================================
    /// The controller was disposed; no store call was issued.
    #[error("Listing page has been disposed")]
    Disposed,

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// Failed to open the reference database.
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

// =============================================================================
// Error Conversions
// =============================================================================

/// ## Error Mapping
/// ```text
/// DbError::NotFound                          → StoreError::NotFound (collection name)
/// DbError::ConnectionFailed / PoolExhausted  → StoreError::Transient
/// DbError::QueryFailed (locked / busy)       → StoreError::Transient
/// Other                                      → StoreError::Rejected
/// ```
impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::NotFound {
                collection: collection_of(entity),
                id,
            },
            err if err.is_transient() => StoreError::Transient(err.to_string()),
            err => StoreError::Rejected(err.to_string()),
        }
    }
}

/// Repository entity name to the collection it lives in.
fn collection_of(entity: String) -> String {
    match entity.as_str() {
        "Listing" => Collection::Listings.as_str().to_string(),
        "User" => Collection::Users.as_str().to_string(),
        _ => entity,
    }
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => AuthError::NotSignedIn,
            err if err.is_transient() => AuthError::Transient(err.to_string()),
            err => AuthError::Rejected(err.to_string()),
        }
    }
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transient(msg) => ClientError::Transient(msg),
            StoreError::NotFound { collection, id } => ClientError::NotFound { collection, id },
            StoreError::Rejected(msg) => ClientError::Rejected(msg),
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Returns true if the user may re-trigger the same action.
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Transient(_) | ClientError::Identity(AuthError::Transient(_))
        )
    }

    /// Returns true for the profile divergence left by a failed second phase.
    pub fn is_partial_sync(&self) -> bool {
        matches!(self, ClientError::PartialSync { .. })
    }

    /// Returns true if the addressed record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}
