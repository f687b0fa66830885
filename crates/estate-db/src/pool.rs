//! # Reference Store Connection
//!
//! Opens the SQLite file (or an in-memory database for tests), applies the
//! embedded migrations and hands out repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ClientConfig::db_config()   seed --db <path>   DbConfig::in_memory()  │
//! │            │                        │                     │             │
//! │            └────────────┬───────────┴─────────────────────┘             │
//! │                         ▼                                               │
//! │              Database::new(config)                                      │
//! │                 ├── file:   WAL, NORMAL sync, FK on, create if missing  │
//! │                 ├── memory: one pinned connection, FK on                │
//! │                 └── migrations/sqlite applied                           │
//! │                         │                                               │
//! │          ┌──────────────┼──────────────┐                                │
//! │          ▼              ▼              ▼                                │
//! │     listings()       users()     identities()                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::identity::IdentityRepository;
use crate::repository::listing::ListingRepository;
use crate::repository::user::UserRepository;

/// Path that selects a private in-memory database.
const MEMORY_PATH: &str = ":memory:";

/// How long a caller waits for a free connection before `PoolExhausted`.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Idle file connections are closed after this long.
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

// =============================================================================
// Configuration
// =============================================================================

/// Where the reference store lives and how many connections it may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// SQLite file, created on first open.
    pub database_path: PathBuf,

    /// Pool size. Default: 5
    pub max_connections: u32,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// A fresh in-memory database per `Database`.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(MEMORY_PATH)
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        if self.is_in_memory() {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
            return Ok(options.foreign_keys(true));
        }

        Ok(SqliteConnectOptions::new()
            .filename(&self.database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(ACQUIRE_TIMEOUT);

        // An in-memory database dies with its last connection.
        if self.is_in_memory() {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options
                .max_connections(self.max_connections)
                .idle_timeout(Some(IDLE_TIMEOUT))
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the reference store. Clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the store and brings its schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening reference store"
        );

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(in_memory = config.is_in_memory(), "Pool connected");

        migrations::run_migrations(&pool).await?;

        Ok(Database { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn listings(&self) -> ListingRepository {
        ListingRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn identities(&self) -> IdentityRepository {
        IdentityRepository::new(self.pool.clone())
    }

    /// Closes the pool. Later repository calls fail with
    /// `DbError::ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing reference store");
        self.pool.close().await;
    }
}
