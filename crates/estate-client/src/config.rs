//! # Client Configuration
//!
//! Where the reference store lives and how many listings a page holds.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ESTATE_DB_PATH=/var/lib/estate/estate.db                           │
//! │     ESTATE_PAGE_SIZE=20                                                │
//! │     ESTATE_MAX_CONNECTIONS=8                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/estate/estate.toml (Linux)                               │
//! │     ~/Library/Application Support/com.estate.app/estate.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ./estate.db, 5 connections, 10 listings per page                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # estate.toml
//! [store]
//! database_path = "/var/lib/estate/estate.db"
//! max_connections = 5
//!
//! [paging]
//! page_size = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use estate_core::validation::validate_page_size;
use estate_core::DEFAULT_PAGE_SIZE;
use estate_db::DbConfig;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Store Settings
// =============================================================================

/// Reference store connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("estate.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            database_path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Paging Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingSettings {
    /// Listings per fetch, first page and load-more alike. Unset, every
    /// page asks for `DEFAULT_PAGE_SIZE` (10); a value here is an
    /// operator override.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PagingSettings {
    fn default() -> Self {
        PagingSettings {
            page_size: default_page_size(),
        }
    }
}

// =============================================================================
// Client Config
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub paging: PagingSettings,
}

impl ClientConfig {
    /// Default configuration backed by the given database file.
    pub fn with_database(path: impl Into<PathBuf>) -> Self {
        ClientConfig {
            store: StoreSettings {
                database_path: path.into(),
                ..StoreSettings::default()
            },
            ..Self::default()
        }
    }

    /// Loads configuration from file and environment.
    ///
    /// ## Loading Order
    /// 1. Start with defaults
    /// 2. Override with TOML file (if exists)
    /// 3. Override with environment variables
    /// 4. Validate final configuration
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads configuration, falling back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load client config, using defaults");
            Self::default()
        })
    }

    /// Writes the configuration as TOML.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    pub fn validate(&self) -> ClientResult<()> {
        validate_page_size(self.paging.page_size)
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        if self.store.max_connections == 0 {
            return Err(ClientError::InvalidConfig(
                "max_connections must be at least 1".into(),
            ));
        }

        if self.store.database_path.as_os_str().is_empty() {
            return Err(ClientError::InvalidConfig(
                "database_path cannot be empty".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `ESTATE_*` overrides read through `lookup`.
    ///
    /// Unparseable numbers are logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("ESTATE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.store.database_path = PathBuf::from(path);
        }

        if let Some(size) = lookup("ESTATE_PAGE_SIZE") {
            match size.parse::<u32>() {
                Ok(size) => {
                    debug!(page_size = size, "Overriding page size from environment");
                    self.paging.page_size = size;
                }
                Err(_) => warn!(value = %size, "Invalid ESTATE_PAGE_SIZE in environment"),
            }
        }

        if let Some(max) = lookup("ESTATE_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(max) => self.store.max_connections = max,
                Err(_) => warn!(value = %max, "Invalid ESTATE_MAX_CONNECTIONS in environment"),
            }
        }
    }

    /// `estate.toml` in the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "estate", "app")
            .map(|dirs| dirs.config_dir().join("estate.toml"))
    }

    /// Pool settings for the reference store.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.store.database_path.clone())
            .max_connections(self.store.max_connections)
    }

    pub fn page_size(&self) -> u32 {
        self.paging.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.page_size(), 10);
        assert_eq!(config.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(
            toml::from_str::<ClientConfig>("").unwrap().page_size(),
            DEFAULT_PAGE_SIZE
        );
        assert_eq!(config.store.max_connections, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.paging.page_size = 0;
        assert!(config.validate().unwrap_err().is_config_error());

        config.paging.page_size = 101;
        assert!(config.validate().is_err());

        config.paging.page_size = 100;
        assert!(config.validate().is_ok());

        config.store.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ESTATE_DB_PATH", "/tmp/other.db"),
            ("ESTATE_PAGE_SIZE", "25"),
            ("ESTATE_MAX_CONNECTIONS", "many"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.page_size(), 25);
        assert_eq!(config.store.max_connections, 5);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str("[paging]\npage_size = 20\n").unwrap();
        assert_eq!(config.page_size(), 20);
        assert_eq!(config.store, StoreSettings::default());
    }

    #[test]
    fn test_toml_serialization() {
        let config = ClientConfig::with_database("/data/estate.db");
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[paging]"));

        let parsed: ClientConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_db_config() {
        let mut config = ClientConfig::with_database("/data/estate.db");
        config.store.max_connections = 3;

        let db = config.db_config();
        assert_eq!(db.database_path, PathBuf::from("/data/estate.db"));
        assert_eq!(db.max_connections, 3);
    }
}
