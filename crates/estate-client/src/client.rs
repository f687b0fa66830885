//! # Estate Client
//!
//! Composition root: opens the reference store, builds the adapters and
//! hands out one controller per page.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         EstateClient                                    │
//! │                                                                         │
//! │  ClientConfig ──► Database ──┬──► SqliteRemoteStore ───┐                │
//! │                              └──► SqliteIdentityStore ─┤                │
//! │                                                        ▼                │
//! │  category_page(tag)        ──► ListingPage { type == tag }             │
//! │  offers_page()             ──► ListingPage { offer == true }           │
//! │  owned_listings_page(s)    ──► ListingPage { userRef == s.user_id }    │
//! │  profile_editor(s)         ──► ProfileEditor (+ owned listings page)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use estate_core::{CategoryTag, FilterSpec, UserId};
use estate_db::Database;

use crate::adapters::{SqliteIdentityStore, SqliteRemoteStore};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::listings::ListingPage;
use crate::profile::{ProfileEditor, ProfileSync, Session};
use crate::reporter::{FailureReporter, TracingReporter};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Does nothing if the host already installed one.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,estate=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Entry point for page-level code.
pub struct EstateClient {
    config: ClientConfig,
    db: Database,
    store: Arc<SqliteRemoteStore>,
    identity: Arc<SqliteIdentityStore>,
    reporter: Arc<dyn FailureReporter>,
}

impl EstateClient {
    /// Opens the configured database, reporting through tracing.
    pub async fn open(config: ClientConfig) -> ClientResult<Self> {
        Self::open_with_reporter(config, Arc::new(TracingReporter)).await
    }

    /// Opens the configured database with a custom reporter.
    pub async fn open_with_reporter(
        config: ClientConfig,
        reporter: Arc<dyn FailureReporter>,
    ) -> ClientResult<Self> {
        config.validate()?;
        let db = Database::new(config.db_config()).await?;

        info!(
            path = %config.store.database_path.display(),
            page_size = config.page_size(),
            "Estate client opened"
        );
        Ok(Self::with_database(config, db, reporter))
    }

    /// Builds a client over an already open database.
    pub fn with_database(
        config: ClientConfig,
        db: Database,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        EstateClient {
            store: Arc::new(SqliteRemoteStore::new(db.clone())),
            identity: Arc::new(SqliteIdentityStore::new(db.clone())),
            config,
            db,
            reporter,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Signs in a registered user and returns their session.
    pub async fn sign_in(&self, user_id: &UserId) -> ClientResult<Session> {
        let user = self.identity.sign_in(user_id).await?;
        Ok(Session::from(user))
    }

    /// Listings of one category, newest first.
    pub fn category_page(&self, tag: CategoryTag) -> ClientResult<ListingPage> {
        self.page(FilterSpec::Category(tag))
    }

    /// Discounted listings, newest first.
    pub fn offers_page(&self) -> ClientResult<ListingPage> {
        self.page(FilterSpec::Offers)
    }

    /// The session user's own listings, newest first.
    pub fn owned_listings_page(&self, session: &Session) -> ClientResult<ListingPage> {
        self.page(FilterSpec::Owner(session.user_id().clone()))
    }

    /// Profile editor for the session, with its own listings page.
    pub fn profile_editor(&self, session: Session) -> ClientResult<ProfileEditor> {
        let listings = self.owned_listings_page(&session)?;
        let sync = ProfileSync::new(
            self.identity.clone(),
            self.store.clone(),
            self.reporter.clone(),
        );

        Ok(ProfileEditor::new(
            session,
            sync,
            self.identity.clone(),
            listings,
        ))
    }

    /// Closes the pool. Pages handed out earlier fail their next call.
    pub async fn close(&self) {
        self.db.close().await;
        info!("Estate client closed");
    }

    fn page(&self, spec: FilterSpec) -> ClientResult<ListingPage> {
        ListingPage::new(
            spec,
            self.config.page_size(),
            self.store.clone(),
            self.reporter.clone(),
        )
    }
}
