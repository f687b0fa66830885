//! # estate-client: Listing Pages and Profile Sync
//!
//! The data-access layer behind the Category, Offers and Profile pages:
//! cursor-paginated listing fetches, local delete, and the display-name
//! dual write.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Estate Client Architecture                        │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 EstateClient (Composition Root)                  │  │
//! │  │  Opens the store, builds adapters, hands out page controllers    │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  ListingPage   │  │   Paginator    │  │  ProfileSync           │    │
//! │  │                │  │                │  │  ProfileEditor         │    │
//! │  │ Initial fetch  │─►│ Fixed filters, │  │                        │    │
//! │  │ Load more      │  │ newest first,  │  │ Identity write, then   │    │
//! │  │ Local delete   │  │ moving cursor  │  │ profile document write │    │
//! │  │ dispose()      │  │                │  │                        │    │
//! │  └───────┬────────┘  └────────────────┘  └───────────┬────────────┘    │
//! │          │                                           │                  │
//! │          ▼                                           ▼                  │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │ Ports: RemoteStore, IdentityStore, FailureReporter              │   │
//! │  │ Adapters: SqliteRemoteStore, SqliteIdentityStore (estate-db)    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`client`] - `EstateClient` and `init_tracing`
//! - [`config`] - Client configuration (database, page size)
//! - [`error`] - Store, identity and client error types
//! - [`listings`] - `ListingPage` controller
//! - [`pagination`] - Cursor engine
//! - [`profile`] - Session, profile sync and editor
//! - [`reporter`] - Failure reporter and user-facing messages
//! - [`store`] - Store ports
//! - [`adapters`] - SQLite implementations of the ports
//!
//! ## Usage
//!
//! ```rust,ignore
//! use estate_client::{ClientConfig, EstateClient};
//! use estate_core::CategoryTag;
//!
//! estate_client::init_tracing();
//! let client = EstateClient::open(ClientConfig::load_or_default(None)).await?;
//!
//! let page = client.category_page(CategoryTag::rent())?;
//! page.fetch_initial().await?;
//! while page.can_load_more().await {
//!     page.fetch_more().await?;
//! }
//! println!("{} listings", page.listings().await.len());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adapters;
pub mod client;
pub mod config;
pub mod error;
pub mod listings;
pub mod pagination;
pub mod profile;
pub mod reporter;
pub mod store;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use adapters::{SqliteIdentityStore, SqliteRemoteStore};
pub use client::{init_tracing, EstateClient};
pub use config::{ClientConfig, PagingSettings, StoreSettings};
pub use error::{AuthError, ClientError, ClientResult, StoreError, StoreResult};
pub use listings::{ListingPage, LoadOutcome, PageSnapshot, PageStatus};
pub use pagination::{FetchedPage, Paginator};
pub use profile::{CommitOutcome, ProfileEditor, ProfileForm, ProfileSync, Session, ToggleOutcome};
pub use reporter::{messages, FailureReporter, NoOpReporter, TracingReporter};
pub use store::{IdentityStore, RemoteStore};
