//! # Listing Collection Controller
//!
//! Owns the listing sequence of one page (Category, Offers or Profile) and
//! the fetches that fill it.
//!
//! ## Page States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ListingPage                                     │
//! │                                                                         │
//! │   fetch_initial()                                                      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌─────────┐  ok, n > 0   ┌─────────┐  fetch_more() ok  ┌─────────┐  │
//! │   │ Loading │ ───────────► │ Loaded  │ ────────────────► │ Loaded  │  │
//! │   └─────────┘              └─────────┘   (appended)      └─────────┘  │
//! │     │    ▲                                                              │
//! │     │    └── error: reported, stays Loading (user retries)             │
//! │     │                                                                   │
//! │     └──── ok, n == 0 ───► ┌─────────┐                                  │
//! │                           │  Empty  │   fetch_more() unavailable       │
//! │                           └─────────┘                                  │
//! │                                                                         │
//! │   delete_listing(id): remote delete first, local removal on success;   │
//! │                       ids deleted mid-load are dropped from its page   │
//! │   dispose():          later responses are dropped without a trace      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! State sits behind a `tokio::sync::Mutex` that is never held across a
//! store call. The liveness flag is checked after every store call, before
//! any state is touched. One load (initial or more) runs at a time; a second
//! request while one is in flight is skipped without a store call.
//!
//! A load-more keeps the page `Loaded` while it runs; the in-flight phase is
//! visible through [`PageSnapshot::loading`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use estate_core::{Collection, Cursor, FilterSpec, Listing, ListingId};

use crate::error::{ClientError, ClientResult};
use crate::pagination::Paginator;
use crate::reporter::{messages, FailureReporter};
use crate::store::RemoteStore;

// =============================================================================
// Public Types
// =============================================================================

/// Lifecycle state of a listing page.
///
/// Only the initial fetch moves the page back to `Loading`. While a
/// load-more is in flight the status stays `Loaded` so the current listings
/// remain on screen; check [`PageSnapshot::loading`] for that phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    /// Initial fetch pending, in flight, or failed.
    Loading,
    /// At least one listing fetched.
    Loaded,
    /// The initial fetch returned nothing.
    Empty,
}

/// What a fetch call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was updated with `added` listings.
    Applied { added: usize, exhausted: bool },
    /// Nothing to do (disposed, exhausted, not loaded, or a load in flight).
    /// No store call was issued.
    Skipped,
    /// The page was disposed while the fetch was in flight; the response
    /// was dropped.
    Discarded,
}

/// Point-in-time copy of a page for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct PageSnapshot {
    pub status: PageStatus,
    pub listings: Vec<Listing>,
    pub can_load_more: bool,
    /// A fetch (initial or load-more) is in flight.
    pub loading: bool,
}

// =============================================================================
// Listing Page
// =============================================================================

struct PageState {
    status: PageStatus,
    listings: Vec<Listing>,
    paginator: Paginator,
    in_flight: bool,
    /// Ids removed while the current load was in flight.
    deleted_while_loading: HashSet<ListingId>,
}

impl PageState {
    fn can_load_more(&self) -> bool {
        self.status == PageStatus::Loaded && !self.in_flight && self.paginator.has_more()
    }

    fn begin_load(&mut self) {
        self.in_flight = true;
        self.deleted_while_loading.clear();
    }

    /// Ends the current load, returning the ids deleted while it ran.
    fn finish_load(&mut self) -> HashSet<ListingId> {
        self.in_flight = false;
        std::mem::take(&mut self.deleted_while_loading)
    }
}

fn without_deleted(mut listings: Vec<Listing>, deleted: &HashSet<ListingId>) -> Vec<Listing> {
    if !deleted.is_empty() {
        listings.retain(|listing| !deleted.contains(&listing.id));
    }
    listings
}

struct PageInner {
    spec: FilterSpec,
    store: Arc<dyn RemoteStore>,
    reporter: Arc<dyn FailureReporter>,
    live: AtomicBool,
    state: Mutex<PageState>,
}

/// Controller for one page's listing sequence.
///
/// Cloning yields another handle to the same page.
#[derive(Clone)]
pub struct ListingPage {
    inner: Arc<PageInner>,
}

impl std::fmt::Debug for ListingPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingPage")
            .field("spec", &self.inner.spec)
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}

impl ListingPage {
    /// Creates a page in `Loading` state for a fixed filter spec.
    pub fn new(
        spec: FilterSpec,
        page_size: u32,
        store: Arc<dyn RemoteStore>,
        reporter: Arc<dyn FailureReporter>,
    ) -> ClientResult<Self> {
        let paginator = Paginator::new(&spec, page_size)?;

        Ok(ListingPage {
            inner: Arc::new(PageInner {
                spec,
                store,
                reporter,
                live: AtomicBool::new(true),
                state: Mutex::new(PageState {
                    status: PageStatus::Loading,
                    listings: Vec::new(),
                    paginator,
                    in_flight: false,
                    deleted_while_loading: HashSet::new(),
                }),
            }),
        })
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.inner.spec
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Fetches the first page.
    ///
    /// On success the page becomes `Loaded` (or `Empty`) and holds exactly
    /// the fetched listings. On failure the error is reported with
    /// "Couldn't find listings" and the page stays `Loading`; calling this
    /// again retries.
    pub async fn fetch_initial(&self) -> ClientResult<LoadOutcome> {
        if !self.is_live() {
            return Ok(LoadOutcome::Skipped);
        }

        let request = {
            let mut state = self.inner.state.lock().await;
            if state.in_flight {
                debug!(spec = %self.inner.spec, "Load already in flight");
                return Ok(LoadOutcome::Skipped);
            }
            state.begin_load();
            state.status = PageStatus::Loading;
            state.paginator.restart();
            state.paginator.first_request()
        };

        debug!(spec = %self.inner.spec, limit = request.limit(), "Fetching first page");
        let result = self.inner.store.fetch_page(&request).await;

        if !self.is_live() {
            debug!(spec = %self.inner.spec, "Dropping first page of disposed page");
            return Ok(LoadOutcome::Discarded);
        }

        let mut state = self.inner.state.lock().await;
        let deleted = state.finish_load();

        match result {
            Ok(listings) => {
                let page = state.paginator.record(&request, listings);
                let listings = without_deleted(page.listings, &deleted);
                let added = listings.len();
                state.status = if listings.is_empty() {
                    PageStatus::Empty
                } else {
                    PageStatus::Loaded
                };
                state.listings = listings;

                info!(
                    spec = %self.inner.spec,
                    count = added,
                    exhausted = page.exhausted,
                    "First page loaded"
                );
                Ok(LoadOutcome::Applied {
                    added,
                    exhausted: page.exhausted,
                })
            }
            Err(e) => {
                drop(state);
                warn!(spec = %self.inner.spec, error = %e, "First page fetch failed");
                self.inner.reporter.report_error(messages::FETCH_INITIAL_FAILED);
                Err(e.into())
            }
        }
    }

    /// Fetches the page after the cursor and appends it.
    ///
    /// Only runs from `Loaded` with a live cursor and no load in flight;
    /// otherwise returns `Skipped` without calling the store. Listings are
    /// appended as returned, never replaced or deduplicated. On failure the
    /// error is reported with "Could not fetch listings" and the existing
    /// listings stay as they were.
    pub async fn fetch_more(&self) -> ClientResult<LoadOutcome> {
        if !self.is_live() {
            return Ok(LoadOutcome::Skipped);
        }

        let request = {
            let mut state = self.inner.state.lock().await;
            if !state.can_load_more() {
                return Ok(LoadOutcome::Skipped);
            }
            match state.paginator.next_request() {
                Some(request) => {
                    state.begin_load();
                    request
                }
                None => return Ok(LoadOutcome::Skipped),
            }
        };

        debug!(spec = %self.inner.spec, "Fetching next page");
        let result = self.inner.store.fetch_page(&request).await;

        if !self.is_live() {
            debug!(spec = %self.inner.spec, "Dropping next page of disposed page");
            return Ok(LoadOutcome::Discarded);
        }

        let mut state = self.inner.state.lock().await;
        let deleted = state.finish_load();

        match result {
            Ok(listings) => {
                let page = state.paginator.record(&request, listings);
                let listings = without_deleted(page.listings, &deleted);
                let added = listings.len();
                state.listings.extend(listings);

                info!(
                    spec = %self.inner.spec,
                    added,
                    total = state.listings.len(),
                    exhausted = page.exhausted,
                    "Next page appended"
                );
                Ok(LoadOutcome::Applied {
                    added,
                    exhausted: page.exhausted,
                })
            }
            Err(e) => {
                drop(state);
                warn!(spec = %self.inner.spec, error = %e, "Next page fetch failed");
                self.inner.reporter.report_error(messages::FETCH_MORE_FAILED);
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Deleting
    // =========================================================================

    /// Deletes a listing remotely, then removes it from the page.
    ///
    /// The local sequence changes only if the remote delete succeeded; the
    /// remaining listings keep their order. A load in flight at that moment
    /// drops the id from its response. Failures are reported with
    /// "Could not delete listing" and never retried.
    pub async fn delete_listing(&self, id: &ListingId) -> ClientResult<()> {
        if !self.is_live() {
            return Err(ClientError::Disposed);
        }

        debug!(spec = %self.inner.spec, id = %id, "Deleting listing");
        let result = self
            .inner
            .store
            .delete_record(Collection::Listings, id.as_str())
            .await;

        match result {
            Ok(()) => {
                if !self.is_live() {
                    debug!(id = %id, "Listing deleted after page was disposed");
                    return Ok(());
                }

                let remaining = {
                    let mut state = self.inner.state.lock().await;
                    if state.in_flight {
                        state.deleted_while_loading.insert(id.clone());
                    }
                    state.listings.retain(|listing| listing.id != *id);
                    state.listings.len()
                };

                info!(spec = %self.inner.spec, id = %id, remaining, "Listing deleted");
                self.inner.reporter.report_success(messages::DELETE_SUCCEEDED);
                Ok(())
            }
            Err(e) => {
                warn!(spec = %self.inner.spec, id = %id, error = %e, "Listing delete failed");
                if self.is_live() {
                    self.inner.reporter.report_error(messages::DELETE_FAILED);
                }
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Marks the page as gone. In-flight responses are dropped on arrival.
    pub fn dispose(&self) {
        if self.inner.live.swap(false, Ordering::SeqCst) {
            info!(spec = %self.inner.spec, "Listing page disposed");
        }
    }

    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn status(&self) -> PageStatus {
        self.inner.state.lock().await.status
    }

    pub async fn listings(&self) -> Vec<Listing> {
        self.inner.state.lock().await.listings.clone()
    }

    /// Position the next load-more starts after.
    pub async fn cursor(&self) -> Option<Cursor> {
        self.inner.state.lock().await.paginator.cursor().cloned()
    }

    /// Whether `fetch_more` would issue a store call right now.
    pub async fn can_load_more(&self) -> bool {
        self.is_live() && self.inner.state.lock().await.can_load_more()
    }

    pub async fn snapshot(&self) -> PageSnapshot {
        let live = self.is_live();
        let state = self.inner.state.lock().await;

        PageSnapshot {
            status: state.status,
            listings: state.listings.clone(),
            can_load_more: live && state.can_load_more(),
            loading: state.in_flight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::testing::{listing_at, newest_first, RecordingReporter, ScriptedStore};
    use estate_core::{is_newest_first, CategoryTag};

    fn page(store: &Arc<ScriptedStore>, reporter: &Arc<RecordingReporter>) -> ListingPage {
        ListingPage::new(
            FilterSpec::Category(CategoryTag::rent()),
            10,
            store.clone(),
            reporter.clone(),
        )
        .unwrap()
    }

    fn ids(listings: &[Listing]) -> Vec<String> {
        listings.iter().map(|l| l.id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_initial_fetch_of_full_page() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        let items = newest_first("A", 10, 1_000);
        store.push_fetch(Ok(items.clone()));
        let page = page(&store, &reporter);

        let outcome = page.fetch_initial().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Applied { added: 10, exhausted: false });
        assert_eq!(page.status().await, PageStatus::Loaded);
        assert_eq!(page.listings().await.len(), 10);
        assert!(is_newest_first(&page.listings().await));
        assert_eq!(page.cursor().await, Some(Cursor::after(&items[9])));
        assert!(page.can_load_more().await);

        let requests = store.fetch_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].after().is_none());
        assert_eq!(requests[0].limit(), 10);
    }

    #[tokio::test]
    async fn test_empty_initial_fetch() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        store.push_fetch(Ok(Vec::new()));
        let page = page(&store, &reporter);

        page.fetch_initial().await.unwrap();

        assert_eq!(page.status().await, PageStatus::Empty);
        assert!(page.cursor().await.is_none());
        assert!(!page.can_load_more().await);
        assert_eq!(page.fetch_more().await.unwrap(), LoadOutcome::Skipped);
        assert_eq!(store.fetch_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_short_load_more_appends_and_exhausts() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        let first = newest_first("A", 10, 1_000);
        let more = newest_first("B", 3, 900);
        store.push_fetch(Ok(first.clone()));
        store.push_fetch(Ok(more.clone()));
        let page = page(&store, &reporter);

        page.fetch_initial().await.unwrap();
        let outcome = page.fetch_more().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Applied { added: 3, exhausted: true });
        let listings = page.listings().await;
        assert_eq!(listings.len(), 13);
        assert_eq!(&listings[..10], &first[..]);
        assert_eq!(page.cursor().await, Some(Cursor::after(&more[2])));

        let requests = store.fetch_requests();
        assert_eq!(requests[1].after(), Some(&Cursor::after(&first[9])));
        assert_eq!(requests[1].query(), requests[0].query());

        assert_eq!(page.fetch_more().await.unwrap(), LoadOutcome::Skipped);
        assert_eq!(store.fetch_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_load_more_after_full_page_keeps_listings() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        let first = newest_first("A", 10, 1_000);
        store.push_fetch(Ok(first.clone()));
        store.push_fetch(Ok(Vec::new()));
        let page = page(&store, &reporter);

        page.fetch_initial().await.unwrap();
        assert!(page.can_load_more().await);
        let outcome = page.fetch_more().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Applied { added: 0, exhausted: true });
        assert_eq!(page.listings().await, first);
        assert_eq!(page.status().await, PageStatus::Loaded);
        assert!(!page.can_load_more().await);

        assert_eq!(page.fetch_more().await.unwrap(), LoadOutcome::Skipped);
        assert_eq!(store.fetch_requests().len(), 2);
        assert!(reporter.errors().is_empty());
    }

    #[tokio::test]
    async fn test_appended_items_are_not_newer_than_previous_last() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        store.push_fetch(Ok(newest_first("A", 10, 1_000)));
        store.push_fetch(Ok(newest_first("B", 10, 990)));
        store.push_fetch(Ok(newest_first("C", 4, 980)));
        let page = page(&store, &reporter);

        page.fetch_initial().await.unwrap();
        let mut last_before = page.listings().await.last().unwrap().timestamp;
        while let LoadOutcome::Applied { added, .. } = page.fetch_more().await.unwrap() {
            let listings = page.listings().await;
            for listing in &listings[listings.len() - added..] {
                assert!(listing.timestamp <= last_before);
            }
            last_before = listings.last().unwrap().timestamp;
        }

        assert_eq!(page.listings().await.len(), 24);
    }

    #[tokio::test]
    async fn test_initial_failure_is_reported_and_stays_loading() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        store.push_fetch(Err(StoreError::Transient("offline".into())));
        let page = page(&store, &reporter);

        let err = page.fetch_initial().await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(page.status().await, PageStatus::Loading);
        assert_eq!(reporter.errors(), vec![messages::FETCH_INITIAL_FAILED]);
        assert_eq!(page.fetch_more().await.unwrap(), LoadOutcome::Skipped);

        store.push_fetch(Ok(newest_first("A", 2, 1_000)));
        page.fetch_initial().await.unwrap();
        assert_eq!(page.status().await, PageStatus::Loaded);
    }

    #[tokio::test]
    async fn test_load_more_failure_keeps_listings() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        store.push_fetch(Ok(newest_first("A", 10, 1_000)));
        store.push_fetch(Err(StoreError::Transient("offline".into())));
        let page = page(&store, &reporter);

        page.fetch_initial().await.unwrap();
        let before = page.listings().await;
        assert!(page.fetch_more().await.is_err());

        assert_eq!(page.listings().await, before);
        assert_eq!(page.status().await, PageStatus::Loaded);
        assert_eq!(reporter.errors(), vec![messages::FETCH_MORE_FAILED]);
        assert!(page.can_load_more().await);
    }

    #[tokio::test]
    async fn test_delete_removes_only_that_listing() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        let items = vec![
            listing_at("L0", 50),
            listing_at("L1", 40),
            listing_at("L2", 30),
            listing_at("L3", 20),
            listing_at("L4", 10),
        ];
        store.push_fetch(Ok(items));
        let page = page(&store, &reporter);
        page.fetch_initial().await.unwrap();

        page.delete_listing(&ListingId::new("L1").unwrap())
            .await
            .unwrap();

        assert_eq!(ids(&page.listings().await), vec!["L0", "L2", "L3", "L4"]);
        assert_eq!(reporter.successes(), vec![messages::DELETE_SUCCEEDED]);
        assert_eq!(store.deleted(), vec![(Collection::Listings, "L1".to_string())]);
    }

    #[tokio::test]
    async fn test_delete_during_refetch_is_not_resurrected() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        let items = newest_first("A", 5, 100);
        store.push_fetch(Ok(items.clone()));
        store.push_fetch(Ok(items));
        let page = page(&store, &reporter);
        page.fetch_initial().await.unwrap();

        let gate = store.hold_fetches();
        let task = tokio::spawn({
            let page = page.clone();
            async move { page.fetch_initial().await }
        });
        gate.entered().await;
        page.delete_listing(&ListingId::new("A1").unwrap())
            .await
            .unwrap();
        gate.release();

        assert_eq!(
            task.await.unwrap().unwrap(),
            LoadOutcome::Applied { added: 4, exhausted: true }
        );
        assert_eq!(ids(&page.listings().await), vec!["A0", "A2", "A3", "A4"]);
        assert_eq!(page.status().await, PageStatus::Loaded);
        assert_eq!(reporter.successes(), vec![messages::DELETE_SUCCEEDED]);
    }

    #[tokio::test]
    async fn test_delete_during_load_more_drops_it_from_the_appended_page() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        store.push_fetch(Ok(newest_first("A", 10, 1_000)));
        store.push_fetch(Ok(newest_first("B", 3, 900)));
        store.push_fetch(Ok(newest_first("C", 2, 800)));
        let page = page(&store, &reporter);
        page.fetch_initial().await.unwrap();

        let gate = store.hold_fetches();
        let task = tokio::spawn({
            let page = page.clone();
            async move { page.fetch_more().await }
        });
        gate.entered().await;
        page.delete_listing(&ListingId::new("B1").unwrap())
            .await
            .unwrap();
        gate.release();

        assert_eq!(
            task.await.unwrap().unwrap(),
            LoadOutcome::Applied { added: 2, exhausted: true }
        );
        let listings = ids(&page.listings().await);
        assert_eq!(listings.len(), 12);
        assert_eq!(&listings[10..], &["B0", "B2"]);
        assert_eq!(page.cursor().await.unwrap().id().as_str(), "B2");
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_page_unchanged() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        store.push_fetch(Ok(newest_first("L", 5, 100)));
        store.push_delete(Err(StoreError::NotFound {
            collection: "listings".into(),
            id: "L2".into(),
        }));
        store.push_delete(Err(StoreError::Transient("offline".into())));
        let page = page(&store, &reporter);
        page.fetch_initial().await.unwrap();
        let before = page.listings().await;

        let id = before[2].id.clone();
        let err = page.delete_listing(&id).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(page.delete_listing(&id).await.is_err());

        assert_eq!(page.listings().await, before);
        assert_eq!(
            reporter.errors(),
            vec![messages::DELETE_FAILED, messages::DELETE_FAILED]
        );
        assert_eq!(store.deleted().len(), 2);
    }

    #[tokio::test]
    async fn test_response_after_dispose_is_discarded() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        store.push_fetch(Ok(newest_first("A", 10, 1_000)));
        let gate = store.hold_fetches();
        let page = page(&store, &reporter);

        let task = tokio::spawn({
            let page = page.clone();
            async move { page.fetch_initial().await }
        });
        gate.entered().await;
        page.dispose();
        gate.release();

        assert_eq!(task.await.unwrap().unwrap(), LoadOutcome::Discarded);
        assert!(!page.is_live());
        assert_eq!(page.status().await, PageStatus::Loading);
        assert!(page.listings().await.is_empty());
    }

    #[tokio::test]
    async fn test_disposed_page_issues_no_store_calls() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        let page = page(&store, &reporter);
        page.dispose();

        assert_eq!(page.fetch_initial().await.unwrap(), LoadOutcome::Skipped);
        assert!(matches!(
            page.delete_listing(&ListingId::new("L1").unwrap()).await,
            Err(ClientError::Disposed)
        ));
        assert!(store.fetch_requests().is_empty());
        assert!(store.deleted().is_empty());
        assert!(!page.snapshot().await.can_load_more);
    }

    #[tokio::test]
    async fn test_load_more_while_in_flight_is_skipped() {
        let store = Arc::new(ScriptedStore::new());
        let reporter = Arc::new(RecordingReporter::default());
        store.push_fetch(Ok(newest_first("A", 10, 1_000)));
        store.push_fetch(Ok(newest_first("B", 10, 900)));
        let page = page(&store, &reporter);
        page.fetch_initial().await.unwrap();

        let gate = store.hold_fetches();
        let task = tokio::spawn({
            let page = page.clone();
            async move { page.fetch_more().await }
        });
        gate.entered().await;

        let snapshot = page.snapshot().await;
        assert!(snapshot.loading);
        assert_eq!(snapshot.status, PageStatus::Loaded);
        assert!(!snapshot.can_load_more);
        assert_eq!(page.fetch_more().await.unwrap(), LoadOutcome::Skipped);

        gate.release();
        assert_eq!(
            task.await.unwrap().unwrap(),
            LoadOutcome::Applied { added: 10, exhausted: false }
        );
        assert_eq!(store.fetch_requests().len(), 2);
        assert_eq!(page.listings().await.len(), 20);
    }
}
