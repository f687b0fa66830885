//! Test doubles for the store ports and the reporter.
//!
//! The fakes share an [`EventLog`] so tests can check the order in which
//! calls started and finished across ports.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{Map, Value};
use tokio::sync::Notify;

use estate_core::{CategoryTag, Collection, IdentityUser, Listing, ListingId, PageRequest, UserId};

use crate::error::{AuthError, StoreError, StoreResult};
use crate::reporter::FailureReporter;
use crate::store::{IdentityStore, RemoteStore};

/// Rent offer owned by `U1`, created `secs` after the epoch.
pub fn listing_at(id: &str, secs: i64) -> Listing {
    Listing {
        id: ListingId::new(id).unwrap(),
        listing_type: CategoryTag::rent(),
        offer: true,
        user_ref: UserId::new("U1").unwrap(),
        timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        data: Map::new(),
    }
}

/// `count` listings named `{prefix}0..`, newest first, starting at `start`.
pub fn newest_first(prefix: &str, count: usize, start: i64) -> Vec<Listing> {
    (0..count)
        .map(|i| listing_at(&format!("{prefix}{i}"), start - i as i64))
        .collect()
}

/// Ordered record of port call boundaries, e.g. `"identity:end"`.
pub type EventLog = Arc<Mutex<Vec<String>>>;

fn log(events: &EventLog, event: &str) {
    events.lock().unwrap().push(event.to_string());
}

// =============================================================================
// Fetch Gate
// =============================================================================

/// Holds `fetch_page` calls until released.
#[derive(Debug, Default)]
pub struct FetchGate {
    entered: Notify,
    released: Notify,
}

impl FetchGate {
    /// Waits until a fetch is parked at the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the parked fetch continue.
    pub fn release(&self) {
        self.released.notify_one();
    }
}

// =============================================================================
// Scripted Remote Store
// =============================================================================

/// [`RemoteStore`] answering from queued results.
///
/// An empty queue answers `Ok` (an empty page for fetches).
#[derive(Default)]
pub struct ScriptedStore {
    fetches: Mutex<VecDeque<StoreResult<Vec<Listing>>>>,
    updates: Mutex<VecDeque<StoreResult<()>>>,
    deletes: Mutex<VecDeque<StoreResult<()>>>,
    fetch_requests: Mutex<Vec<PageRequest>>,
    updated: Mutex<Vec<(Collection, String, Map<String, Value>)>>,
    deleted: Mutex<Vec<(Collection, String)>>,
    gate: Mutex<Option<Arc<FetchGate>>>,
    events: EventLog,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: EventLog) -> Self {
        ScriptedStore {
            events,
            ..Self::default()
        }
    }

    pub fn push_fetch(&self, result: StoreResult<Vec<Listing>>) {
        self.fetches.lock().unwrap().push_back(result);
    }

    pub fn push_update(&self, result: StoreResult<()>) {
        self.updates.lock().unwrap().push_back(result);
    }

    pub fn push_delete(&self, result: StoreResult<()>) {
        self.deletes.lock().unwrap().push_back(result);
    }

    /// Parks every later fetch at the returned gate.
    pub fn hold_fetches(&self) -> Arc<FetchGate> {
        let gate = Arc::new(FetchGate::default());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn fetch_requests(&self) -> Vec<PageRequest> {
        self.fetch_requests.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(Collection, String, Map<String, Value>)> {
        self.updated.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<(Collection, String)> {
        self.deleted.lock().unwrap().clone()
    }

    /// Total number of calls of any kind.
    pub fn call_count(&self) -> usize {
        self.fetch_requests.lock().unwrap().len()
            + self.updated.lock().unwrap().len()
            + self.deleted.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteStore for ScriptedStore {
    async fn fetch_page(&self, request: &PageRequest) -> StoreResult<Vec<Listing>> {
        self.fetch_requests.lock().unwrap().push(request.clone());

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.released.notified().await;
        }

        self.fetches.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
    }

    async fn update_record(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> StoreResult<()> {
        log(&self.events, "document:start");
        self.updated
            .lock()
            .unwrap()
            .push((collection, id.to_string(), fields));
        tokio::task::yield_now().await;
        log(&self.events, "document:end");

        self.updates.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn delete_record(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.deleted
            .lock()
            .unwrap()
            .push((collection, id.to_string()));

        self.deletes.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

/// Delegates to `inner` but fails every update as transient.
pub struct FailingUpdates<S> {
    pub inner: S,
}

#[async_trait]
impl<S: RemoteStore> RemoteStore for FailingUpdates<S> {
    async fn fetch_page(&self, request: &PageRequest) -> StoreResult<Vec<Listing>> {
        self.inner.fetch_page(request).await
    }

    async fn update_record(
        &self,
        _collection: Collection,
        _id: &str,
        _fields: Map<String, Value>,
    ) -> StoreResult<()> {
        Err(StoreError::Transient("document store offline".into()))
    }

    async fn delete_record(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.inner.delete_record(collection, id).await
    }
}

// =============================================================================
// Recording Identity Store
// =============================================================================

/// [`IdentityStore`] that records writes and answers from a queue.
pub struct RecordingIdentity {
    current: Mutex<Option<IdentityUser>>,
    results: Mutex<VecDeque<Result<(), AuthError>>>,
    names: Mutex<Vec<(UserId, String)>>,
    sign_outs: Mutex<usize>,
    events: EventLog,
}

impl RecordingIdentity {
    pub fn signed_in(user: IdentityUser, events: EventLog) -> Self {
        RecordingIdentity {
            current: Mutex::new(Some(user)),
            results: Mutex::new(VecDeque::new()),
            names: Mutex::new(Vec::new()),
            sign_outs: Mutex::new(0),
            events,
        }
    }

    pub fn push_result(&self, result: Result<(), AuthError>) {
        self.results.lock().unwrap().push_back(result);
    }

    pub fn names(&self) -> Vec<(UserId, String)> {
        self.names.lock().unwrap().clone()
    }

    pub fn sign_outs(&self) -> usize {
        *self.sign_outs.lock().unwrap()
    }
}

#[async_trait]
impl IdentityStore for RecordingIdentity {
    async fn update_display_name(&self, user_id: &UserId, name: &str) -> Result<(), AuthError> {
        log(&self.events, "identity:start");
        self.names
            .lock()
            .unwrap()
            .push((user_id.clone(), name.to_string()));
        tokio::task::yield_now().await;

        let result = self.results.lock().unwrap().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            if let Some(user) = self.current.lock().unwrap().as_mut() {
                user.display_name = name.to_string();
            }
        }
        log(&self.events, "identity:end");

        result
    }

    async fn sign_out(&self) {
        *self.sign_outs.lock().unwrap() += 1;
        self.current.lock().unwrap().take();
    }

    async fn current_user(&self) -> Option<IdentityUser> {
        self.current.lock().unwrap().clone()
    }
}

// =============================================================================
// Recording Reporter
// =============================================================================

#[derive(Debug, Default)]
pub struct RecordingReporter {
    errors: Mutex<Vec<String>>,
    successes: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }
}

impl FailureReporter for RecordingReporter {
    fn report_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn report_success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }
}
