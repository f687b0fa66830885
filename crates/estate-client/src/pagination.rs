//! # Cursor Pagination Engine
//!
//! Builds the page requests for one filter spec and advances the cursor as
//! pages come back.
//!
//! ## Cursor Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Paginator State Machine                             │
//! │                                                                         │
//! │  new(spec, limit)                                                      │
//! │     │  cursor: None, exhausted: false, started: false                  │
//! │     ▼                                                                   │
//! │  first_request()  ──► store ──► record(request, items)                 │
//! │     │                                                                   │
//! │     ├── items == limit   cursor = last item, more pages offered        │
//! │     ├── 0 < items < limit cursor = last item, exhausted                │
//! │     └── items == 0       cursor unchanged, exhausted                   │
//! │     ▼                                                                   │
//! │  next_request()   ──► Some(request after cursor) | None (exhausted)    │
//! │                                                                         │
//! │  restart()        ──► back to the first page                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every request carries the same filters, sort and limit; only the cursor
//! moves.

use std::cmp::Ordering;

use tracing::warn;

use estate_core::validation::ValidationResult;
use estate_core::{Cursor, FilterSpec, Listing, PageQuery, PageRequest};

/// Result of recording one fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// The listings to show, at most `limit` of them.
    pub listings: Vec<Listing>,

    /// True when the store returned fewer than `limit` listings.
    pub exhausted: bool,
}

/// Cursor state for one filter spec.
#[derive(Debug, Clone)]
pub struct Paginator {
    query: PageQuery,
    cursor: Option<Cursor>,
    started: bool,
    exhausted: bool,
}

impl Paginator {
    /// Creates a paginator for `spec`, newest first, `page_size` per page.
    pub fn new(spec: &FilterSpec, page_size: u32) -> ValidationResult<Self> {
        Ok(Paginator {
            query: PageQuery::for_spec(spec, page_size)?,
            cursor: None,
            started: false,
            exhausted: false,
        })
    }

    pub fn query(&self) -> &PageQuery {
        &self.query
    }

    pub fn limit(&self) -> u32 {
        self.query.limit()
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Forgets all progress so the next request is the first page again.
    pub fn restart(&mut self) {
        self.cursor = None;
        self.started = false;
        self.exhausted = false;
    }

    /// Request for the first page (no cursor).
    pub fn first_request(&self) -> PageRequest {
        self.query.first_page()
    }

    /// Request for the page after the cursor.
    ///
    /// `None` before the first page was recorded, after a short page, or
    /// when no cursor was ever set.
    pub fn next_request(&self) -> Option<PageRequest> {
        if !self.started || self.exhausted {
            return None;
        }

        self.cursor
            .as_ref()
            .map(|cursor| self.query.page_after(cursor.clone()))
    }

    /// Whether [`next_request`](Self::next_request) would return a request.
    pub fn has_more(&self) -> bool {
        self.started && !self.exhausted && self.cursor.is_some()
    }

    /// Records the listings returned for `request`.
    ///
    /// Extra items beyond the limit are dropped. The cursor moves to the
    /// last returned listing; an empty page leaves it where it was.
    pub fn record(&mut self, request: &PageRequest, mut listings: Vec<Listing>) -> FetchedPage {
        let limit = usize::try_from(self.query.limit()).unwrap_or(usize::MAX);

        if listings.len() > limit {
            warn!(
                returned = listings.len(),
                limit, "Store returned more listings than requested"
            );
            listings.truncate(limit);
        }

        let out_of_order = listings
            .windows(2)
            .any(|pair| self.query.compare(&pair[0], &pair[1]) == Ordering::Greater);
        let outside_request = listings.iter().any(|listing| !request.admits(listing));
        if out_of_order || outside_request {
            warn!(
                out_of_order,
                outside_request, "Store returned a page that does not match its request"
            );
        }

        self.started = true;
        self.exhausted = listings.len() < limit;
        if let Some(last) = listings.last() {
            self.cursor = Some(Cursor::after(last));
        }

        FetchedPage {
            listings,
            exhausted: self.exhausted,
        }
    }
}
