//! Fetch-on-change listing subscription.
//!
//! A [`ListingFeed`] declares its input (a [`ListingQuery`]) and re-fetches
//! when that input changes. Every fetch takes a sequence token; when a newer
//! fetch has started by the time an older one resolves, the older result is
//! dropped so a slow response can never overwrite a faster, later one.

use crate::api::{ListingsApi, SearchParams};
use crate::error::Result;
use crate::models::Listing;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// What the listings view is currently asking for
#[derive(Debug, Clone, PartialEq)]
pub enum ListingQuery {
    /// `GET /listings`: featured plus everything
    All,
    /// `GET /listings/search` with the given parameters
    Search(SearchParams),
}

impl ListingQuery {
    pub fn location(location: impl Into<String>) -> Self {
        let location = location.into();
        if location.trim().is_empty() {
            ListingQuery::All
        } else {
            ListingQuery::Search(SearchParams::location(location))
        }
    }
}

/// Identifies one fetch; only the most recently issued token is current
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// Hands out increasing tokens and remembers the latest one
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn begin(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

/// Result of the latest accepted fetch
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub query: ListingQuery,
    pub featured: Vec<Listing>,
    pub listings: Vec<Listing>,
    pub fetched_at: DateTime<Utc>,
}

pub struct ListingFeed<A> {
    api: Arc<A>,
    sequencer: RequestSequencer,
    latest: Mutex<Option<FeedSnapshot>>,
}

impl<A: ListingsApi> ListingFeed<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            sequencer: RequestSequencer::default(),
            latest: Mutex::new(None),
        }
    }

    fn latest(&self) -> MutexGuard<'_, Option<FeedSnapshot>> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last accepted snapshot, if any fetch has completed
    pub fn snapshot(&self) -> Option<FeedSnapshot> {
        self.latest().clone()
    }

    /// Re-fetch only if `query` differs from what the current snapshot was
    /// built from.
    pub async fn update(&self, query: ListingQuery) -> Result<Option<FeedSnapshot>> {
        if let Some(snapshot) = self.latest().as_ref().filter(|s| s.query == query) {
            debug!("Listing query unchanged, reusing snapshot");
            return Ok(Some(snapshot.clone()));
        }
        self.refresh(query).await
    }

    /// Fetch unconditionally. Returns `None` when a newer fetch started
    /// while this one was in flight and its result was discarded.
    pub async fn refresh(&self, query: ListingQuery) -> Result<Option<FeedSnapshot>> {
        let token = self.sequencer.begin();
        debug!(?token, ?query, "Fetching listings");

        let fetched = match &query {
            ListingQuery::All => self.api.overview().await.map(|o| (o.featured, o.all)),
            ListingQuery::Search(params) => {
                self.api.search(params).await.map(|found| (Vec::new(), found))
            }
        };

        if !self.sequencer.is_current(token) {
            warn!(?token, "Discarding stale listing response");
            return Ok(None);
        }
        let (featured, listings) = fetched?;

        let snapshot = FeedSnapshot {
            query,
            featured,
            listings,
            fetched_at: Utc::now(),
        };
        info!(count = snapshot.listings.len(), "Listing feed updated");
        *self.latest() = Some(snapshot.clone());
        Ok(Some(snapshot))
    }
}
