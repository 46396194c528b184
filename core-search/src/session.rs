//! # Search Session
//!
//! Paged artist search against a [`CatalogSource`].
//!
//! A session starts with [`SearchSession::search`] and grows with
//! [`SearchSession::load_next_page`] until the accumulated results reach the
//! server-reported total. Every `search` call starts a new generation;
//! responses belonging to an older generation are discarded when they arrive
//! and never touch the current state.
//!
//! Paging is single-flight: a `load_next_page` issued while another is
//! outstanding returns `Ok(None)` without contacting the catalog.

use crate::error::{Result, SearchError};
use crate::recent::RecentQueries;
use core_metadata::{ApiError, Artist, CatalogSource};
use core_runtime::events::{CoreEvent, EventBus, SearchEvent};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// What the search screen should currently show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultKind {
    Results,
    RecentSearches,
    None,
}

impl ResultKind {
    pub fn title(&self) -> &'static str {
        match self {
            ResultKind::Results => "Search results",
            ResultKind::RecentSearches => "Recent searches",
            ResultKind::None => "",
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    query: String,
    generation: u64,
    /// 1-based page to request next
    next_page: u32,
    results: Vec<Artist>,
    total: u64,
    in_flight: bool,
}

pub struct SearchSession {
    catalog: Arc<dyn CatalogSource>,
    recent: Arc<RecentQueries>,
    events: Option<EventBus>,
    page_limit: u32,
    state: Mutex<SessionState>,
}

impl SearchSession {
    pub fn new(catalog: Arc<dyn CatalogSource>, recent: Arc<RecentQueries>) -> Self {
        Self {
            catalog,
            recent,
            events: None,
            page_limit: DEFAULT_PAGE_LIMIT,
            state: Mutex::new(SessionState {
                next_page: 1,
                ..SessionState::default()
            }),
        }
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    /// Publish progress as [`SearchEvent`]s on `events`.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Start a new session for `query` and fetch its first page.
    ///
    /// An empty query clears the results and returns immediately without
    /// contacting the catalog. A failed first page also clears the results.
    pub async fn search(&self, query: &str) -> Result<Vec<Artist>> {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.query = query.to_string();
            state.next_page = 1;
            state.results.clear();
            state.total = 0;
            state.in_flight = false;
            state.generation
        };

        if query.is_empty() {
            debug!(generation, "Search cleared");
            return Ok(Vec::new());
        }

        debug!(generation, query, "Starting search");
        let outcome = self.catalog.search_artists(query, 1, self.page_limit).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!(generation, current = state.generation, "Discarding stale first page");
            return Err(SearchError::Superseded { generation });
        }

        match outcome {
            Ok(page) => {
                state.total = page.total_count;
                state.results = page.matches;
                state.next_page = 2;
                self.publish_page(&state, 1);
                Ok(state.results.clone())
            }
            Err(error) => {
                state.results.clear();
                drop(state);
                self.publish_failure(query, 1, error);
                Err(error.into())
            }
        }
    }

    /// Fetch the next page for the current query and append it.
    ///
    /// Returns `Ok(None)` without any network traffic when a page fetch is
    /// already outstanding or every result has been loaded. On failure the
    /// accumulated results are left as they were and the call can be retried.
    pub async fn load_next_page(&self) -> Result<Option<Vec<Artist>>> {
        let (query, page, generation) = {
            let mut state = self.lock();
            if state.in_flight {
                debug!("Page fetch already in flight");
                return Ok(None);
            }
            if state.query.is_empty() || state.results.len() as u64 >= state.total {
                return Ok(None);
            }
            state.in_flight = true;
            (state.query.clone(), state.next_page, state.generation)
        };

        let guard = InFlight::new(&self.state, generation);
        debug!(generation, page, "Loading next page");
        let outcome = self.catalog.search_artists(&query, page, self.page_limit).await;

        let mut state = self.lock();
        guard.finish(&mut state);

        if state.generation != generation {
            debug!(generation, current = state.generation, "Discarding stale page");
            return Err(SearchError::Superseded { generation });
        }

        match outcome {
            Ok(page_result) => {
                if page_result.matches.is_empty() {
                    // The server ran dry before its own total; stop paging.
                    warn!(page, total = state.total, "Empty page before reaching total");
                    state.total = state.results.len() as u64;
                }
                state.results.extend(page_result.matches);
                state.next_page = page + 1;
                self.publish_page(&state, page);
                Ok(Some(state.results.clone()))
            }
            Err(error) => {
                drop(state);
                self.publish_failure(&query, page, error);
                Err(error.into())
            }
        }
    }

    /// Record that the user picked `artist` from the current results.
    ///
    /// The current query is promoted in recent searches before the selection
    /// is published.
    pub async fn select_result(&self, artist: &Artist) -> Result<()> {
        let query = self.query();
        if !query.is_empty() {
            self.recent.add(&query).await?;
        }

        self.emit(SearchEvent::ResultSelected {
            query,
            artist: artist.name.clone(),
        });
        Ok(())
    }

    pub async fn remove_recent(&self, index: usize) -> Result<()> {
        self.recent.remove_at(index).await
    }

    pub fn result_kind(&self) -> ResultKind {
        if !self.lock().results.is_empty() {
            ResultKind::Results
        } else if !self.recent.is_empty() {
            ResultKind::RecentSearches
        } else {
            ResultKind::None
        }
    }

    pub fn results(&self) -> Vec<Artist> {
        self.lock().results.clone()
    }

    pub fn query(&self) -> String {
        self.lock().query.clone()
    }

    pub fn total(&self) -> u64 {
        self.lock().total
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn next_page(&self) -> u32 {
        self.lock().next_page
    }

    pub fn is_fetching(&self) -> bool {
        self.lock().in_flight
    }

    pub fn has_more(&self) -> bool {
        let state = self.lock();
        !state.query.is_empty() && (state.results.len() as u64) < state.total
    }

    pub fn recent(&self) -> &Arc<RecentQueries> {
        &self.recent
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish_page(&self, state: &SessionState, page: u32) {
        self.emit(SearchEvent::PageLoaded {
            query: state.query.clone(),
            generation: state.generation,
            page,
            accumulated: state.results.len(),
            total: state.total,
        });
    }

    fn publish_failure(&self, query: &str, page: u32, error: ApiError) {
        warn!(page, error = %error, "Search page failed");
        self.emit(SearchEvent::Failed {
            query: query.to_string(),
            page,
            message: error.description().to_string(),
        });
    }

    fn emit(&self, event: SearchEvent) {
        if let Some(events) = &self.events {
            let _ = events.emit(CoreEvent::Search(event));
        }
    }
}

/// Clears the single-flight flag if the fetch future is dropped before it
/// completes. Only the session generation that set the flag clears it.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    generation: u64,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a Mutex<SessionState>, generation: u64) -> Self {
        Self {
            state,
            generation,
            armed: true,
        }
    }

    /// Clear the flag under the caller's lock.
    fn finish(mut self, state: &mut SessionState) {
        if state.generation == self.generation {
            state.in_flight = false;
        }
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.generation == self.generation {
            state.in_flight = false;
        }
    }
}
