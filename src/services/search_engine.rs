//! Incremental search and pagination engine.
//!
//! The engine turns a [`SearchQuery`] into page requests, merges pages into a
//! single de-duplicated result list and publishes every transition as a
//! [`SearchState`] snapshot over a `tokio::sync::watch` channel.
//!
//! Every `search` starts a new generation. Responses are tagged with the
//! generation that issued them and dropped on arrival when a newer search (or
//! a reset) has happened since, so a slow response can never overwrite the
//! state of a later query.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::clients::{CardSource, FetchError};
use crate::domain::events::{SearchState, SearchStatus};
use crate::domain::{ImageKey, PageRequest, PageSizes, SearchQuery, SortOrder};
use crate::models::CardImage;
use crate::services::set_sort;

/// Why a transition was refused without touching the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Query has no search terms")]
    InvalidQuery,

    #[error("A page is already being loaded")]
    AlreadyLoading,

    #[error("No more pages for the current query")]
    Exhausted,

    #[error("No search has been performed")]
    NoActiveSearch,
}

/// Result of invoking a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response was merged into the state.
    Applied,
    /// The fetch failed; the state carries the error.
    Failed,
    /// A newer search superseded this one; the response was dropped.
    Stale,
    /// Nothing happened.
    Rejected(SearchError),
}

pub struct SearchEngine {
    source: Arc<dyn CardSource>,
    sizes: PageSizes,
    state: watch::Sender<SearchState>,
}

impl SearchEngine {
    #[must_use]
    pub fn new(source: Arc<dyn CardSource>, sizes: PageSizes) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            source,
            sizes,
            state,
        }
    }

    /// Receiver that observes every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Starts a new search, discarding the current session.
    ///
    /// A query without terms is a no-op and leaves the state untouched.
    pub async fn search(&self, query: SearchQuery) -> Outcome {
        if !query.is_valid() {
            debug!(event = "search_rejected", "Ignoring search without terms");
            return Outcome::Rejected(SearchError::InvalidQuery);
        }

        let mut generation = 0;
        self.state
            .send_modify(|state| generation = state.begin(query.clone()));

        let request = PageRequest::first(query, self.sizes);
        info!(
            event = "search_started",
            terms = %request.query.terms,
            sort = %request.query.sort_order,
            generation,
            "Searching cards"
        );
        metrics::counter!("card_search_requests_total", "kind" => "initial").increment(1);

        let result = self.source.fetch_page(&request).await;
        self.apply_first_page(generation, &request, result)
    }

    fn apply_first_page(
        &self,
        generation: u64,
        request: &PageRequest,
        result: Result<Vec<CardImage>, FetchError>,
    ) -> Outcome {
        let mut failure = None;
        let mut merged = 0;

        let applied = self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }

            match result {
                Ok(items) => {
                    state.has_more = items.len() == request.limit;
                    state.results = unique_by_key(items);
                    if request.query.filters.is_set_listing() {
                        set_sort::sort_cards(&mut state.results, request.query.sort_order);
                    }
                    state.status = SearchStatus::Ready;
                    state.error = None;
                    merged = state.results.len();
                }
                Err(e) => {
                    state.results.clear();
                    state.has_more = false;
                    state.status = SearchStatus::Error;
                    state.error = Some(e.user_message());
                    failure = Some(e);
                }
            }
            true
        });

        if !applied {
            self.note_stale(generation, request);
            return Outcome::Stale;
        }

        if let Some(e) = failure {
            warn!(event = "search_failed", generation, error = %e, "Card search failed");
            metrics::counter!("card_search_failures_total", "kind" => "initial").increment(1);
            return Outcome::Failed;
        }

        info!(
            event = "search_completed",
            generation,
            results = merged,
            has_more = self.state.borrow().has_more,
            "Card search completed"
        );
        self.record_result_count();
        Outcome::Applied
    }

    /// Fetches the next page of the current query and appends unseen items.
    ///
    /// No-op while a page is loading or once the query is exhausted.
    pub async fn load_more(&self) -> Outcome {
        let sizes = self.sizes;
        let mut plan = Err(SearchError::Exhausted);

        self.state.send_if_modified(|state| {
            if state.status.is_loading() {
                plan = Err(SearchError::AlreadyLoading);
                return false;
            }
            if !state.has_more {
                return false;
            }
            let Some(query) = state.current_query.clone() else {
                plan = Err(SearchError::NoActiveSearch);
                return false;
            };

            state.status = SearchStatus::LoadingMore;
            state.error = None;
            plan = Ok((
                state.generation,
                PageRequest::for_page(query, sizes, state.page_counter + 1),
            ));
            true
        });

        let (generation, request) = match plan {
            Ok(plan) => plan,
            Err(reason) => {
                debug!(event = "load_more_rejected", %reason, "Skipping load more");
                return Outcome::Rejected(reason);
            }
        };

        info!(
            event = "load_more_started",
            generation,
            page = request.page,
            offset = request.offset,
            "Loading more cards"
        );
        metrics::counter!("card_search_requests_total", "kind" => "more").increment(1);

        let result = self.source.fetch_page(&request).await;
        self.apply_next_page(generation, &request, result)
    }

    fn apply_next_page(
        &self,
        generation: u64,
        request: &PageRequest,
        result: Result<Vec<CardImage>, FetchError>,
    ) -> Outcome {
        let mut failure = None;
        let mut fetched = 0;
        let mut appended = 0;

        let applied = self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }

            match result {
                Ok(items) => {
                    fetched = items.len();
                    let mut seen: HashSet<ImageKey> =
                        state.results.iter().map(|c| c.image_key.clone()).collect();
                    let before = state.results.len();
                    state.results.extend(
                        items
                            .into_iter()
                            .filter(|card| seen.insert(card.image_key.clone())),
                    );
                    appended = state.results.len() - before;

                    if request.query.filters.is_set_listing() {
                        set_sort::sort_cards(&mut state.results, request.query.sort_order);
                    }

                    state.has_more = fetched == request.limit;
                    state.page_counter += 1;
                    state.status = SearchStatus::Ready;
                }
                Err(e) => {
                    state.status = SearchStatus::Error;
                    state.error = Some(e.user_message());
                    failure = Some(e);
                }
            }
            true
        });

        if !applied {
            self.note_stale(generation, request);
            return Outcome::Stale;
        }

        if let Some(e) = failure {
            warn!(
                event = "load_more_failed",
                generation,
                page = request.page,
                error = %e,
                "Loading more cards failed"
            );
            metrics::counter!("card_search_failures_total", "kind" => "more").increment(1);
            return Outcome::Failed;
        }

        info!(
            event = "load_more_completed",
            generation,
            page = request.page,
            fetched,
            appended,
            duplicates = fetched - appended,
            "Loaded more cards"
        );
        self.record_result_count();
        Outcome::Applied
    }

    /// Sorts the accumulated results with the set-listing comparator and
    /// records `order` on the current query. Never fetches.
    pub fn reorder_locally(&self, order: SortOrder) -> Outcome {
        let mut outcome = Outcome::Rejected(SearchError::NoActiveSearch);

        self.state.send_if_modified(|state| {
            let Some(query) = state.current_query.as_mut() else {
                return false;
            };
            query.sort_order = order;
            set_sort::sort_cards(&mut state.results, order);
            outcome = Outcome::Applied;
            true
        });

        if outcome == Outcome::Applied {
            debug!(event = "reordered_locally", sort = %order, "Re-sorted set listing");
        }
        outcome
    }

    /// Flips the sort order of the current query.
    ///
    /// Set listings are re-sorted in place; other listings are searched
    /// again so the server applies the new order.
    pub async fn toggle_sort(&self) -> Outcome {
        let Some(query) = self.state.borrow().current_query.clone() else {
            return Outcome::Rejected(SearchError::NoActiveSearch);
        };

        let order = query.sort_order.toggled();
        if query.filters.is_set_listing() {
            self.reorder_locally(order)
        } else {
            self.search(query.with_sort_order(order)).await
        }
    }

    /// Replaces the accumulated results, e.g. after an external reordering.
    /// Later items whose key was already seen are dropped.
    pub fn replace_results(&self, items: Vec<CardImage>) {
        let items = unique_by_key(items);
        self.state.send_modify(|state| state.results = items);
        self.record_result_count();
    }

    /// Discards the session. In-flight responses become stale.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            *state = SearchState {
                generation: state.generation + 1,
                ..SearchState::default()
            };
        });
        debug!(event = "search_reset", "Search session reset");
    }

    fn note_stale(&self, generation: u64, request: &PageRequest) {
        debug!(
            event = "stale_response_discarded",
            generation,
            current = self.state.borrow().generation,
            page = request.page,
            "Dropping response for superseded search"
        );
        metrics::counter!("card_search_stale_responses_total").increment(1);
    }

    fn record_result_count(&self) {
        #[allow(clippy::cast_precision_loss)]
        let count = self.state.borrow().results.len() as f64;
        metrics::gauge!("card_search_results").set(count);
    }
}

/// Keeps the first occurrence of every key, preserving order.
fn unique_by_key(items: Vec<CardImage>) -> Vec<CardImage> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|card| seen.insert(card.image_key.clone()))
        .collect()
}
