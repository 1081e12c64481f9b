//! Observable search state.
//!
//! The engine publishes a [`SearchState`] snapshot after every transition.
//! Consumers subscribe to it instead of receiving discrete events.

use serde::Serialize;

use super::SearchQuery;
use crate::models::CardImage;

/// Lifecycle status of the current search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Idle,
    LoadingInitial,
    LoadingMore,
    Ready,
    Error,
}

impl SearchStatus {
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::LoadingInitial | Self::LoadingMore)
    }
}

/// Everything a grid needs to render one search session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchState {
    /// Accumulated results; keys are unique.
    pub results: Vec<CardImage>,

    pub status: SearchStatus,

    /// True iff the latest page came back full.
    pub has_more: bool,

    pub current_query: Option<SearchQuery>,

    /// Number of pages merged for the current query, starting at 1.
    pub page_counter: usize,

    /// User-facing message for the latest failure.
    pub error: Option<String>,

    /// False until the first search of the session is submitted.
    pub search_performed: bool,

    /// Bumped by every `search` and `reset`; responses from older
    /// generations are discarded.
    pub generation: u64,
}

impl SearchState {
    /// Full-grid spinner.
    #[must_use]
    pub const fn loading(&self) -> bool {
        matches!(self.status, SearchStatus::LoadingInitial)
    }

    /// Inline spinner below an already rendered grid.
    #[must_use]
    pub const fn loading_more(&self) -> bool {
        matches!(self.status, SearchStatus::LoadingMore)
    }

    /// Starts a fresh session for `query`, keeping only the generation counter.
    pub(crate) fn begin(&mut self, query: SearchQuery) -> u64 {
        let generation = self.generation + 1;
        *self = Self {
            status: SearchStatus::LoadingInitial,
            current_query: Some(query),
            page_counter: 1,
            search_performed: true,
            generation,
            ..Self::default()
        };
        generation
    }
}
