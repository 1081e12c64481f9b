//! Presentation helpers shared by every front end of the engine.

use serde::{Deserialize, Serialize};

use crate::constants::tags;
use crate::domain::SortOrder;
use crate::domain::events::{SearchState, SearchStatus};
use crate::models::CardImage;

/// Client-side visibility toggles applied on top of the accumulated results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayFilters {
    pub show_reverse_holos: bool,
    pub hide_first_editions: bool,
    pub show_energy_cards: bool,
    pub show_item_cards: bool,
    pub show_trainer_owned: bool,
}

impl Default for DisplayFilters {
    fn default() -> Self {
        Self {
            show_reverse_holos: true,
            hide_first_editions: false,
            show_energy_cards: false,
            show_item_cards: true,
            show_trainer_owned: true,
        }
    }
}

impl DisplayFilters {
    #[must_use]
    pub fn allows(&self, card: &CardImage) -> bool {
        if !self.show_reverse_holos && card.is_reverse_holo() {
            return false;
        }
        if self.hide_first_editions && card.tags.contains(tags::FIRST_EDITION) {
            return false;
        }
        if !self.show_energy_cards && card.tags.contains(tags::ENERGY) {
            return false;
        }
        if !self.show_item_cards && card.is_item() {
            return false;
        }
        if !self.show_trainer_owned && card.is_trainer_owned() {
            return false;
        }
        true
    }

    /// Filtered view over `cards`, order preserved. Tag toggles match on the
    /// raw tag string, so compound tags like `double-colorless-energy` count.
    #[must_use]
    pub fn apply<'a>(&self, cards: &'a [CardImage]) -> Vec<&'a CardImage> {
        cards.iter().filter(|card| self.allows(card)).collect()
    }
}

/// Key that changes whenever the grid has to be rebuilt from scratch.
#[must_use]
pub fn grid_key(generation: u64, sort: SortOrder, filters: &DisplayFilters) -> String {
    format!(
        "{generation}-{sort}-{}-{}-{}-{}-{}",
        filters.show_reverse_holos,
        filters.hide_first_editions,
        filters.show_energy_cards,
        filters.show_item_cards,
        filters.show_trainer_owned
    )
}

/// What to show when there are no cards to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// Nothing has been searched yet.
    NotSearched,
    /// A search ran and matched nothing.
    NoResults,
}

impl EmptyState {
    #[must_use]
    pub fn for_state(state: &SearchState) -> Option<Self> {
        if !state.results.is_empty() || state.status.is_loading() {
            return None;
        }
        if state.status == SearchStatus::Error {
            return None;
        }
        Some(if state.search_performed {
            Self::NoResults
        } else {
            Self::NotSearched
        })
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotSearched => {
                "Did you know you can search for multiple pokemon at once? Try searching for 'Pikachu, Blastoise'"
            }
            Self::NoResults => "No cards found. Try searching for something else.",
        }
    }
}

/// Copy shown when a single card cannot be rendered.
pub const CARD_RENDER_FAILED: &str = "Something went wrong loading this card.";

/// `"base-set"` -> `"Base Set"`.
#[must_use]
pub fn capitalize_words(input: &str) -> String {
    input
        .replace('-', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
