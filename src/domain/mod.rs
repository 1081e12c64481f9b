//! Domain types for card searches.
//!
//! A [`SearchQuery`] is the immutable description of one logical search; a
//! [`PageRequest`] is derived from it for every page the engine fetches.

pub mod events;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::constants::{paging, terms};

/// Unique identifier of a card image, as served by the card API.
///
/// The key is the identity used for de-duplication and for keyed rendering.
///
/// # Examples
///
/// ```rust
/// use cardgrid::domain::ImageKey;
///
/// let key = ImageKey::new("base1/4.png");
/// assert_eq!(key.as_str(), "base1/4.png");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageKey(String);

impl ImageKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

fn whitespace_run() -> Option<&'static Regex> {
    static INSTANCE: OnceLock<Option<Regex>> = OnceLock::new();
    INSTANCE.get_or_init(|| Regex::new(r"\s+").ok()).as_ref()
}

/// Normalized, comma-joined search terms.
///
/// Each comma-separated part is trimmed, lower-cased and has its internal
/// whitespace runs collapsed into a single `-`. Empty parts are kept as-is,
/// so `"pikachu,"` normalizes to `"pikachu,"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Terms(String);

impl Terms {
    #[must_use]
    pub fn parse(input: &str) -> Self {
        Self(normalize(input))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True unless the input was blank. Separator-only terms such as `","`
    /// are still sent.
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Display for Terms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalizes raw user input into the wire form of the `q` parameter.
///
/// ```rust
/// use cardgrid::domain::normalize;
///
/// assert_eq!(normalize("  Pikachu ,  Raichu"), "pikachu,raichu");
/// assert_eq!(normalize("Mr  Mime"), "mr-mime");
/// ```
#[must_use]
pub fn normalize(input: &str) -> String {
    let sep = terms::SEPARATOR.to_string();
    let join = terms::JOIN.to_string();

    input
        .split(terms::SEPARATOR)
        .map(|part| {
            let lowered = part.trim().to_lowercase();
            match whitespace_run() {
                Some(re) => re.replace_all(&lowered, join.as_str()).into_owned(),
                None => lowered.split_whitespace().collect::<Vec<_>>().join(&join),
            }
        })
        .collect::<Vec<_>>()
        .join(&sep)
}

/// Which entity a search term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Cameo,
    Trainer,
    Illustrator,
    Set,
}

/// Boolean search flags passed through to the card API.
///
/// The engine accepts any combination. [`SearchFilters::toggle`] implements
/// the UI policy where illustrator and set searches exclude every other flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub cameo: bool,
    pub trainer: bool,
    pub illustrator: bool,
    pub set: bool,
}

impl SearchFilters {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            cameo: false,
            trainer: false,
            illustrator: false,
            set: false,
        }
    }

    #[must_use]
    pub const fn is_set_listing(&self) -> bool {
        self.set
    }

    #[must_use]
    pub const fn get(&self, kind: FilterKind) -> bool {
        match kind {
            FilterKind::Cameo => self.cameo,
            FilterKind::Trainer => self.trainer,
            FilterKind::Illustrator => self.illustrator,
            FilterKind::Set => self.set,
        }
    }

    /// Applies a checkbox change with the UI exclusivity rules.
    #[must_use]
    pub const fn toggle(mut self, kind: FilterKind, checked: bool) -> Self {
        match kind {
            FilterKind::Cameo => {
                self.cameo = checked;
                if checked {
                    self.illustrator = false;
                    self.set = false;
                }
            }
            FilterKind::Trainer => {
                self.trainer = checked;
                if checked {
                    self.illustrator = false;
                    self.set = false;
                }
            }
            FilterKind::Illustrator => {
                self.illustrator = checked;
                if checked {
                    self.cameo = false;
                    self.trainer = false;
                    self.set = false;
                }
            }
            FilterKind::Set => {
                self.set = checked;
                if checked {
                    self.cameo = false;
                    self.trainer = false;
                    self.illustrator = false;
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    #[must_use]
    pub const fn is_descending(self) -> bool {
        matches!(self, Self::Descending)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical search: normalized terms, flags and sort order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub terms: Terms,
    pub filters: SearchFilters,
    pub sort_order: SortOrder,
}

impl SearchQuery {
    #[must_use]
    pub fn new(raw_terms: &str, filters: SearchFilters, sort_order: SortOrder) -> Self {
        Self {
            terms: Terms::parse(raw_terms),
            filters,
            sort_order,
        }
    }

    /// A query without searchable terms must never reach the network.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.terms.is_searchable()
    }

    #[must_use]
    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// Page sizes used to derive limits and offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSizes {
    pub initial: usize,
    pub more: usize,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            initial: paging::INITIAL_PAGE_SIZE,
            more: paging::MORE_PAGE_SIZE,
        }
    }
}

impl PageSizes {
    /// Requested limit for 1-based page `page`.
    #[must_use]
    pub const fn limit_for_page(&self, page: usize) -> usize {
        if page <= 1 { self.initial } else { self.more }
    }

    /// Offset of 1-based page `page`: `initial + (page - 2) * more` from page 2 on.
    #[must_use]
    pub const fn offset_for_page(&self, page: usize) -> usize {
        if page <= 1 {
            0
        } else {
            self.initial + (page - 2) * self.more
        }
    }
}

/// A single page fetch derived from a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub query: SearchQuery,
    pub page: usize,
    pub limit: usize,
    pub offset: usize,
}

impl PageRequest {
    #[must_use]
    pub fn for_page(query: SearchQuery, sizes: PageSizes, page: usize) -> Self {
        Self {
            query,
            page,
            limit: sizes.limit_for_page(page),
            offset: sizes.offset_for_page(page),
        }
    }

    #[must_use]
    pub fn first(query: SearchQuery, sizes: PageSizes) -> Self {
        Self::for_page(query, sizes, 1)
    }

    /// Query-string pairs in wire order. Flags are only present when set.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("q", self.query.terms.as_str().to_string()),
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];

        let filters = &self.query.filters;
        let flags = [
            ("cameo", filters.cameo),
            ("trainer", filters.trainer),
            ("illustrator", filters.illustrator),
            ("set", filters.set),
            ("descending", self.query.sort_order.is_descending()),
        ];

        pairs.extend(
            flags
                .into_iter()
                .filter(|(_, on)| *on)
                .map(|(name, _)| (name, "1".to_string())),
        );

        pairs
    }
}
