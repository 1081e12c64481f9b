pub mod search_engine;
pub use search_engine::{Outcome, SearchEngine, SearchError};

pub mod set_sort;

pub mod viewport;
pub use viewport::{
    Bounds, ElementState, GridGeometry, PaginationTrigger, Viewport, ViewportLoadTrigger,
};

pub mod feed;
pub use feed::{ScrollFeed, ScrollOutcome};

pub mod display;
pub use display::{DisplayFilters, EmptyState};

#[cfg(test)]
pub(crate) mod testing;
