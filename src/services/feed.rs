//! Infinite-scroll glue between the grid viewport and the search engine.

use std::sync::Arc;

use tracing::debug;

use crate::config::ViewportConfig;
use crate::domain::ImageKey;
use crate::domain::events::SearchStatus;
use crate::services::search_engine::{Outcome, SearchEngine};
use crate::services::viewport::{
    ElementState, GridGeometry, PaginationTrigger, Viewport, ViewportLoadTrigger,
};

/// What a single scroll step caused.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// Cards whose images should start loading, top to bottom.
    pub revealed: Vec<ImageKey>,
    /// Set when the last card came into view and a page load ran.
    pub load_more: Option<Outcome>,
}

/// Lays the engine's results out on a grid and drives lazy image loading
/// and pagination from scroll positions.
pub struct ScrollFeed {
    engine: Arc<SearchEngine>,
    geometry: GridGeometry,
    images: ViewportLoadTrigger<ImageKey>,
    pagination: PaginationTrigger<ImageKey>,
    priority_items: usize,
    generation: Option<u64>,
}

impl ScrollFeed {
    #[must_use]
    pub fn new(
        engine: Arc<SearchEngine>,
        geometry: GridGeometry,
        margin: u32,
        priority_items: usize,
    ) -> Self {
        Self {
            engine,
            geometry,
            images: ViewportLoadTrigger::new(margin),
            pagination: PaginationTrigger::new(margin),
            priority_items,
            generation: None,
        }
    }

    /// Feed using the `[viewport]` config section for margin and priority.
    #[must_use]
    pub fn from_config(
        engine: Arc<SearchEngine>,
        geometry: GridGeometry,
        config: &ViewportConfig,
    ) -> Self {
        Self::new(
            engine,
            geometry,
            config.prefetch_margin_px,
            config.priority_items,
        )
    }

    /// Reveals every card as soon as it is laid out.
    #[must_use]
    pub fn without_observer(mut self) -> Self {
        self.images = ViewportLoadTrigger::without_observer();
        self
    }

    #[must_use]
    pub const fn engine(&self) -> &Arc<SearchEngine> {
        &self.engine
    }

    #[must_use]
    pub fn image_state(&self, key: &ImageKey) -> Option<ElementState> {
        self.images.state(key)
    }

    /// Handles one scroll or layout change.
    ///
    /// A page load runs at most once per call and only when the sentinel on
    /// the last card fires.
    pub async fn on_scroll(&mut self, viewport: Viewport) -> ScrollOutcome {
        let state = self.engine.snapshot();

        if self.generation != Some(state.generation) {
            debug!(
                event = "feed_rekeyed",
                generation = state.generation,
                "Search changed, rebuilding grid"
            );
            self.images.clear();
            self.pagination.disarm();
            self.generation = Some(state.generation);
        }

        let mut revealed = Vec::new();
        for (index, card) in state.results.iter().enumerate() {
            let key = &card.image_key;
            let fresh = self.images.state(key).is_none();
            let priority = index < self.priority_items;

            if self.images.register(key.clone(), priority) == ElementState::Triggered && fresh {
                revealed.push(key.clone());
            }
            self.images.place(key, self.geometry.bounds_of(index));
        }
        revealed.extend(self.images.observe(viewport));

        let blocked = state.status.is_loading()
            || state.status == SearchStatus::Error
            || !state.has_more;
        let last = state.results.len().checked_sub(1).map(|index| {
            (
                state.results[index].image_key.clone(),
                self.geometry.bounds_of(index),
            )
        });
        self.pagination.sync(last, blocked);

        let load_more = if self.pagination.check(viewport) {
            self.pagination.disarm();
            Some(self.engine.load_more().await)
        } else {
            None
        };

        ScrollOutcome {
            revealed,
            load_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PageSizes, SearchFilters, SearchQuery, SortOrder};
    use crate::services::testing::{ScriptedSource, cards};

    const GRID: GridGeometry = GridGeometry {
        columns: 5,
        row_height: 300,
        origin: 0,
    };

    fn query(terms: &str) -> SearchQuery {
        SearchQuery::new(terms, SearchFilters::none(), SortOrder::Ascending)
    }

    fn feed(source: &Arc<ScriptedSource>) -> ScrollFeed {
        let engine = SearchEngine::new(source.clone(), PageSizes { initial: 30, more: 20 });
        ScrollFeed::new(Arc::new(engine), GRID, 600, 5)
    }

    fn offsets(source: &ScriptedSource) -> Vec<usize> {
        source.requests().iter().map(|r| r.offset).collect()
    }

    #[tokio::test]
    async fn test_scroll_reveals_and_paginates() {
        let source = ScriptedSource::new();
        source.push_ok(cards("a", 0..30));
        source.push_ok(cards("a", 30..50));
        let mut feed = feed(&source);
        feed.engine().search(query("pikachu")).await;

        let step = feed.on_scroll(Viewport::new(0, 800)).await;
        assert_eq!(step.revealed.len(), 25);
        assert_eq!(step.revealed[0].as_str(), "a-0");
        assert_eq!(step.load_more, None);

        let step = feed.on_scroll(Viewport::new(1000, 800)).await;
        assert_eq!(step.revealed.len(), 5);
        assert_eq!(step.load_more, Some(Outcome::Applied));
        assert_eq!(offsets(&source), vec![0, 30]);

        let step = feed.on_scroll(Viewport::new(1000, 800)).await;
        assert_eq!(step.revealed.len(), 15);
        assert_eq!(step.load_more, None);
    }

    #[tokio::test]
    async fn test_from_config_uses_margin_and_priority() {
        let source = ScriptedSource::new();
        source.push_ok(cards("a", 0..30));
        source.push_ok(cards("a", 30..50));
        let engine = SearchEngine::new(source.clone(), PageSizes { initial: 30, more: 20 });
        let config = ViewportConfig {
            prefetch_margin_px: 0,
            priority_items: 2,
        };
        let mut feed = ScrollFeed::from_config(Arc::new(engine), GRID, &config);
        feed.engine().search(query("pikachu")).await;

        let step = feed.on_scroll(Viewport::new(0, 200)).await;
        let keys: Vec<_> = step.revealed.iter().map(ImageKey::as_str).collect();
        assert_eq!(&keys[..2], ["a-0", "a-1"]);
        assert_eq!(keys.len(), 5);
        assert_eq!(
            feed.image_state(&ImageKey::new("a-5")),
            Some(ElementState::Observed)
        );

        assert_eq!(feed.on_scroll(Viewport::new(1200, 200)).await.load_more, None);
        assert_eq!(
            feed.on_scroll(Viewport::new(1300, 200)).await.load_more,
            Some(Outcome::Applied)
        );
    }

    #[tokio::test]
    async fn test_exhausted_feed_never_loads() {
        let source = ScriptedSource::new();
        source.push_ok(cards("a", 0..10));
        let mut feed = feed(&source);
        feed.engine().search(query("pikachu")).await;

        let step = feed.on_scroll(Viewport::new(0, 5000)).await;
        assert_eq!(step.revealed.len(), 10);
        assert_eq!(step.load_more, None);
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_page_rearms_sentinel() {
        let source = ScriptedSource::new();
        source.push_ok(cards("k", 0..30));
        source.push_ok(cards("k", 0..20));
        source.push_ok(cards("k", 30..35));
        let mut feed = feed(&source);
        feed.engine().search(query("pikachu")).await;

        let bottom = Viewport::new(1200, 800);
        assert_eq!(feed.on_scroll(bottom).await.load_more, Some(Outcome::Applied));
        assert_eq!(feed.engine().snapshot().results.len(), 30);

        assert_eq!(feed.on_scroll(bottom).await.load_more, Some(Outcome::Applied));
        assert_eq!(offsets(&source), vec![0, 30, 50]);
        assert_eq!(feed.engine().snapshot().results.len(), 35);
    }

    #[tokio::test]
    async fn test_error_blocks_until_explicit_retry() {
        let source = ScriptedSource::new();
        source.push_ok(cards("a", 0..30));
        source.push_err(500);
        source.push_ok(cards("a", 30..50));
        let mut feed = feed(&source);
        feed.engine().search(query("pikachu")).await;

        let bottom = Viewport::new(1200, 800);
        assert_eq!(feed.on_scroll(bottom).await.load_more, Some(Outcome::Failed));
        assert_eq!(feed.on_scroll(bottom).await.load_more, None);
        assert_eq!(source.requests().len(), 2);

        assert_eq!(feed.engine().load_more().await, Outcome::Applied);
        assert_eq!(feed.engine().snapshot().results.len(), 50);
    }

    #[tokio::test]
    async fn test_new_search_rekeys_grid() {
        let source = ScriptedSource::new();
        source.push_ok(cards("a", 0..10));
        source.push_ok(cards("a", 0..10));
        let mut feed = feed(&source);

        feed.engine().search(query("pikachu")).await;
        let first = feed.on_scroll(Viewport::new(0, 800)).await;
        assert_eq!(first.revealed.len(), 10);
        assert!(feed.on_scroll(Viewport::new(0, 800)).await.revealed.is_empty());

        feed.engine().search(query("pikachu")).await;
        let again = feed.on_scroll(Viewport::new(0, 800)).await;
        assert_eq!(again.revealed.len(), 10);
        assert_eq!(again.revealed[..5], first.revealed[..5]);
    }

    #[tokio::test]
    async fn test_without_observer_reveals_everything() {
        let source = ScriptedSource::new();
        source.push_ok(cards("a", 0..30));
        let mut feed = feed(&source).without_observer();
        feed.engine().search(query("pikachu")).await;

        let step = feed.on_scroll(Viewport::new(0, 10)).await;
        assert_eq!(step.revealed.len(), 30);
        assert_eq!(
            feed.image_state(&ImageKey::new("a-29")),
            Some(ElementState::Triggered)
        );
    }
}
