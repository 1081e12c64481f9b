//! Viewport visibility tracking.
//!
//! [`ViewportLoadTrigger`] is one shared observer for a whole grid: items
//! register with it, and each item fires exactly once when it first enters
//! the viewport expanded by the prefetch margin. [`PaginationTrigger`] watches
//! only the last rendered item and tells the caller when to load the next page.
//!
//! Both are headless. The caller feeds them element bounds and the current
//! viewport in pixels, on every scroll or layout change.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use tracing::trace;

/// Vertical extent of an element in content coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bounds {
    pub top: u64,
    pub bottom: u64,
}

impl Bounds {
    #[must_use]
    pub const fn new(top: u64, height: u32) -> Self {
        Self {
            top,
            bottom: top + height as u64,
        }
    }
}

/// Visible scroll window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    pub top: u64,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(top: u64, height: u32) -> Self {
        Self { top, height }
    }

    /// True when `bounds` intersects the viewport grown by `margin` on both edges.
    #[must_use]
    pub const fn reveals(&self, bounds: Bounds, margin: u32) -> bool {
        let low = self.top.saturating_sub(margin as u64);
        let high = self.top + self.height as u64 + margin as u64;
        bounds.top <= high && bounds.bottom >= low
    }
}

/// Lifecycle of one tracked element. `Triggered` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementState {
    /// Registered, bounds not known yet.
    Pending,
    /// Bounds known, waiting to become visible.
    Observed,
    /// Fired; the element loads its resource.
    Triggered,
}

/// Fixed-size grid layout used to place items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridGeometry {
    pub columns: usize,
    pub row_height: u32,
    /// Offset of the first row from the top of the page.
    pub origin: u64,
}

impl GridGeometry {
    #[must_use]
    pub fn bounds_of(&self, index: usize) -> Bounds {
        let row = (index / self.columns.max(1)) as u64;
        Bounds::new(self.origin + row * u64::from(self.row_height), self.row_height)
    }

    #[must_use]
    pub fn content_height(&self, count: usize) -> u64 {
        let rows = count.div_ceil(self.columns.max(1)) as u64;
        rows * u64::from(self.row_height)
    }
}

/// Shared lazy-load observer for every item of a grid.
#[derive(Debug)]
pub struct ViewportLoadTrigger<K> {
    margin: u32,
    observer_available: bool,
    tracked: HashMap<K, Option<Bounds>>,
    triggered: HashSet<K>,
}

impl<K: Eq + Hash + Clone> ViewportLoadTrigger<K> {
    #[must_use]
    pub fn new(margin: u32) -> Self {
        Self {
            margin,
            observer_available: true,
            tracked: HashMap::new(),
            triggered: HashSet::new(),
        }
    }

    /// Fallback when visibility cannot be observed: every element is
    /// treated as visible the moment it registers.
    #[must_use]
    pub fn without_observer() -> Self {
        Self {
            observer_available: false,
            ..Self::new(0)
        }
    }

    /// Registers an element. Priority elements, and every element when no
    /// observer is available, trigger immediately.
    ///
    /// Registering an element that is already tracked or triggered keeps its
    /// current state.
    pub fn register(&mut self, key: K, priority: bool) -> ElementState {
        if let Some(state) = self.state(&key) {
            return state;
        }

        if priority || !self.observer_available {
            self.triggered.insert(key);
            return ElementState::Triggered;
        }

        self.tracked.insert(key, None);
        ElementState::Pending
    }

    /// Records where an element sits, moving it from `Pending` to `Observed`.
    /// Returns `None` for unregistered elements.
    pub fn place(&mut self, key: &K, bounds: Bounds) -> Option<ElementState> {
        if self.triggered.contains(key) {
            return Some(ElementState::Triggered);
        }

        let slot = self.tracked.get_mut(key)?;
        *slot = Some(bounds);
        Some(ElementState::Observed)
    }

    /// Stops tracking an element that has not fired yet.
    pub fn unregister(&mut self, key: &K) -> bool {
        self.tracked.remove(key).is_some()
    }

    /// Fires every observed element revealed by `viewport`, top to bottom.
    /// Fired elements are unregistered.
    pub fn observe(&mut self, viewport: Viewport) -> Vec<K> {
        let mut revealed: Vec<(u64, K)> = self
            .tracked
            .iter()
            .filter_map(|(key, bounds)| {
                (*bounds)
                    .filter(|b| viewport.reveals(*b, self.margin))
                    .map(|b| (b.top, key.clone()))
            })
            .collect();
        revealed.sort_by_key(|(top, _)| *top);

        revealed
            .into_iter()
            .map(|(_, key)| {
                self.tracked.remove(&key);
                self.triggered.insert(key.clone());
                key
            })
            .collect()
    }

    #[must_use]
    pub fn state(&self, key: &K) -> Option<ElementState> {
        if self.triggered.contains(key) {
            return Some(ElementState::Triggered);
        }
        self.tracked.get(key).map(|bounds| match bounds {
            Some(_) => ElementState::Observed,
            None => ElementState::Pending,
        })
    }

    /// Number of elements still waiting to fire.
    #[must_use]
    pub fn watching(&self) -> usize {
        self.tracked.len()
    }

    /// Forgets every element, e.g. when the grid is re-keyed.
    pub fn clear(&mut self) {
        trace!(
            event = "viewport_cleared",
            watching = self.tracked.len(),
            triggered = self.triggered.len()
        );
        self.tracked.clear();
        self.triggered.clear();
    }
}

#[derive(Debug)]
struct Sentinel<K> {
    key: K,
    bounds: Bounds,
    state: ElementState,
}

/// Observer on the last rendered item that drives "load more".
///
/// The sentinel is torn down while a load is in flight, when nothing more can
/// be loaded, and whenever the last item changes; a fresh one is created on
/// the next [`PaginationTrigger::sync`].
#[derive(Debug)]
pub struct PaginationTrigger<K> {
    margin: u32,
    sentinel: Option<Sentinel<K>>,
}

impl<K: Eq + Clone> PaginationTrigger<K> {
    #[must_use]
    pub const fn new(margin: u32) -> Self {
        Self {
            margin,
            sentinel: None,
        }
    }

    /// Points the sentinel at the current last item.
    ///
    /// `blocked` is true while loading, after exhaustion, or after a failure.
    pub fn sync(&mut self, last: Option<(K, Bounds)>, blocked: bool) {
        let Some((key, bounds)) = last.filter(|_| !blocked) else {
            self.disarm();
            return;
        };

        match self.sentinel.as_mut() {
            Some(sentinel) if sentinel.key == key => sentinel.bounds = bounds,
            _ => {
                self.sentinel = Some(Sentinel {
                    key,
                    bounds,
                    state: ElementState::Observed,
                });
            }
        }
    }

    /// True exactly once per sentinel, when the last item is revealed.
    pub fn check(&mut self, viewport: Viewport) -> bool {
        let Some(sentinel) = self.sentinel.as_mut() else {
            return false;
        };

        if sentinel.state == ElementState::Observed && viewport.reveals(sentinel.bounds, self.margin)
        {
            sentinel.state = ElementState::Triggered;
            return true;
        }
        false
    }

    pub fn disarm(&mut self) {
        self.sentinel = None;
    }

    #[must_use]
    pub fn state(&self) -> Option<ElementState> {
        self.sentinel.as_ref().map(|s| s.state)
    }

    #[must_use]
    pub fn watched_key(&self) -> Option<&K> {
        self.sentinel.as_ref().map(|s| &s.key)
    }
}
