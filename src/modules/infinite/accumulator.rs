//! Infinite-scroll accumulation over a [`ResourceController`].
//!
//! The controller replaces its items on every fetch; the accumulator turns
//! that into an append-only, de-duplicated list for scroll-triggered
//! loading. It listens to the controller's event stream:
//!
//! - a requested query with a new filter signature clears everything at
//!   once, even while a fetch for the old filter is still in flight;
//! - a loaded page whose filter signature differs from the current one is
//!   stale and dropped (the check happens at merge time);
//! - page 1 replaces the content, page N > 1 appends ids not seen yet;
//! - a failed fetch for the new filter brings back the rows of the filter
//!   the controller still publishes.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::debug;

use crate::modules::resources::controllers::{ControllerEvent, ResourceController};
use crate::modules::resources::models::{
    page_count, Entity, FilterSignature, QueryPatch, QueryState, FIRST_PAGE,
};

/// Accumulated rows since the last filter change
#[derive(Debug, Clone)]
pub struct AccumulatorState<T> {
    pub accumulated: Vec<T>,
    pub current_page: u32,
    pub filter_signature: FilterSignature,
    pub page_size: u32,
    pub total: u64,
    seen: HashSet<String>,
    /// Content cleared by a filter change whose first page has not landed yet
    previous: Option<Box<AccumulatorState<T>>>,
}

impl<T: Entity> AccumulatorState<T> {
    fn new(filter_signature: FilterSignature, page_size: u32) -> Self {
        Self {
            accumulated: Vec::new(),
            current_page: FIRST_PAGE,
            filter_signature,
            page_size,
            total: 0,
            seen: HashSet::new(),
            previous: None,
        }
    }

    fn clear(&mut self) {
        self.accumulated.clear();
        self.seen.clear();
        self.current_page = FIRST_PAGE;
        self.total = 0;
        self.previous = None;
    }

    /// Start over for `query`, keeping the last loaded content aside
    fn switch_filter(&mut self, query: &QueryState) {
        let fresh = AccumulatorState::new(query.filter_signature(), query.limit);
        let mut old = std::mem::replace(self, fresh);
        self.previous = match old.previous.take() {
            Some(kept) => Some(kept),
            None if !old.accumulated.is_empty() => Some(Box::new(old)),
            None => None,
        };
    }

    /// Go back to what the controller kept after a failed filter change
    fn restore(&mut self, retained: &QueryState, items: Vec<T>, total: u64) {
        let signature = retained.filter_signature();
        match self.previous.take() {
            Some(kept) if kept.filter_signature == signature => *self = *kept,
            _ => {
                let mut rebased = AccumulatorState::new(signature, retained.limit);
                rebased.append(items);
                rebased.current_page = retained.page;
                rebased.total = total;
                *self = rebased;
            }
        }
    }

    fn append(&mut self, items: Vec<T>) -> usize {
        let before = self.accumulated.len();
        for item in items {
            if self.seen.insert(item.id().to_string()) {
                self.accumulated.push(item);
            }
        }
        self.accumulated.len() - before
    }

    fn has_next_page(&self) -> bool {
        self.current_page < page_count(self.total, self.page_size)
    }

    /// Apply one controller event
    fn observe(&mut self, event: ControllerEvent<T>) {
        match event {
            ControllerEvent::QueryRequested(query) => {
                let signature = query.filter_signature();
                if signature != self.filter_signature {
                    debug!(
                        from = %self.filter_signature,
                        to = %signature,
                        dropped = self.accumulated.len(),
                        "Filter changed, resetting infinite scroll"
                    );
                    self.switch_filter(&query);
                }
            }
            ControllerEvent::PageLoaded {
                query,
                items,
                total,
            } => {
                if query.filter_signature() != self.filter_signature {
                    debug!(
                        page = query.page,
                        stale = %query.filter_signature(),
                        "Discarding page loaded for a previous filter"
                    );
                    return;
                }

                if query.page == FIRST_PAGE {
                    self.accumulated.clear();
                    self.seen.clear();
                }
                let received = items.len();
                let added = self.append(items);
                if added < received {
                    debug!(
                        page = query.page,
                        duplicates = received - added,
                        "Skipped rows already accumulated"
                    );
                }

                self.current_page = query.page;
                self.page_size = query.limit;
                self.total = total;
                self.previous = None;
            }
            ControllerEvent::FetchFailed {
                requested,
                retained,
                items,
                total,
            } => {
                let retained_signature = retained.filter_signature();
                if retained_signature == self.filter_signature
                    || requested.filter_signature() != self.filter_signature
                {
                    return;
                }
                debug!(
                    failed = %self.filter_signature,
                    restored = %retained_signature,
                    "Filter change failed, restoring previous rows"
                );
                self.restore(&retained, items, total);
            }
        }
    }
}

pub struct InfiniteAccumulator<T, I> {
    controller: Arc<ResourceController<T, I>>,
    events: Mutex<mpsc::UnboundedReceiver<ControllerEvent<T>>>,
    state: Mutex<AccumulatorState<T>>,
    fetching: AtomicBool,
    enabled: AtomicBool,
}

/// Clears the in-flight flag when the next-page fetch ends or is dropped
struct FetchingFlag<'a>(&'a AtomicBool);

impl Drop for FetchingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<T, I> InfiniteAccumulator<T, I>
where
    T: Entity,
    I: Send + 'static,
{
    /// Attach to `controller`, picking up whatever page it already shows
    pub fn new(controller: Arc<ResourceController<T, I>>) -> Self {
        let events = controller.subscribe();
        let snapshot = controller.snapshot();
        let query = snapshot.query_params.clone();

        let mut state = AccumulatorState::new(query.filter_signature(), query.limit);
        if !snapshot.items.is_empty() {
            state.observe(ControllerEvent::PageLoaded {
                query,
                items: snapshot.items,
                total: snapshot.total,
            });
        }

        Self {
            controller,
            events: Mutex::new(events),
            state: Mutex::new(state),
            fetching: AtomicBool::new(false),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn controller(&self) -> &Arc<ResourceController<T, I>> {
        &self.controller
    }

    fn lock(&self) -> MutexGuard<'_, AccumulatorState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drain pending controller events into the accumulated list
    pub fn sync(&self) {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let mut state = self.lock();
        while let Ok(event) = events.try_recv() {
            state.observe(event);
        }
    }

    /// Feed one event directly, bypassing the subscription
    pub fn observe(&self, event: ControllerEvent<T>) {
        self.lock().observe(event);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::SeqCst)
    }

    /// `current_page < ceil(total / page_size)`, computed on every call
    pub fn has_next_page(&self) -> bool {
        self.sync();
        self.lock().has_next_page()
    }

    pub fn accumulated(&self) -> Vec<T> {
        self.sync();
        self.lock().accumulated.clone()
    }

    pub fn len(&self) -> usize {
        self.sync();
        self.lock().accumulated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current_page(&self) -> u32 {
        self.sync();
        self.lock().current_page
    }

    pub fn filter_signature(&self) -> FilterSignature {
        self.sync();
        self.lock().filter_signature.clone()
    }

    pub fn state(&self) -> AccumulatorState<T> {
        self.sync();
        self.lock().clone()
    }

    /// Load the page after the last accumulated one
    ///
    /// No-op while disabled, on the last page, or with a next-page fetch
    /// already outstanding, so it is safe to call on every scroll event.
    pub async fn fetch_next_page(&self) -> bool {
        if !self.is_enabled() || !self.has_next_page() {
            return false;
        }
        if self
            .fetching
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(resource = %self.controller.name(), "Next page already loading");
            return false;
        }
        let _flag = FetchingFlag(&self.fetching);

        let next = self.lock().current_page + 1;
        debug!(resource = %self.controller.name(), page = next, "Loading next page");
        let loaded = self.controller.fetch(QueryPatch::new().page(next)).await;
        self.sync();
        loaded
    }

    /// Forget everything accumulated without waiting for a filter change
    pub fn reset_infinite_scroll(&self) {
        self.sync();
        let mut state = self.lock();
        debug!(dropped = state.accumulated.len(), "Infinite scroll reset");
        state.clear();
    }

    /// Reset and reload from the first page
    pub async fn refresh(&self) -> bool {
        self.reset_infinite_scroll();
        let loaded = self
            .controller
            .fetch(QueryPatch::new().page(FIRST_PAGE))
            .await;
        self.sync();
        loaded
    }
}
