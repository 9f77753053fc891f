//! Single source of truth for one paginated remote collection.
//!
//! The controller owns `items`, `total`, the active [`QueryState`], the
//! loading flags and the selection. Remote failures never escape: every
//! operation logs, notifies and returns whether it succeeded, so screens
//! decide what to do next (close a modal, keep a selection) from the
//! return value.
//!
//! Fetch results replace `items`/`total` wholesale. A fetch that changes
//! anything other than the page supersedes every fetch still in flight:
//! the outbound call is aborted and, should its result still arrive, it is
//! dropped by the generation check. Consumers that accumulate pages
//! additionally compare filter signatures when merging.
//!
//! The reload after a successful mutation targets the latest *requested*
//! window. When a filter change is still loading, the reload joins it
//! instead of aborting it.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::{AbortHandle, Abortable};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::RemoteConfig;
use crate::core::notify::Notifier;
use crate::core::{AppError, Result};
use crate::modules::resources::models::{
    Entity, ExportQuery, QueryPatch, QueryState, FIRST_PAGE,
};
use crate::modules::resources::services::ResourceService;

/// How a fetch relates to the query it replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Only the page moved, to a page other than the first
    PageChange,
    /// Anything else, including an explicit return to page 1 or a plain reload
    FilterChange,
}

impl FetchKind {
    pub fn classify(previous: &QueryState, next: &QueryState) -> Self {
        let only_page_moved = previous.page != next.page
            && previous.limit == next.limit
            && previous.filter_signature() == next.filter_signature();

        if only_page_moved && next.page != FIRST_PAGE {
            FetchKind::PageChange
        } else {
            FetchKind::FilterChange
        }
    }
}

/// Published controller state, as seen by screens
#[derive(Debug, Clone)]
pub struct ControllerSnapshot<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub query_params: QueryState,
    pub loading: bool,
    pub loading_more: bool,
    pub selected_ids: BTreeSet<String>,
    pub exporting: bool,
}

/// Change notifications for read-only consumers (infinite scroll)
#[derive(Debug, Clone)]
pub enum ControllerEvent<T> {
    /// The active query was replaced, by a fetch being issued or by `set_query_params`
    QueryRequested(QueryState),
    /// A fetch completed and its page is now the published state
    PageLoaded {
        query: QueryState,
        items: Vec<T>,
        total: u64,
    },
    /// A fetch failed; the published state below is what stays on screen
    FetchFailed {
        requested: QueryState,
        retained: QueryState,
        items: Vec<T>,
        total: u64,
    },
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub request_timeout: Duration,
    pub page_size: u32,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            page_size: 10,
        }
    }
}

impl ControllerOptions {
    pub fn from_config(config: &RemoteConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            page_size: config.default_page_size,
        }
    }
}

/// Mutations that reload the current window on success
#[derive(Debug, Clone, Copy)]
enum Mutation {
    Create,
    Update,
    Delete,
    Restore,
    BatchDelete(usize),
    BatchRestore(usize),
    BatchSetActive(usize, bool),
}

impl Mutation {
    fn is_batch(self) -> bool {
        matches!(
            self,
            Mutation::BatchDelete(_) | Mutation::BatchRestore(_) | Mutation::BatchSetActive(..)
        )
    }

    fn action(self) -> &'static str {
        match self {
            Mutation::Create => "create",
            Mutation::Update => "update",
            Mutation::Delete | Mutation::BatchDelete(_) => "delete",
            Mutation::Restore | Mutation::BatchRestore(_) => "restore",
            Mutation::BatchSetActive(_, true) => "activate",
            Mutation::BatchSetActive(_, false) => "deactivate",
        }
    }

    fn success_message(self, resource: &str) -> String {
        match self {
            Mutation::Create => format!("{}: record created", resource),
            Mutation::Update => format!("{}: record updated", resource),
            Mutation::Delete => format!("{}: record deleted", resource),
            Mutation::Restore => format!("{}: record restored", resource),
            Mutation::BatchDelete(n) => format!("{}: {} records deleted", resource, n),
            Mutation::BatchRestore(n) => format!("{}: {} records restored", resource, n),
            Mutation::BatchSetActive(n, true) => format!("{}: {} records activated", resource, n),
            Mutation::BatchSetActive(n, false) => {
                format!("{}: {} records deactivated", resource, n)
            }
        }
    }

    fn failure_message(self, resource: &str, err: &AppError) -> String {
        format!("{}: failed to {} ({})", resource, self.action(), err)
    }
}

struct InFlight {
    kind: FetchKind,
    abort: AbortHandle,
}

struct ControllerState<T> {
    items: Vec<T>,
    total: u64,
    query_params: QueryState,
    /// Query of the most recently issued fetch, or `query_params` once it settles
    requested: QueryState,
    loading: bool,
    loading_more: bool,
    selected_ids: BTreeSet<String>,
    exporting: bool,
    in_flight: HashMap<u64, InFlight>,
    next_request: u64,
}

impl<T> ControllerState<T> {
    fn filter_change_in_flight(&self) -> bool {
        self.in_flight
            .values()
            .any(|f| f.kind == FetchKind::FilterChange)
    }

    /// The latest fetch settled, so the requested window is the published one again
    fn settle_request(&mut self, request_id: u64) {
        if request_id + 1 == self.next_request {
            self.requested = self.query_params.clone();
        }
    }

    fn refresh_loading_flags(&mut self) {
        self.loading = self.filter_change_in_flight();
        self.loading_more = self
            .in_flight
            .values()
            .any(|f| f.kind == FetchKind::PageChange);
    }
}

pub struct ResourceController<T, I> {
    service: Arc<dyn ResourceService<T, I>>,
    notifier: Arc<dyn Notifier>,
    options: ControllerOptions,
    state: Mutex<ControllerState<T>>,
    generation: AtomicU64,
    reloading: AtomicBool,
    initialized: AtomicBool,
    listeners: Mutex<Vec<mpsc::UnboundedSender<ControllerEvent<T>>>>,
}

/// Clears a latch when dropped, including when the owning future is cancelled
struct Latch<'a>(&'a AtomicBool);

impl Drop for Latch<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Releases a fetch's in-flight slot and recomputes the loading flags
struct FetchSlot<'a, T> {
    state: &'a Mutex<ControllerState<T>>,
    request_id: u64,
}

impl<T> Drop for FetchSlot<'_, T> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.in_flight.remove(&self.request_id);
        state.refresh_loading_flags();
    }
}

impl<T, I> ResourceController<T, I>
where
    T: Entity,
    I: Send + 'static,
{
    pub fn new(
        service: Arc<dyn ResourceService<T, I>>,
        notifier: Arc<dyn Notifier>,
        options: ControllerOptions,
    ) -> Self {
        let query_params = QueryState::new(options.page_size);
        let requested = query_params.clone();
        Self {
            service,
            notifier,
            options,
            state: Mutex::new(ControllerState {
                items: Vec::new(),
                total: 0,
                query_params,
                requested,
                loading: false,
                loading_more: false,
                selected_ids: BTreeSet::new(),
                exporting: false,
                in_flight: HashMap::new(),
                next_request: 0,
            }),
            generation: AtomicU64::new(0),
            reloading: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        self.service.name()
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ---- published state -------------------------------------------------

    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    pub fn total(&self) -> u64 {
        self.lock().total
    }

    pub fn query_params(&self) -> QueryState {
        self.lock().query_params.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn is_loading_more(&self) -> bool {
        self.lock().loading_more
    }

    pub fn is_exporting(&self) -> bool {
        self.lock().exporting
    }

    pub fn selected_ids(&self) -> BTreeSet<String> {
        self.lock().selected_ids.clone()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.lock().selected_ids.contains(id)
    }

    pub fn snapshot(&self) -> ControllerSnapshot<T> {
        let state = self.lock();
        ControllerSnapshot {
            items: state.items.clone(),
            total: state.total,
            query_params: state.query_params.clone(),
            loading: state.loading,
            loading_more: state.loading_more,
            selected_ids: state.selected_ids.clone(),
            exporting: state.exporting,
        }
    }

    /// Stream of query and page events, in the order they happen
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ControllerEvent<T>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    fn emit(&self, event: ControllerEvent<T>) {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // ---- query & fetch ---------------------------------------------------

    /// Replace the active query without fetching
    pub fn set_query_params(&self, next: QueryState) {
        {
            let mut state = self.lock();
            if state.query_params.filter_signature() != next.filter_signature() {
                self.supersede(&mut state);
            }
            state.query_params = next.clone();
            state.requested = next.clone();
        }
        self.emit(ControllerEvent::QueryRequested(next));
    }

    /// First load of the screen; later calls are no-ops
    pub async fn initialize(&self) -> bool {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!(resource = %self.name(), "Controller already initialized");
            return true;
        }
        self.fetch(QueryPatch::default()).await
    }

    /// Merge `patch` into the active query and load that window
    pub async fn fetch(&self, patch: QueryPatch) -> bool {
        self.load(patch, false).await
    }

    async fn load(&self, patch: QueryPatch, reload: bool) -> bool {
        let (abort, registration) = AbortHandle::new_pair();

        let (query, kind, request_id, generation) = {
            let mut state = self.lock();
            let base = if reload {
                &state.requested
            } else {
                &state.query_params
            };
            let query = base.merged(&patch);
            let kind = FetchKind::classify(&state.query_params, &query);

            let joins_pending = reload && state.filter_change_in_flight();
            if kind == FetchKind::FilterChange && !joins_pending {
                self.supersede(&mut state);
            }

            let request_id = state.next_request;
            state.next_request += 1;
            state.requested = query.clone();
            state.in_flight.insert(request_id, InFlight { kind, abort });
            state.refresh_loading_flags();

            (query, kind, request_id, self.generation.load(Ordering::SeqCst))
        };
        let _slot = FetchSlot {
            state: &self.state,
            request_id,
        };

        self.emit(ControllerEvent::QueryRequested(query.clone()));
        debug!(
            resource = %self.name(),
            page = query.page,
            limit = query.limit,
            kind = ?kind,
            "Fetching page"
        );

        let call = self.with_timeout(self.service.get_page(&query));
        let page = match Abortable::new(call, registration).await {
            Err(_aborted) => {
                debug!(resource = %self.name(), page = query.page, "Fetch superseded");
                return false;
            }
            Ok(Err(e)) => {
                error!(
                    resource = %self.name(),
                    page = query.page,
                    error = %e,
                    "Failed to load page"
                );
                self.notifier
                    .error(&format!("{}: failed to load ({})", self.name(), e));
                self.publish_failure(query, request_id, generation);
                return false;
            }
            Ok(Ok(page)) => page,
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(resource = %self.name(), page = query.page, "Dropping stale page");
            return false;
        }

        {
            let mut state = self.lock();
            state.items = page.items.clone();
            state.total = page.total;
            state.query_params = query.clone();
            state.settle_request(request_id);
        }
        self.emit(ControllerEvent::PageLoaded {
            query,
            items: page.items,
            total: page.total,
        });
        true
    }

    /// Tell consumers which published state survives a failed fetch
    fn publish_failure(&self, requested: QueryState, request_id: u64, generation: u64) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        let event = {
            let mut state = self.lock();
            state.settle_request(request_id);
            ControllerEvent::FetchFailed {
                requested,
                retained: state.query_params.clone(),
                items: state.items.clone(),
                total: state.total,
            }
        };
        self.emit(event);
    }

    /// Abort every in-flight fetch and invalidate results still on the way
    fn supersede(&self, state: &mut ControllerState<T>) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        for flight in state.in_flight.values() {
            flight.abort.abort();
        }
    }

    /// Reload the current window once; callers arriving mid-reload are no-ops
    async fn reload(&self) {
        if self
            .reloading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(resource = %self.name(), "Reload already running, skipping");
            return;
        }
        let _latch = Latch(&self.reloading);
        self.load(QueryPatch::default(), true).await;
    }

    async fn with_timeout<R>(&self, call: impl Future<Output = Result<R>>) -> Result<R> {
        let limit = self.options.request_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(limit.as_millis() as u64)),
        }
    }

    // ---- mutations -------------------------------------------------------

    async fn mutate<R>(&self, mutation: Mutation, call: impl Future<Output = Result<R>>) -> bool {
        match self.with_timeout(call).await {
            Ok(_) => {
                info!(resource = %self.name(), action = mutation.action(), "Mutation succeeded");
                self.notifier.success(&mutation.success_message(self.name()));
                if mutation.is_batch() {
                    self.clear_selection();
                }
                self.reload().await;
                true
            }
            Err(e) => {
                error!(
                    resource = %self.name(),
                    action = mutation.action(),
                    error = %e,
                    "Mutation failed"
                );
                self.notifier
                    .error(&mutation.failure_message(self.name(), &e));
                false
            }
        }
    }

    pub async fn create(&self, input: I) -> bool {
        self.mutate(Mutation::Create, self.service.create(input))
            .await
    }

    pub async fn update(&self, id: &str, input: I) -> bool {
        self.mutate(Mutation::Update, self.service.update(id, input))
            .await
    }

    pub async fn delete(&self, id: &str) -> bool {
        self.mutate(Mutation::Delete, self.service.delete(id)).await
    }

    pub async fn restore(&self, id: &str) -> bool {
        self.mutate(Mutation::Restore, self.service.restore(id))
            .await
    }

    pub async fn batch_delete(&self, ids: &[String]) -> bool {
        if ids.is_empty() {
            warn!(resource = %self.name(), "Batch delete called without ids");
            return false;
        }
        self.mutate(Mutation::BatchDelete(ids.len()), self.service.delete_many(ids))
            .await
    }

    pub async fn batch_restore(&self, ids: &[String]) -> bool {
        if ids.is_empty() {
            warn!(resource = %self.name(), "Batch restore called without ids");
            return false;
        }
        self.mutate(Mutation::BatchRestore(ids.len()), self.service.restore_many(ids))
            .await
    }

    pub async fn batch_set_active(&self, ids: &[String], active: bool) -> bool {
        if ids.is_empty() {
            warn!(resource = %self.name(), "Batch status change called without ids");
            return false;
        }
        self.mutate(
            Mutation::BatchSetActive(ids.len(), active),
            self.service.batch_update_status(ids, active),
        )
        .await
    }

    // ---- reads outside the list -----------------------------------------

    /// Load one record, e.g. for an edit form
    pub async fn get_by_id(&self, id: &str) -> Option<T> {
        match self.with_timeout(self.service.get_by_id(id)).await {
            Ok(item) => Some(item),
            Err(e) => {
                error!(resource = %self.name(), id = %id, error = %e, "Failed to load record");
                self.notifier
                    .error(&format!("{}: failed to load record ({})", self.name(), e));
                None
            }
        }
    }

    /// Every row matching the current filter (or `params`), ignoring the window
    pub async fn export_all(&self, params: Option<ExportQuery>) -> Option<Vec<T>> {
        let query = {
            let mut state = self.lock();
            if state.exporting {
                debug!(resource = %self.name(), "Export already running");
                return None;
            }
            state.exporting = true;
            params.unwrap_or_else(|| state.query_params.export_query())
        };

        let result = self
            .with_timeout(self.service.get_all_for_export(&query))
            .await;
        self.lock().exporting = false;

        match result {
            Ok(rows) => {
                info!(resource = %self.name(), rows = rows.len(), "Export loaded");
                Some(rows)
            }
            Err(e) => {
                error!(resource = %self.name(), error = %e, "Export failed");
                self.notifier
                    .error(&format!("{}: export failed ({})", self.name(), e));
                None
            }
        }
    }

    // ---- selection -------------------------------------------------------

    /// Select every row currently loaded, or clear the selection
    pub fn select_all(&self, checked: bool) {
        let mut state = self.lock();
        let selected: BTreeSet<String> = if checked {
            state.items.iter().map(|item| item.id().to_string()).collect()
        } else {
            BTreeSet::new()
        };
        state.selected_ids = selected;
    }

    pub fn select_one(&self, id: &str, checked: bool) {
        let mut state = self.lock();
        if checked {
            state.selected_ids.insert(id.to_string());
        } else {
            state.selected_ids.remove(id);
        }
    }

    pub fn clear_selection(&self) {
        self.lock().selected_ids.clear();
    }

    /// Switch between live and soft-deleted rows
    pub async fn set_archive_view(&self, show_deleted: bool) -> bool {
        self.clear_selection();
        let is_deleted = if show_deleted { Some(true) } else { None };
        self.fetch(QueryPatch::new().page(FIRST_PAGE).is_deleted(is_deleted))
            .await
    }
}
