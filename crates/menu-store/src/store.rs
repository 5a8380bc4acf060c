//! # Resource Store
//!
//! Generic cache manager wrapping one [`RemoteResourceClient`].
//!
//! ## Operation Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  call ──► validate ──✗──► Err(Validation)       (no flag, no request)  │
//! │              │                                                          │
//! │              ✓                                                          │
//! │              ▼                                                          │
//! │         flag = true, error = None                                      │
//! │              │                                                          │
//! │              ▼                                                          │
//! │         remote call  (the only await point)                            │
//! │           │      │                                                      │
//! │       Ok  │      │ Err                                                  │
//! │           ▼      ▼                                                      │
//! │   patch cache    cache untouched, error = message                      │
//! │           │      │                                                      │
//! │           └──┬───┘                                                      │
//! │              ▼                                                          │
//! │         flag = false  (also on panic or a dropped future)              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cache Patching
//! | Operation  | On success                                              |
//! |------------|---------------------------------------------------------|
//! | `load_all` | replace collection, stamp `fetched_at`, keep filter     |
//! | `load_one` | upsert by id, select it                                 |
//! | `create`   | append (replace if the id is already cached), select it |
//! | `update`   | replace by id; unknown id is a no-op                    |
//! | `delete`   | remove by id, clear the selection if it matched         |
//!
//! The store never retries. Callers retry by calling again.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, Clock, SystemClock};
use crate::client::RemoteResourceClient;
use crate::error::{StoreError, StoreResult};
use crate::resource::{Orderable, Resource, ResourceKind};
use crate::subject::{Subject, Subscription};

// =============================================================================
// Operation Flags and Errors
// =============================================================================

/// The independently tracked store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    LoadOne,
    Create,
    Update,
    Delete,
    Reorder,
}

impl Operation {
    pub const fn name(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::LoadOne => "load_one",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Reorder => "reorder",
        }
    }
}

/// One in-flight flag per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationFlags {
    pub loading_list: bool,
    pub loading_one: bool,
    pub creating: bool,
    pub updating: bool,
    pub deleting: bool,
    pub reordering: bool,
}

impl OperationFlags {
    pub fn get(&self, op: Operation) -> bool {
        match op {
            Operation::List => self.loading_list,
            Operation::LoadOne => self.loading_one,
            Operation::Create => self.creating,
            Operation::Update => self.updating,
            Operation::Delete => self.deleting,
            Operation::Reorder => self.reordering,
        }
    }

    pub(crate) fn set(&mut self, op: Operation, value: bool) {
        let slot = match op {
            Operation::List => &mut self.loading_list,
            Operation::LoadOne => &mut self.loading_one,
            Operation::Create => &mut self.creating,
            Operation::Update => &mut self.updating,
            Operation::Delete => &mut self.deleting,
            Operation::Reorder => &mut self.reordering,
        };
        *slot = value;
    }

    pub fn any(&self) -> bool {
        *self != OperationFlags::default()
    }
}

/// Last error message per operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationErrors {
    pub list: Option<String>,
    pub load_one: Option<String>,
    pub create: Option<String>,
    pub update: Option<String>,
    pub delete: Option<String>,
    pub reorder: Option<String>,
}

impl OperationErrors {
    pub fn get(&self, op: Operation) -> Option<&str> {
        match op {
            Operation::List => self.list.as_deref(),
            Operation::LoadOne => self.load_one.as_deref(),
            Operation::Create => self.create.as_deref(),
            Operation::Update => self.update.as_deref(),
            Operation::Delete => self.delete.as_deref(),
            Operation::Reorder => self.reorder.as_deref(),
        }
    }

    pub(crate) fn set(&mut self, op: Operation, value: Option<String>) {
        let slot = match op {
            Operation::List => &mut self.list,
            Operation::LoadOne => &mut self.load_one,
            Operation::Create => &mut self.create,
            Operation::Update => &mut self.update,
            Operation::Delete => &mut self.delete,
            Operation::Reorder => &mut self.reorder,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        *self == OperationErrors::default()
    }
}

// =============================================================================
// Store State
// =============================================================================

/// Everything a store publishes to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState<R: Resource> {
    pub entry: CacheEntry<R>,
    /// Explicit single-item selection, resolved against `entry`.
    pub current_id: Option<String>,
    pub flags: OperationFlags,
    pub errors: OperationErrors,
}

impl<R: Resource> Default for StoreState<R> {
    fn default() -> Self {
        StoreState {
            entry: CacheEntry::default(),
            current_id: None,
            flags: OperationFlags::default(),
            errors: OperationErrors::default(),
        }
    }
}

impl<R: Resource> StoreState<R> {
    pub fn current(&self) -> Option<&R> {
        self.current_id
            .as_deref()
            .and_then(|id| self.entry.find(id))
    }
}

// =============================================================================
// Operation Guard
// =============================================================================

/// Holds an operation's flag up. Lowers it on `succeed`/`fail`, or on drop
/// if the operation never got that far.
pub(crate) struct OperationGuard<'a, R: Resource> {
    subject: &'a Subject<StoreState<R>>,
    op: Operation,
    armed: bool,
}

impl<R: Resource> OperationGuard<'_, R> {
    /// Applies the success patch and lowers the flag in one update.
    pub(crate) fn succeed<U>(mut self, patch: impl FnOnce(&mut StoreState<R>) -> U) -> U {
        let op = self.op;
        let out = self.subject.update(|state| {
            let out = patch(state);
            state.flags.set(op, false);
            out
        });
        self.armed = false;
        out
    }

    /// Applies the failure patch (rollback, if any), records the error and
    /// lowers the flag in one update.
    pub(crate) fn fail(mut self, err: &StoreError, patch: impl FnOnce(&mut StoreState<R>)) {
        let op = self.op;
        let message = err.to_string();
        self.subject.update(|state| {
            patch(state);
            state.errors.set(op, Some(message));
            state.flags.set(op, false);
        });
        self.armed = false;
    }
}

impl<R: Resource> Drop for OperationGuard<'_, R> {
    fn drop(&mut self) {
        if self.armed {
            let op = self.op;
            self.subject.update(|state| state.flags.set(op, false));
        }
    }
}

// =============================================================================
// Resource Store
// =============================================================================

/// Cache manager for one resource collection.
pub struct ResourceStore<R: Resource> {
    subject: Subject<StoreState<R>>,
    client: Arc<dyn RemoteResourceClient<R>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<R: Resource> ResourceStore<R> {
    pub fn new(client: Arc<dyn RemoteResourceClient<R>>, ttl: Duration) -> Self {
        Self::with_clock(client, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        client: Arc<dyn RemoteResourceClient<R>>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ResourceStore {
            subject: Subject::new(StoreState::default()),
            client,
            clock,
            ttl,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        R::KIND
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // =========================================================================
    // Remote Operations
    // =========================================================================

    /// Lists the collection, answering from cache while it is fresh.
    ///
    /// A cached list is reused only if it was fetched with an equal filter
    /// and is younger than the TTL. `force` always goes to the server.
    pub async fn load_all(&self, filter: R::Filter, force: bool) -> StoreResult<Vec<R>> {
        let resource = R::KIND.name();

        if !force {
            let now = self.clock.now();
            let hit = self.subject.read(|state| {
                state
                    .entry
                    .is_fresh_for(&filter, now, self.ttl)
                    .then(|| state.entry.collection.clone())
            });
            if let Some(items) = hit {
                debug!(resource, count = items.len(), "Cache hit");
                return Ok(items);
            }
        }

        debug!(resource, force, "Cache miss, listing from server");
        let guard = self.begin(Operation::List);

        match self.client.list(&filter).await {
            Ok(items) => {
                let now = self.clock.now();
                let count = items.len();
                guard.succeed(|state| {
                    state.entry.replace(items.clone(), filter, now);
                    if let Some(id) = state.current_id.as_deref() {
                        if !state.entry.contains(id) {
                            state.current_id = None;
                        }
                    }
                });
                info!(resource, count, "Collection loaded");
                Ok(items)
            }
            Err(e) => {
                let err = StoreError::from(e);
                warn!(resource, error = %err, "List failed, keeping cached collection");
                guard.fail(&err, |_| {});
                Err(err)
            }
        }
    }

    /// Loads one element and makes it the current selection.
    ///
    /// Without `force`, an element already in the cache is served locally.
    /// `fetched_at` is not touched: one element says nothing about the
    /// freshness of the whole list.
    pub async fn load_one(&self, id: &str, force: bool) -> StoreResult<R> {
        let resource = R::KIND.name();

        if !force {
            let cached = self.subject.update(|state| {
                let found = state.entry.find(id).cloned();
                if found.is_some() {
                    state.current_id = Some(id.to_string());
                }
                found
            });
            if let Some(item) = cached {
                debug!(resource, id, "Cache hit");
                return Ok(item);
            }
        }

        let guard = self.begin(Operation::LoadOne);

        match self.client.get(id).await {
            Ok(item) => {
                guard.succeed(|state| {
                    state.current_id = Some(item.id().to_string());
                    state.entry.upsert(item.clone());
                });
                debug!(resource, id, "Element loaded");
                Ok(item)
            }
            Err(e) => {
                let err = StoreError::from(e);
                warn!(resource, id, error = %err, "Load failed");
                guard.fail(&err, |_| {});
                Err(err)
            }
        }
    }

    /// Creates an element, appends it to the cache and selects it.
    pub async fn create(&self, draft: &R::Draft) -> StoreResult<R> {
        let resource = R::KIND.name();
        R::validate_draft(draft)?;

        let guard = self.begin(Operation::Create);

        match self.client.create(draft).await {
            Ok(created) => {
                guard.succeed(|state| {
                    state.current_id = Some(created.id().to_string());
                    state.entry.upsert(created.clone());
                });
                info!(resource, id = created.id(), "Created");
                Ok(created)
            }
            Err(e) => {
                let err = StoreError::from(e);
                warn!(resource, error = %err, "Create failed");
                guard.fail(&err, |_| {});
                Err(err)
            }
        }
    }

    /// Updates an element and replaces the cached copy.
    ///
    /// The request is sent even if `id` is not cached. The cache is then
    /// left alone: an element the store never listed is not inserted.
    pub async fn update(&self, id: &str, patch: &R::Patch) -> StoreResult<R> {
        let resource = R::KIND.name();
        R::validate_patch(patch)?;

        let guard = self.begin(Operation::Update);

        match self.client.update(id, patch).await {
            Ok(updated) => {
                let replaced = guard.succeed(|state| state.entry.replace_one(id, updated.clone()));
                if replaced {
                    info!(resource, id, "Updated");
                } else {
                    debug!(resource, id, "Updated element is not cached, cache unchanged");
                }
                Ok(updated)
            }
            Err(e) => {
                let err = StoreError::from(e);
                warn!(resource, id, error = %err, "Update failed");
                guard.fail(&err, |_| {});
                Err(err)
            }
        }
    }

    /// Deletes an element and removes it from the cache.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let resource = R::KIND.name();
        let guard = self.begin(Operation::Delete);

        match self.client.delete(id).await {
            Ok(()) => {
                let removed = guard.succeed(|state| {
                    if state.current_id.as_deref() == Some(id) {
                        state.current_id = None;
                    }
                    state.entry.remove(id)
                });
                if removed {
                    info!(resource, id, "Deleted");
                } else {
                    debug!(resource, id, "Deleted element is not cached, cache unchanged");
                }
                Ok(())
            }
            Err(e) => {
                let err = StoreError::from(e);
                warn!(resource, id, error = %err, "Delete failed");
                guard.fail(&err, |_| {});
                Err(err)
            }
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Selects a cached element.
    pub fn select(&self, id: &str) -> StoreResult<()> {
        self.subject.update(|state| {
            if !state.entry.contains(id) {
                return Err(StoreError::StaleState {
                    resource: R::KIND.name(),
                    id: id.to_string(),
                });
            }
            state.current_id = Some(id.to_string());
            Ok(())
        })
    }

    pub fn clear_selection(&self) {
        self.subject.update(|state| state.current_id = None);
    }

    pub fn current(&self) -> Option<R> {
        self.subject.read(|state| state.current().cloned())
    }

    // =========================================================================
    // Derived Views
    // =========================================================================

    pub fn snapshot(&self) -> StoreState<R> {
        self.subject.snapshot()
    }

    pub fn items(&self) -> Vec<R> {
        self.subject.read(|state| state.entry.collection.clone())
    }

    pub fn count(&self) -> usize {
        self.subject.read(|state| state.entry.collection.len())
    }

    pub fn find(&self, id: &str) -> Option<R> {
        self.subject.read(|state| state.entry.find(id).cloned())
    }

    pub fn filtered(&self, predicate: impl Fn(&R) -> bool) -> Vec<R> {
        self.subject.read(|state| {
            state
                .entry
                .collection
                .iter()
                .filter(|r| predicate(r))
                .cloned()
                .collect()
        })
    }

    pub fn is_stale(&self) -> bool {
        let now = self.clock.now();
        self.subject.read(|state| state.entry.is_stale(now, self.ttl))
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.subject.read(|state| state.entry.fetched_at)
    }

    pub fn flags(&self) -> OperationFlags {
        self.subject.read(|state| state.flags)
    }

    pub fn errors(&self) -> OperationErrors {
        self.subject.read(|state| state.errors.clone())
    }

    // =========================================================================
    // Reset
    // =========================================================================

    /// Drops the collection, its stamp, the selection and all errors.
    pub fn clear_cache(&self) {
        self.subject.update(|state| {
            state.entry.invalidate();
            state.current_id = None;
            state.errors = OperationErrors::default();
        });
        debug!(resource = R::KIND.name(), "Cache cleared");
    }

    pub fn clear_errors(&self) {
        self.subject
            .update(|state| state.errors = OperationErrors::default());
    }

    // =========================================================================
    // Observation
    // =========================================================================

    pub fn subscribe(
        &self,
        callback: impl Fn(&StoreState<R>) + Send + Sync + 'static,
    ) -> Subscription {
        self.subject.subscribe(callback)
    }

    pub fn watch(&self) -> watch::Receiver<StoreState<R>> {
        self.subject.watch()
    }

    // =========================================================================
    // Crate Internals
    // =========================================================================

    /// Raises the flag of `op` and clears its previous error.
    pub(crate) fn begin(&self, op: Operation) -> OperationGuard<'_, R> {
        self.subject.update(|state| {
            state.flags.set(op, true);
            state.errors.set(op, None);
        });
        OperationGuard {
            subject: &self.subject,
            op,
            armed: true,
        }
    }

    pub(crate) fn subject(&self) -> &Subject<StoreState<R>> {
        &self.subject
    }

    pub(crate) fn client(&self) -> &Arc<dyn RemoteResourceClient<R>> {
        &self.client
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl<R: Orderable> ResourceStore<R> {
    /// Cached elements of one scope, in collection order.
    pub fn in_scope(&self, scope: &str) -> Vec<R> {
        self.filtered(|r| r.scope() == scope)
    }

    /// Cached elements of one scope, ordered by position.
    pub fn sorted_by_position(&self, scope: &str) -> Vec<R> {
        let mut items = self.in_scope(scope);
        items.sort_by_key(|r| r.position());
        items
    }
}

impl<R: Resource> std::fmt::Debug for ResourceStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore")
            .field("resource", &R::KIND.name())
            .field("ttl", &self.ttl)
            .field("count", &self.count())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::testing::{dish, dish_client, dish_draft, Call};
    use menu_core::{Dish, DishFilter, DishPatch, Money};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(150);

    fn seeded() -> Vec<Dish> {
        vec![dish("d1", "c1", 0), dish("d2", "c1", 1), dish("d3", "c2", 0)]
    }

    fn store_with(
        items: Vec<Dish>,
    ) -> (
        ResourceStore<Dish>,
        Arc<crate::testing::FakeClient<Dish>>,
        Arc<ManualClock>,
    ) {
        let client = dish_client(items);
        let clock = Arc::new(ManualClock::default());
        let store = ResourceStore::<Dish>::with_clock(client.clone(), TTL, clock.clone());
        (store, client, clock)
    }

    // =========================================================================
    // load_all
    // =========================================================================

    #[tokio::test]
    async fn test_load_all_twice_within_ttl_calls_remote_once() {
        let (store, client, clock) = store_with(seeded());

        let first = store.load_all(DishFilter::default(), false).await.unwrap();
        clock.advance(Duration::from_secs(60));
        let second = store.load_all(DishFilter::default(), false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(client.calls(Call::List), 1);
    }

    #[tokio::test]
    async fn test_load_all_after_ttl_refetches() {
        let (store, client, clock) = store_with(seeded());

        store.load_all(DishFilter::default(), false).await.unwrap();
        clock.advance(TTL);
        assert!(store.is_stale());
        store.load_all(DishFilter::default(), false).await.unwrap();

        assert_eq!(client.calls(Call::List), 2);
    }

    #[tokio::test]
    async fn test_force_reload_bypasses_cache() {
        let (store, client, _clock) = store_with(seeded());

        store.load_all(DishFilter::default(), false).await.unwrap();
        store.load_all(DishFilter::default(), true).await.unwrap();

        assert_eq!(client.calls(Call::List), 2);
    }

    #[tokio::test]
    async fn test_different_filter_is_a_miss() {
        let (store, client, _clock) = store_with(seeded());
        let by_category = DishFilter {
            restaurant_id: None,
            category_id: Some("c1".into()),
        };

        store.load_all(DishFilter::default(), false).await.unwrap();
        store.load_all(by_category.clone(), false).await.unwrap();
        store.load_all(by_category, false).await.unwrap();

        assert_eq!(client.calls(Call::List), 2);
    }

    #[tokio::test]
    async fn test_load_all_failure_keeps_cache_and_records_error() {
        let (store, client, clock) = store_with(seeded());
        store.load_all(DishFilter::default(), false).await.unwrap();
        let before = store.snapshot().entry;

        clock.advance(TTL);
        client.fail_next(Call::List);
        let err = store.load_all(DishFilter::default(), false).await.unwrap_err();

        assert!(err.is_retryable());
        let after = store.snapshot();
        assert_eq!(after.entry, before);
        assert!(!after.flags.loading_list);
        assert!(after.errors.list.as_deref().unwrap().contains("scripted"));
    }

    #[tokio::test]
    async fn test_loading_flag_cleared_when_client_panics() {
        let (store, client, _clock) = store_with(seeded());
        let store = Arc::new(store);
        client.panic_next(Call::List);

        let task = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.load_all(DishFilter::default(), false).await })
        };

        assert!(task.await.is_err());
        assert!(!store.flags().loading_list);
        assert!(store.snapshot().entry.fetched_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_flag_cleared_when_future_dropped() {
        let (store, client, _clock) = store_with(seeded());
        client.hang_next(Call::List);

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            store.load_all(DishFilter::default(), false),
        )
        .await;

        assert!(result.is_err());
        assert!(!store.flags().loading_list);
    }

    #[tokio::test]
    async fn test_loading_flag_visible_while_in_flight() {
        let (store, client, _clock) = store_with(seeded());
        let store = Arc::new(store);
        let gate = client.gate(Call::List);

        let task = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.load_all(DishFilter::default(), false).await })
        };
        while client.calls(Call::List) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(store.flags().loading_list);

        gate.notify_one();
        task.await.unwrap().unwrap();
        assert!(!store.flags().loading_list);
        assert_eq!(store.count(), 3);
    }

    // =========================================================================
    // create / update / delete
    // =========================================================================

    #[tokio::test]
    async fn test_create_appends_and_selects() {
        let (store, _client, _clock) = store_with(seeded());
        store.load_all(DishFilter::default(), false).await.unwrap();
        let before = store.items();

        let created = store.create(&dish_draft("Tacos", "c1", 900)).await.unwrap();

        let after = store.items();
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(&after[..before.len()], &before[..]);
        assert_eq!(after.iter().filter(|d| **d == created).count(), 1);
        assert_eq!(store.current(), Some(created));
    }

    #[tokio::test]
    async fn test_create_failure_leaves_cache() {
        let (store, client, _clock) = store_with(seeded());
        store.load_all(DishFilter::default(), false).await.unwrap();
        let before = store.snapshot().entry;

        client.fail_next(Call::Create);
        assert!(store.create(&dish_draft("Tacos", "c1", 900)).await.is_err());

        let after = store.snapshot();
        assert_eq!(after.entry, before);
        assert!(after.errors.create.is_some());
        assert!(after.current_id.is_none());
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_client_or_flags() {
        let (store, client, _clock) = store_with(seeded());
        let raised = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&raised);
        let _sub = store.subscribe(move |state| {
            if state.flags.creating {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let err = store.create(&dish_draft("", "c1", 900)).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(client.calls(Call::Create), 0);
        assert_eq!(raised.load(Ordering::SeqCst), 0);
        assert!(store.errors().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_cached_element() {
        let (store, _client, _clock) = store_with(seeded());
        store.load_all(DishFilter::default(), false).await.unwrap();
        store.select("d2").unwrap();

        let patch = DishPatch {
            price: Some(Money::from_cents(1299)),
            ..DishPatch::default()
        };
        let updated = store.update("d2", &patch).await.unwrap();

        assert_eq!(updated.price.cents(), 1299);
        assert_eq!(store.find("d2"), Some(updated.clone()));
        assert_eq!(store.current(), Some(updated));
        assert_eq!(store.items()[1].id, "d2");
    }

    #[tokio::test]
    async fn test_update_unknown_id_does_not_insert() {
        let (store, client, _clock) = store_with(seeded());
        store.load_all(DishFilter::default(), false).await.unwrap();
        client.insert(dish("remote-only", "c9", 0));

        let patch = DishPatch {
            name: Some("Renamed".into()),
            ..DishPatch::default()
        };
        store.update("remote-only", &patch).await.unwrap();

        assert_eq!(client.calls(Call::Update), 1);
        assert_eq!(store.count(), 3);
        assert!(store.find("remote-only").is_none());
    }

    #[tokio::test]
    async fn test_update_failure_records_error_only_for_update() {
        let (store, client, _clock) = store_with(seeded());
        store.load_all(DishFilter::default(), false).await.unwrap();
        let before = store.snapshot().entry;

        client.fail_next(Call::Update);
        let patch = DishPatch {
            name: Some("Renamed".into()),
            ..DishPatch::default()
        };
        assert!(store.update("d1", &patch).await.is_err());
        store.create(&dish_draft("Soup", "c1", 500)).await.unwrap();

        let errors = store.errors();
        assert!(errors.update.is_some());
        assert!(errors.create.is_none());
        assert_eq!(store.snapshot().entry.collection[..3], before.collection[..]);
    }

    #[tokio::test]
    async fn test_delete_removes_and_clears_selection() {
        let (store, _client, _clock) = store_with(seeded());
        store.load_all(DishFilter::default(), false).await.unwrap();
        store.select("d1").unwrap();

        store.delete("d1").await.unwrap();

        assert!(store.find("d1").is_none());
        assert!(store.current().is_none());
        let ids: Vec<_> = store.items().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["d2", "d3"]);
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_cache() {
        let (store, client, _clock) = store_with(seeded());
        store.load_all(DishFilter::default(), false).await.unwrap();
        store.select("d1").unwrap();
        let before = store.snapshot();

        client.fail_next(Call::Delete);
        assert!(store.delete("d1").await.is_err());

        let after = store.snapshot();
        assert_eq!(after.entry, before.entry);
        assert_eq!(after.current_id, before.current_id);
        assert!(after.errors.delete.is_some());
        assert!(!after.flags.deleting);
    }

    #[tokio::test]
    async fn test_mutations_do_not_move_fetch_stamp() {
        let (store, _client, clock) = store_with(seeded());
        store.load_all(DishFilter::default(), false).await.unwrap();
        let stamp = store.fetched_at();

        clock.advance(Duration::from_secs(10));
        store.create(&dish_draft("Soup", "c1", 500)).await.unwrap();
        store.delete("d1").await.unwrap();

        assert_eq!(store.fetched_at(), stamp);
    }

    // =========================================================================
    // load_one / selection / views
    // =========================================================================

    #[tokio::test]
    async fn test_load_one_upserts_without_stamping() {
        let (store, client, _clock) = store_with(seeded());

        let loaded = store.load_one("d2", false).await.unwrap();

        assert_eq!(loaded.id, "d2");
        assert_eq!(store.count(), 1);
        assert_eq!(store.current(), Some(loaded));
        assert!(store.fetched_at().is_none());

        store.load_one("d2", false).await.unwrap();
        assert_eq!(client.calls(Call::Get), 1);
        store.load_one("d2", true).await.unwrap();
        assert_eq!(client.calls(Call::Get), 2);
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn test_select_unknown_id_is_stale() {
        let (store, _client, _clock) = store_with(seeded());
        let err = store.select("nope").unwrap_err();
        assert!(matches!(err, StoreError::StaleState { resource: "dishes", .. }));
    }

    #[tokio::test]
    async fn test_reload_drops_vanished_selection() {
        let (store, client, _clock) = store_with(seeded());
        store.load_all(DishFilter::default(), false).await.unwrap();
        store.select("d3").unwrap();

        client.remove("d3");
        store.load_all(DishFilter::default(), true).await.unwrap();

        assert!(store.snapshot().current_id.is_none());
    }

    #[tokio::test]
    async fn test_scope_views() {
        let items = vec![dish("a", "c1", 2), dish("b", "c1", 0), dish("x", "c2", 0), dish("c", "c1", 1)];
        let (store, _client, _clock) = store_with(items);
        store.load_all(DishFilter::default(), false).await.unwrap();

        let in_scope: Vec<_> = store.in_scope("c1").into_iter().map(|d| d.id).collect();
        assert_eq!(in_scope, ["a", "b", "c"]);

        let sorted: Vec<_> = store.sorted_by_position("c1").into_iter().map(|d| d.id).collect();
        assert_eq!(sorted, ["b", "c", "a"]);

        assert_eq!(store.filtered(|d| d.category_id == "c2").len(), 1);
    }

    #[tokio::test]
    async fn test_clear_cache_resets_entry() {
        let (store, client, _clock) = store_with(seeded());
        store.load_all(DishFilter::default(), false).await.unwrap();
        store.select("d1").unwrap();
        client.fail_next(Call::Delete);
        let _ = store.delete("d2").await;

        store.clear_cache();

        let state = store.snapshot();
        assert!(state.entry.collection.is_empty());
        assert!(state.entry.fetched_at.is_none());
        assert!(state.current_id.is_none());
        assert!(state.errors.is_empty());

        store.load_all(DishFilter::default(), false).await.unwrap();
        assert_eq!(client.calls(Call::List), 2);
    }

    #[tokio::test]
    async fn test_clear_errors() {
        let (store, client, _clock) = store_with(seeded());
        client.fail_next(Call::List);
        let _ = store.load_all(DishFilter::default(), false).await;
        assert!(!store.errors().is_empty());

        store.clear_errors();
        assert!(store.errors().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_each_change() {
        let (store, _client, _clock) = store_with(seeded());
        let counts = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&counts);
        let sub = store.subscribe(move |state| {
            sink.lock().unwrap().push(state.entry.collection.len());
        });

        store.load_all(DishFilter::default(), false).await.unwrap();
        sub.unsubscribe();
        store.delete("d1").await.unwrap();

        let seen = counts.lock().unwrap().clone();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&3));
    }

    #[test]
    fn test_flags_and_errors_accessors() {
        let mut flags = OperationFlags::default();
        assert!(!flags.any());
        flags.set(Operation::Reorder, true);
        assert!(flags.get(Operation::Reorder));
        assert!(flags.reordering);
        assert!(flags.any());

        let mut errors = OperationErrors::default();
        errors.set(Operation::Delete, Some("boom".into()));
        assert_eq!(errors.get(Operation::Delete), Some("boom"));
        assert_eq!(errors.get(Operation::Create), None);
    }
}
