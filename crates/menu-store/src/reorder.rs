//! # Position Reorder Controller
//!
//! Optimistic drag-and-drop reordering for orderable resources.
//!
//! ## Reorder Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  reorder(scope, from, to)                                              │
//! │     │                                                                   │
//! │     ├─ indices outside the scope ──► Err(InvalidIndex), nothing sent   │
//! │     │                                                                   │
//! │     ▼  reordering = true                                                │
//! │  ┌────────────────── one synchronous update ───────────────────────┐   │
//! │  │ scope sorted by position ─► splice(from, to) ─► renumber       │   │
//! │  │ remember old positions of the changed items                    │   │
//! │  │ write new positions into the cache   (UI sees it immediately)  │   │
//! │  └────────────────────────────────────────────────────────────────┘   │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  reorder_bulk([{id, new_position}, ...])   (changed items only)        │
//! │     │            │                                                      │
//! │  Ok │            │ Err                                                  │
//! │     ▼            ▼                                                      │
//! │   done     old positions restored, reorder error = message             │
//! │                                                                         │
//! │  reordering = false on every exit                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Calls on the same scope are not serialized. A failed call restores only
//! the positions it changed, so the call that finishes last decides the
//! order of a scope. Other scopes, and items created, updated or deleted
//! while a request is in flight, are never touched by a rollback.

use std::sync::Arc;

use menu_core::ordering::{move_item, renumber};
use menu_core::PositionUpdate;
use tracing::{debug, info, warn};

use crate::cache::CacheEntry;
use crate::client::ReorderClient;
use crate::error::{StoreError, StoreResult};
use crate::resource::Orderable;
use crate::store::{Operation, ResourceStore};

/// Drives reorders of one orderable store.
pub struct PositionReorderController<R: Orderable> {
    store: Arc<ResourceStore<R>>,
    client: Arc<dyn ReorderClient<R>>,
}

impl<R: Orderable> PositionReorderController<R> {
    pub fn new(store: Arc<ResourceStore<R>>, client: Arc<dyn ReorderClient<R>>) -> Self {
        PositionReorderController { store, client }
    }

    pub fn store(&self) -> &Arc<ResourceStore<R>> {
        &self.store
    }

    /// Moves the item at `from` to `to` within `scope` (indices into the
    /// scope ordered by position) and renumbers the whole scope.
    ///
    /// Returns the position updates that were sent. A scope with fewer than
    /// two items, or `from == to`, sends nothing.
    pub async fn reorder(
        &self,
        scope: &str,
        from: usize,
        to: usize,
    ) -> StoreResult<Vec<PositionUpdate>> {
        let resource = R::KIND.name();

        let len = self.store.in_scope(scope).len();
        if len >= 2 {
            for index in [from, to] {
                if index >= len {
                    return Err(StoreError::InvalidIndex { index, len });
                }
            }
        }

        let guard = self.store.begin(Operation::Reorder);

        let (previous, updates) = self
            .store
            .subject()
            .update(|state| splice_scope(&mut state.entry, scope, from, to))?;

        if updates.is_empty() {
            debug!(resource, scope, from, to, "Reorder is a no-op");
            guard.succeed(|_| ());
            return Ok(updates);
        }

        debug!(resource, scope, from, to, changed = updates.len(), "Reorder applied locally");

        match self.client.reorder_bulk(&updates).await {
            Ok(()) => {
                guard.succeed(|_| ());
                info!(resource, scope, changed = updates.len(), "Reorder saved");
                Ok(updates)
            }
            Err(e) => {
                let err = StoreError::from(e);
                warn!(resource, scope, error = %err, "Reorder failed, rolling back");
                guard.fail(&err, |state| restore_positions(&mut state.entry, &previous));
                Err(err)
            }
        }
    }

    /// Moves the item with `id` to index `to` of its scope.
    pub async fn move_to(&self, id: &str, to: usize) -> StoreResult<Vec<PositionUpdate>> {
        let (scope, from) = self.locate(id)?;
        self.reorder(&scope, from, to).await
    }

    /// Sets one item's position without touching its siblings.
    ///
    /// The caller is responsible for choosing a position that keeps the
    /// scope consistent. An id that is not cached fails with `StaleState`
    /// before anything is sent.
    pub async fn reposition(&self, id: &str, new_position: i64) -> StoreResult<()> {
        let resource = R::KIND.name();

        let current = self.store.find(id).ok_or_else(|| StoreError::StaleState {
            resource,
            id: id.to_string(),
        })?;
        if current.position() == new_position {
            debug!(resource, id, new_position, "Reposition is a no-op");
            return Ok(());
        }

        let guard = self.store.begin(Operation::Reorder);

        let previous = self.store.subject().update(|state| {
            state.entry.find_mut(id).map(|item| {
                let old = (item.id().to_string(), item.position());
                item.set_position(new_position);
                old
            })
        });

        let update = [PositionUpdate {
            id: id.to_string(),
            new_position,
        }];

        match self.client.reorder_bulk(&update).await {
            Ok(()) => {
                guard.succeed(|_| ());
                info!(resource, id, new_position, "Position saved");
                Ok(())
            }
            Err(e) => {
                let err = StoreError::from(e);
                warn!(resource, id, error = %err, "Reposition failed, rolling back");
                guard.fail(&err, |state| restore_positions(&mut state.entry, previous.as_slice()));
                Err(err)
            }
        }
    }

    /// Scope and index (by position) of a cached item.
    fn locate(&self, id: &str) -> StoreResult<(String, usize)> {
        let item = self.store.find(id).ok_or_else(|| StoreError::StaleState {
            resource: R::KIND.name(),
            id: id.to_string(),
        })?;
        let scope = item.scope().to_string();
        let index = self
            .store
            .sorted_by_position(&scope)
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| StoreError::StaleState {
                resource: R::KIND.name(),
                id: id.to_string(),
            })?;
        Ok((scope, index))
    }
}

/// Moves `from` to `to` within `scope` (ordered by position) and renumbers
/// the scope in place.
///
/// Returns the previous positions of the items that changed, along with the
/// updates to send. A scope with fewer than two items changes nothing.
fn splice_scope<R: Orderable>(
    entry: &mut CacheEntry<R>,
    scope: &str,
    from: usize,
    to: usize,
) -> StoreResult<(Vec<(String, i64)>, Vec<PositionUpdate>)> {
    let mut scoped: Vec<R> = entry
        .collection
        .iter()
        .filter(|r| r.scope() == scope)
        .cloned()
        .collect();
    if scoped.len() < 2 {
        return Ok((Vec::new(), Vec::new()));
    }
    scoped.sort_by_key(|r| r.position());

    if !move_item(&mut scoped, from, to) {
        return Err(StoreError::InvalidIndex {
            index: from.max(to),
            len: scoped.len(),
        });
    }
    let updates = renumber(
        &mut scoped,
        R::POSITION_BASE,
        |r| (r.id(), r.position()),
        |r, position| r.set_position(position),
    );

    let mut previous = Vec::with_capacity(updates.len());
    for update in &updates {
        if let Some(item) = entry.find_mut(&update.id) {
            previous.push((update.id.clone(), item.position()));
            item.set_position(update.new_position);
        }
    }
    Ok((previous, updates))
}

/// Puts the listed items back at their old positions. Items that have left
/// the cache since are skipped.
fn restore_positions<R: Orderable>(entry: &mut CacheEntry<R>, previous: &[(String, i64)]) {
    for (id, position) in previous {
        if let Some(item) = entry.find_mut(id) {
            item.set_position(*position);
        }
    }
}

impl<R: Orderable> std::fmt::Debug for PositionReorderController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionReorderController")
            .field("resource", &R::KIND.name())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
