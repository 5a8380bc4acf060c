//! # Favorites
//!
//! Optimistic bookmark toggling on top of a `ResourceStore<Favorite>`.
//!
//! | Toggle | Local change (immediate)        | On success               | On failure                  |
//! |--------|---------------------------------|--------------------------|-----------------------------|
//! | add    | insert provisional `pending-…`  | swap in the server copy  | drop the provisional entry  |
//! | remove | remove the bookmark             | done                     | re-insert it where it was   |
//!
//! A rollback only undoes its own change. Toggling a bookmark that is still
//! provisional does nothing until the server answers.
//!
//! Favorites belong to the signed-in user and are dropped on logout.

use std::sync::Arc;

use menu_core::{Favorite, FavoriteDraft};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::{Operation, ResourceStore};

/// Id prefix of a bookmark the server has not confirmed yet.
pub const PROVISIONAL_PREFIX: &str = "pending-";

#[derive(Debug, Clone)]
pub struct FavoriteStore {
    store: Arc<ResourceStore<Favorite>>,
}

impl FavoriteStore {
    pub fn new(store: Arc<ResourceStore<Favorite>>) -> Self {
        FavoriteStore { store }
    }

    pub fn store(&self) -> &Arc<ResourceStore<Favorite>> {
        &self.store
    }

    /// Lists the signed-in user's favorites.
    pub async fn load(&self, force: bool) -> StoreResult<Vec<Favorite>> {
        self.store.load_all((), force).await
    }

    /// True if the restaurant is bookmarked, provisionally or not.
    pub fn is_favorite(&self, restaurant_id: &str) -> bool {
        self.store
            .subject()
            .read(|state| state.entry.collection.iter().any(|f| f.restaurant_id == restaurant_id))
    }

    /// Bookmarks or un-bookmarks a restaurant. Returns the new state.
    pub async fn toggle(&self, restaurant_id: &str) -> StoreResult<bool> {
        let existing = self.store.subject().read(|state| {
            state
                .entry
                .collection
                .iter()
                .find(|f| f.restaurant_id == restaurant_id)
                .map(|f| f.id.clone())
        });

        match existing {
            Some(id) if id.starts_with(PROVISIONAL_PREFIX) => {
                debug!(resource = "favorites", restaurant_id, "Favorite still pending, toggle ignored");
                Ok(true)
            }
            Some(id) => {
                self.remove(&id, restaurant_id).await?;
                Ok(false)
            }
            None => {
                self.add(restaurant_id).await?;
                Ok(true)
            }
        }
    }

    async fn add(&self, restaurant_id: &str) -> StoreResult<()> {
        let provisional = Favorite {
            id: format!("{PROVISIONAL_PREFIX}{}", uuid::Uuid::new_v4()),
            restaurant_id: restaurant_id.to_string(),
            created_at: self.store.now(),
        };
        let provisional_id = provisional.id.clone();

        let guard = self.store.begin(Operation::Create);
        self.store.subject().update(|state| state.entry.collection.push(provisional));
        debug!(resource = "favorites", restaurant_id, "Provisional favorite added");

        let draft = FavoriteDraft {
            restaurant_id: restaurant_id.to_string(),
        };
        match self.store.client().create(&draft).await {
            Ok(created) => {
                let id = created.id.clone();
                let swapped = guard.succeed(|state| state.entry.replace_one(&provisional_id, created));
                if swapped {
                    info!(resource = "favorites", restaurant_id, id = %id, "Favorite saved");
                } else {
                    debug!(resource = "favorites", restaurant_id, "Provisional favorite gone, server copy dropped");
                }
                Ok(())
            }
            Err(e) => {
                let err = StoreError::from(e);
                warn!(resource = "favorites", restaurant_id, error = %err, "Add favorite failed, rolling back");
                guard.fail(&err, |state| {
                    state.entry.remove(&provisional_id);
                });
                Err(err)
            }
        }
    }

    async fn remove(&self, id: &str, restaurant_id: &str) -> StoreResult<()> {
        let guard = self.store.begin(Operation::Delete);
        let removed = self.store.subject().update(|state| {
            let index = state.entry.collection.iter().position(|f| f.id == id)?;
            Some((index, state.entry.collection.remove(index)))
        });
        debug!(resource = "favorites", restaurant_id, "Favorite removed locally");

        match self.store.client().delete(id).await {
            Ok(()) => {
                guard.succeed(|_| ());
                info!(resource = "favorites", restaurant_id, "Favorite removed");
                Ok(())
            }
            Err(e) => {
                let err = StoreError::from(e);
                warn!(resource = "favorites", restaurant_id, error = %err, "Remove favorite failed, rolling back");
                guard.fail(&err, |state| {
                    if let Some((index, favorite)) = removed {
                        // A reload may have brought it back already.
                        if !state.entry.contains(&favorite.id) {
                            let index = index.min(state.entry.collection.len());
                            state.entry.collection.insert(index, favorite);
                        }
                    }
                });
                Err(err)
            }
        }
    }
}
