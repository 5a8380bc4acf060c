//! # Cache Entry and Clock
//!
//! A cached collection plus the stamp that decides whether it may be served
//! without a network call.
//!
//! ## Staleness
//! ```text
//!   fetched_at                         fetched_at + ttl
//!       │◄─────────── fresh ────────────►│◄──────── stale ────────►
//!       │  load_all(same filter) is      │  load_all goes to the
//!       │  answered from cache           │  remote client
//! ```
//!
//! `fetched_at` is `Some` only while `collection` reflects a successful
//! list fetch. Creates, updates and deletes patch the collection but do not
//! move the stamp.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::resource::Resource;
use crate::subject::lock;

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" for staleness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *lock(&self.now) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

// =============================================================================
// Cache Entry
// =============================================================================

/// The cached collection of one store.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<R: Resource> {
    pub collection: Vec<R>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Filter the collection was listed with.
    pub filter: Option<R::Filter>,
}

impl<R: Resource> Default for CacheEntry<R> {
    fn default() -> Self {
        CacheEntry {
            collection: Vec::new(),
            fetched_at: None,
            filter: None,
        }
    }
}

impl<R: Resource> CacheEntry<R> {
    /// True if a list with `filter` can be answered from this entry at `now`.
    pub fn is_fresh_for(&self, filter: &R::Filter, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.filter.as_ref() == Some(filter) && !self.is_stale(now, ttl)
    }

    /// True if the entry was never fetched or is older than `ttl`.
    ///
    /// A stamp in the future (clock moved backwards) counts as stale.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.fetched_at {
            None => true,
            Some(fetched_at) => match now.signed_duration_since(fetched_at).to_std() {
                Ok(age) => age >= ttl,
                Err(_) => true,
            },
        }
    }

    /// Replaces the collection with a fresh list result.
    pub fn replace(&mut self, collection: Vec<R>, filter: R::Filter, now: DateTime<Utc>) {
        self.collection = collection;
        self.filter = Some(filter);
        self.fetched_at = Some(now);
    }

    /// Drops the collection and its stamp.
    pub fn invalidate(&mut self) {
        *self = CacheEntry::default();
    }

    pub fn find(&self, id: &str) -> Option<&R> {
        self.collection.iter().find(|r| r.id() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut R> {
        self.collection.iter_mut().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Replaces the element with the same id in place, or appends.
    pub fn upsert(&mut self, item: R) {
        match self.find_mut(item.id()) {
            Some(slot) => *slot = item,
            None => self.collection.push(item),
        }
    }

    /// Replaces the element with this id. Returns false if it is not cached.
    pub fn replace_one(&mut self, id: &str, item: R) -> bool {
        match self.find_mut(id) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Removes the element with this id. Returns false if it is not cached.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.collection.len();
        self.collection.retain(|r| r.id() != id);
        self.collection.len() != before
    }
}
