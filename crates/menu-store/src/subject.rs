//! # Observable Subject
//!
//! The state container behind every store: a value plus the parties
//! watching it.
//!
//! ## How Changes Propagate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  update(f) ──► lock state ──► f(&mut state) ──► publish to watch ──┐   │
//! │                                                  (still locked)     │   │
//! │                                                                     ▼   │
//! │                 callbacks(&snapshot)  ◄── unlock, clone once  ◄─────┘   │
//! │                                                                         │
//! │  watch() receivers: async consumers (`changed().await`)                │
//! │  subscribe(cb):     sync consumers, called on subscribe and on change  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Publishing happens while the state lock is held, so watch receivers
//! never observe updates out of order. Callbacks run after the lock is
//! released and may read or update the subject themselves.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;

/// Locks a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    callbacks: Vec<(u64, Callback<T>)>,
}

/// An observable value.
pub struct Subject<T> {
    state: Mutex<T>,
    tx: watch::Sender<T>,
    listeners: Arc<Mutex<Listeners<T>>>,
}

impl<T: Clone + Send + Sync + 'static> Subject<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial.clone());
        Subject {
            state: Mutex::new(initial),
            tx,
            listeners: Arc::new(Mutex::new(Listeners {
                next_id: 0,
                callbacks: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    pub fn snapshot(&self) -> T {
        lock(&self.state).clone()
    }

    /// Reads the current value without cloning it.
    pub fn read<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        f(&lock(&self.state))
    }

    /// Mutates the value and notifies every observer.
    pub fn update<U>(&self, f: impl FnOnce(&mut T) -> U) -> U {
        let (out, snapshot) = {
            let mut state = lock(&self.state);
            let out = f(&mut state);
            self.tx.send_replace(state.clone());
            let snapshot = self.has_listeners().then(|| state.clone());
            (out, snapshot)
        };
        if let Some(snapshot) = snapshot {
            self.notify(&snapshot);
        }
        out
    }

    /// Receiver for async consumers. Starts at the current value.
    pub fn watch(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Registers `callback`, calls it once with the current value, then on
    /// every change until the returned [`Subscription`] is dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let callback: Callback<T> = Arc::new(callback);
        let id = {
            let mut listeners = lock(&self.listeners);
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.callbacks.push((id, Arc::clone(&callback)));
            id
        };

        callback(&self.snapshot());

        let weak: Weak<Mutex<Listeners<T>>> = Arc::downgrade(&self.listeners);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    lock(&listeners).callbacks.retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.listeners).callbacks.len()
    }

    fn has_listeners(&self) -> bool {
        !lock(&self.listeners).callbacks.is_empty()
    }

    fn notify(&self, snapshot: &T) {
        // Copy the list so callbacks can subscribe or unsubscribe freely.
        let callbacks: Vec<Callback<T>> = lock(&self.listeners)
            .callbacks
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(snapshot);
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject")
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

/// Handle returned by [`Subject::subscribe`]. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
