//! # menu-store: Resource Caches and Cart Engine for the Menu Client
//!
//! Every piece of client-side state that mirrors the server or outlives a
//! session lives in this crate.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Menu Client Data Layer                          │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  MenuStores (wiring root)                        │  │
//! │  │                                                                  │  │
//! │  │  Built once at startup from injected clients, a persistence     │  │
//! │  │  adapter and ClientConfig                                        │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ ResourceStore  │  │ PositionReorder│  │ CartAggregationEngine  │    │
//! │  │                │  │ Controller     │  │                        │    │
//! │  │ TTL cache      │  │ Optimistic     │  │ Merge, totals,         │    │
//! │  │ Op flags/errors│  │ splice and     │  │ persisted snapshot,    │    │
//! │  │ Selection      │  │ rollback       │  │ timed notification     │    │
//! │  └───────┬────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │          │                   │                       │                  │
//! │          ▼                   ▼                       ▼                  │
//! │  RemoteResourceClient   ReorderClient        PersistenceAdapter        │
//! │                                                                         │
//! │  OBSERVATION:                                                          │
//! │  • subscribe(callback) -> Subscription   (sync UI bindings)            │
//! │  • watch() -> watch::Receiver            (async consumers)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! ### Caching
//! - [`store`] - Generic [`ResourceStore`] with per-operation flags and errors
//! - [`cache`] - Cache entry, staleness and the injectable clock
//! - [`resource`] - `Resource` / `Orderable` contracts for the menu types
//! - [`subject`] - Observable value behind every store
//!
//! ### Optimistic Mutations
//! - [`reorder`] - Drag-and-drop reordering with rollback
//! - [`favorites`] - Bookmark toggling with provisional entries
//!
//! ### Cart
//! - [`cart`] - Cart engine: persistence and notification timer
//! - [`persistence`] - Memory and file persistence adapters
//!
//! ### Plumbing
//! - [`client`] - Remote client traits (implemented by the REST layer)
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Store error types
//! - [`registry`] - [`MenuStores`] wiring root
//! - [`telemetry`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use menu_store::{ClientConfig, FilePersistence, MenuClients, MenuStores};
//!
//! menu_store::telemetry::init_tracing(menu_store::telemetry::DEFAULT_DIRECTIVES);
//!
//! let config = ClientConfig::load_or_default(None);
//! let persistence = Arc::new(FilePersistence::new(data_dir));
//! let stores = MenuStores::new(clients, persistence, &config).await;
//!
//! let dishes = stores.dishes.load_all(DishFilter::default(), false).await?;
//! stores.dish_order.reorder("starters", 0, 3).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod client;
pub mod resource;
pub mod store;
pub mod subject;

pub mod favorites;
pub mod reorder;

pub mod cart;
pub mod persistence;

pub mod config;
pub mod error;
pub mod registry;
pub mod telemetry;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{CacheEntry, Clock, ManualClock, SystemClock};
pub use cart::{CartAggregationEngine, CartView, LastAdded};
pub use client::{RemoteError, RemoteResourceClient, RemoteResult, ReorderClient};
pub use config::{CacheSettings, CartSettings, ClientConfig};
pub use error::{StoreError, StoreResult};
pub use favorites::FavoriteStore;
pub use persistence::{FilePersistence, MemoryPersistence, PersistenceAdapter};
pub use registry::{MenuClients, MenuStores};
pub use reorder::PositionReorderController;
pub use resource::{Orderable, Resource, ResourceKind};
pub use store::{Operation, OperationErrors, OperationFlags, ResourceStore, StoreState};
pub use subject::{Subject, Subscription};
