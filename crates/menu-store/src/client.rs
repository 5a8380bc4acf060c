//! # Remote Clients
//!
//! The narrow interfaces through which stores reach the REST API.
//!
//! The HTTP wrappers themselves live outside this crate. Each one returns a
//! tagged [`RemoteResult`] and never panics, so every failure a store sees
//! arrives as a [`RemoteError`] value.

use async_trait::async_trait;
use menu_core::PositionUpdate;
use thiserror::Error;

use crate::resource::{Orderable, Resource};

/// Error detail carried by a failed remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Request could not reach the server.
    #[error("Network error: {0}")]
    Network(String),

    /// Server returned a non-success status.
    #[error("Server returned {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Response body did not decode into the expected type.
    #[error("Could not decode response: {0}")]
    Decode(String),
}

/// Tagged result of a remote call.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// CRUD access to one resource collection.
#[async_trait]
pub trait RemoteResourceClient<R: Resource>: Send + Sync {
    async fn list(&self, filter: &R::Filter) -> RemoteResult<Vec<R>>;

    async fn get(&self, id: &str) -> RemoteResult<R>;

    async fn create(&self, draft: &R::Draft) -> RemoteResult<R>;

    async fn update(&self, id: &str, patch: &R::Patch) -> RemoteResult<R>;

    async fn delete(&self, id: &str) -> RemoteResult<()>;
}

/// Bulk position updates for orderable resources.
#[async_trait]
pub trait ReorderClient<R: Orderable>: Send + Sync {
    async fn reorder_bulk(&self, positions: &[PositionUpdate]) -> RemoteResult<()>;
}
