//! # Persistence Adapters
//!
//! Scoped key-value storage the cart engine writes its snapshot to.
//!
//! - [`MemoryPersistence`] - in-process map, lost on exit
//! - [`FilePersistence`] - one JSON file per key in a directory
//!
//! Only the cart engine writes through an adapter, and only under its own
//! storage key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::subject::lock;

/// Durable byte storage keyed by name.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Returns `None` if nothing is stored under `key`.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

// =============================================================================
// Memory
// =============================================================================

/// In-process storage. Keys are prefixed with the scope so several
/// adapters can share one process without colliding.
#[derive(Debug)]
pub struct MemoryPersistence {
    scope: String,
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryPersistence {
    pub fn new(scope: impl Into<String>) -> Self {
        MemoryPersistence {
            scope: scope.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.scope, key)
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryPersistence {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(lock(&self.entries).get(&self.scoped(key)).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        lock(&self.entries).insert(self.scoped(key), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        lock(&self.entries).remove(&self.scoped(key));
        Ok(())
    }
}

// =============================================================================
// File
// =============================================================================

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FilePersistence { dir: dir.into() }
    }

    /// Platform data directory for the menu client.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.menu.menu-client/`
    /// - **Windows**: `%APPDATA%\menu\menu-client\data\`
    /// - **Linux**: `~/.local/share/menu-client/`
    pub fn default_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "menu", "menu-client")
            .map(|dirs| dirs.data_dir().to_path_buf())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::Persistence(format!(
                "invalid storage key: {key:?}"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl PersistenceAdapter for FilePersistence {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write to a sibling file first so a crash never leaves half a snapshot.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &value).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(?path, bytes = value.len(), "Snapshot written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("menu-persist-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_memory_roundtrip() {
        let store = MemoryPersistence::new("session-a");
        assert_eq!(store.get("cart").await.unwrap(), None);

        store.set("cart", b"{}".to_vec()).await.unwrap();
        assert_eq!(store.get("cart").await.unwrap(), Some(b"{}".to_vec()));

        store.remove("cart").await.unwrap();
        store.remove("cart").await.unwrap();
        assert_eq!(store.get("cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_scopes_are_isolated() {
        let a = MemoryPersistence::new("a");
        a.set("cart", vec![1]).await.unwrap();
        assert_eq!(a.scoped("cart"), "a:cart");

        let b = MemoryPersistence::new("b");
        assert_eq!(b.get("cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_roundtrip() {
        let dir = temp_dir();
        let store = FilePersistence::new(&dir);

        assert_eq!(store.get("shopping-cart").await.unwrap(), None);

        store.set("shopping-cart", b"[1,2]".to_vec()).await.unwrap();
        assert!(dir.join("shopping-cart.json").exists());
        assert!(!dir.join("shopping-cart.json.tmp").exists());
        assert_eq!(
            store.get("shopping-cart").await.unwrap(),
            Some(b"[1,2]".to_vec())
        );

        store.set("shopping-cart", b"[3]".to_vec()).await.unwrap();
        assert_eq!(store.get("shopping-cart").await.unwrap(), Some(b"[3]".to_vec()));

        store.remove("shopping-cart").await.unwrap();
        store.remove("shopping-cart").await.unwrap();
        assert_eq!(store.get("shopping-cart").await.unwrap(), None);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_file_rejects_path_like_keys() {
        let store = FilePersistence::new(temp_dir());
        for key in ["", "../escape", "a/b", ".hidden"] {
            let err = store.set(key, vec![]).await.unwrap_err();
            assert!(matches!(err, StoreError::Persistence(_)), "key {key:?}");
        }
    }
}
