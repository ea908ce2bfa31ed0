//! Per-visitor key/value storage.
//!
//! The cart, the verified identity and the in-progress checkout are all kept
//! in the visitor's session. [`ClientStorage`] is the seam between the
//! services and the session so they can be exercised without HTTP.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tower_sessions::Session;

/// Errors from reading or writing visitor storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// A stored value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The backing store refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable key/value storage scoped to a single visitor.
///
/// Values are stored as JSON. Writes overwrite the whole value under a key.
pub trait ClientStorage: Send + Sync {
    /// Read and deserialize the value under `key`.
    fn get_item<T>(&self, key: &str) -> impl Future<Output = Result<Option<T>, StorageError>> + Send
    where
        T: DeserializeOwned + Send;

    /// Serialize and store `value` under `key`.
    fn set_item<T>(
        &self,
        key: &str,
        value: &T,
    ) -> impl Future<Output = Result<(), StorageError>> + Send
    where
        T: Serialize + Sync;

    /// Remove `key` entirely.
    fn remove_item(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl ClientStorage for Session {
    async fn get_item<T>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        T: DeserializeOwned + Send,
    {
        Ok(self.get::<T>(key).await?)
    }

    async fn set_item<T>(&self, key: &str, value: &T) -> Result<(), StorageError>
    where
        T: Serialize + Sync,
    {
        Ok(self.insert(key, value).await?)
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.remove::<serde_json::Value>(key).await?;
        Ok(())
    }
}

/// In-memory storage for tests and tooling.
///
/// Clones share the same map, like two handles to one session.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, serde_json::Value>,
    fail_writes: bool,
    fail_key: Option<String>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write (and remove) fail.
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_writes = fail;
        }
    }

    /// Make writes to `key` alone fail.
    pub fn fail_writes_to(&self, key: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_key = Some(key.to_string());
        }
    }

    /// Raw JSON stored under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<serde_json::Value> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.values.get(key).cloned())
    }

    /// Store raw JSON under `key`, bypassing serialization.
    pub fn put_raw(&self, key: &str, value: serde_json::Value) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.values.insert(key.to_string(), value);
        }
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut MemoryInner) -> R) -> Result<R, StorageError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage poisoned".to_string()))?;
        Ok(f(&mut inner))
    }
}

impl ClientStorage for MemoryStorage {
    async fn get_item<T>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        T: DeserializeOwned + Send,
    {
        let value = self.with_inner(|inner| inner.values.get(key).cloned())?;
        value
            .map(serde_json::from_value)
            .transpose()
            .map_err(StorageError::from)
    }

    async fn set_item<T>(&self, key: &str, value: &T) -> Result<(), StorageError>
    where
        T: Serialize + Sync,
    {
        let json = serde_json::to_value(value)?;
        self.with_inner(|inner| {
            if inner.fail_writes || inner.fail_key.as_deref() == Some(key) {
                return Err(StorageError::Unavailable("quota exceeded".to_string()));
            }
            inner.values.insert(key.to_string(), json);
            Ok(())
        })?
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.with_inner(|inner| {
            if inner.fail_writes {
                return Err(StorageError::Unavailable("quota exceeded".to_string()));
            }
            inner.values.remove(key);
            Ok(())
        })?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        storage.set_item("token", &"abc").await.unwrap();

        let value: Option<String> = storage.get_item("token").await.unwrap();
        assert_eq!(value.as_deref(), Some("abc"));

        storage.remove_item("token").await.unwrap();
        let value: Option<String> = storage.get_item("token").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.set_item("k", &1_u32).await.unwrap();
        assert_eq!(b.get_item::<u32>("k").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let storage = MemoryStorage::new();
        storage.fail_writes(true);
        assert!(matches!(
            storage.set_item("k", &1_u32).await,
            Err(StorageError::Unavailable(_))
        ));
        assert!(storage.raw("k").is_none());
    }

    #[tokio::test]
    async fn test_type_mismatch_is_serde_error() {
        let storage = MemoryStorage::new();
        storage.put_raw("k", serde_json::json!({"not": "a number"}));
        assert!(matches!(
            storage.get_item::<u32>("k").await,
            Err(StorageError::Serde(_))
        ));
    }
}
