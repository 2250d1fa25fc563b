//! Session persistence
//!
//! A [`SessionStore`] keeps opaque serialized session records keyed by session
//! id, together with the record's expiry. It knows nothing about the record's
//! contents. [`MemoryStore`] is the in-process implementation used by the
//! service binary and by tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Failure of the storage backend itself
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
    #[error("session store rejected write for key {key}: {reason}")]
    WriteRejected { key: String, reason: String },
}

/// A stored record and its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub value: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

/// Key/value persistence for serialized sessions
///
/// Implementations must tolerate concurrent calls for unrelated keys.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create or overwrite the record stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot persist the record
    async fn store(
        &self,
        key: &str,
        value: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Fetch the record stored under `key`, `None` if there is none
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read
    async fn retrieve(&self, key: &str) -> Result<Option<StoredRecord>, StoreError>;
}

/// Thread-safe in-memory [`SessionStore`]
///
/// Records are never evicted on their own; call [`MemoryStore::evict_expired`]
/// to drop records past their expiry.
#[derive(Clone, Default)]
pub struct MemoryStore {
    items: Arc<RwLock<HashMap<String, StoredRecord>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, expired ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().map_or(0, |items| items.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a record exists under `key`
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.items
            .read()
            .is_ok_and(|items| items.contains_key(key))
    }

    /// Drop every record whose expiry is at or before `now`
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned
    pub fn evict_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let before = items.len();
        items.retain(|_, record| record.expires_at > now);
        let removed = before - items.len();
        if removed > 0 {
            log::debug!("Evicted {removed} expired session record(s)");
        }
        Ok(removed)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn store(
        &self,
        key: &str,
        value: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        items.insert(key.to_string(), StoredRecord { value, expires_at });
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(items.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let store = MemoryStore::new();
        let expires_at = Utc::now() + Duration::minutes(5);
        store.store("k1", b"v1".to_vec(), expires_at).await.unwrap();

        let record = store.retrieve("k1").await.unwrap().unwrap();
        assert_eq!(record.value, b"v1");
        assert_eq!(record.expires_at, expires_at);
        assert!(store.retrieve("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_is_idempotent() {
        let store = MemoryStore::new();
        let expires_at = Utc::now() + Duration::minutes(5);
        store.store("k1", b"v1".to_vec(), expires_at).await.unwrap();
        store.store("k1", b"v1".to_vec(), expires_at).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.retrieve("k1").await.unwrap().unwrap().value, b"v1");
    }

    #[tokio::test]
    async fn test_evict_expired() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.store("old", vec![], now - Duration::seconds(1)).await.unwrap();
        store.store("fresh", vec![], now + Duration::minutes(1)).await.unwrap();

        assert_eq!(store.evict_expired(now).unwrap(), 1);
        assert!(!store.contains_key("old"));
        assert!(store.contains_key("fresh"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_keep_keys_separate() {
        let store = MemoryStore::new();
        let expires_at = Utc::now() + Duration::minutes(5);

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("session-{i}");
                store
                    .store(&key, key.clone().into_bytes(), expires_at)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 32);
        for i in 0..32 {
            let key = format!("session-{i}");
            let record = store.retrieve(&key).await.unwrap().unwrap();
            assert_eq!(record.value, key.into_bytes());
        }
    }
}
