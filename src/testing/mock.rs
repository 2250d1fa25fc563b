//! Session store with injectable failures

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::session::{MemoryStore, SessionStore, StoreError, StoredRecord};

#[derive(Default)]
struct Faults {
    next_store: AtomicBool,
    next_store_existing: AtomicBool,
    next_retrieve: AtomicBool,
}

/// In-memory [`SessionStore`] whose next call can be made to fail
///
/// Each armed fault fires once and then disarms. Clones share records and
/// faults, so a test can keep a handle after giving the store away.
#[derive(Clone, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    faults: Arc<Faults>,
}

impl FaultyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `store` call, whatever the key
    pub fn fail_next_store(&self) {
        self.faults.next_store.store(true, Ordering::SeqCst);
    }

    /// Fail the next `store` call that overwrites an existing record
    ///
    /// Creating a new record still succeeds, which lets a session be created
    /// and the follow-up save fail.
    pub fn fail_next_store_existing(&self) {
        self.faults.next_store_existing.store(true, Ordering::SeqCst);
    }

    /// Fail the next `retrieve` call
    pub fn fail_next_retrieve(&self) {
        self.faults.next_retrieve.store(true, Ordering::SeqCst);
    }

    /// Underlying records
    #[must_use]
    pub fn records(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl SessionStore for FaultyStore {
    async fn store(
        &self,
        key: &str,
        value: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.faults.next_store.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected store failure".to_string()));
        }
        if self.inner.contains_key(key)
            && self.faults.next_store_existing.swap(false, Ordering::SeqCst)
        {
            return Err(StoreError::WriteRejected {
                key: key.to_string(),
                reason: "injected overwrite failure".to_string(),
            });
        }
        self.inner.store(key, value, expires_at).await
    }

    async fn retrieve(&self, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        if self.faults.next_retrieve.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected retrieve failure".to_string()));
        }
        self.inner.retrieve(key).await
    }
}
