//! # Key-Value Store Contract
//!
//! The only thing the cart store needs from persistence: read a string by
//! key, and durably overwrite the string under a key.
//!
//! ## Backends
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       KeyValueStore Backends                            │
//! │                                                                         │
//! │  KeyValueRepository (repository/kv.rs)   MemoryStore (this file)       │
//! │  ───────────────────────────────────     ─────────────────────────     │
//! │  • SQLite kv_store table                 • HashMap behind RwLock        │
//! │  • Survives restarts                     • Lost on drop                 │
//! │  • Production                            • Tests, demo sessions         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use tokio::sync::RwLock;

use crate::error::DbResult;

/// Async key-value persistence.
///
/// Implementations must be safe to share across tasks; the cart store holds
/// one as `Arc<dyn KeyValueStore>`.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Returns the payload stored under `key`, or `None` if nothing is stored.
    async fn get(&self, key: &str) -> DbResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> DbResult<()>;

    /// Deletes `key`. Returns whether something was removed.
    async fn remove(&self, key: &str) -> DbResult<bool>;
}

/// In-memory backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with one entry.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        MemoryStore {
            entries: RwLock::new(entries),
        }
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Checks if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> DbResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_memory_store_get_set() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_store_with_entry() {
        let store = MemoryStore::with_entry("@GoMarketplace:cart", "[]");

        assert_eq!(
            store.get("@GoMarketplace:cart").await.unwrap().as_deref(),
            Some("[]")
        );
        assert!(store.remove("@GoMarketplace:cart").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_usable_as_trait_object() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        store.set("k", "v").await.unwrap();

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
