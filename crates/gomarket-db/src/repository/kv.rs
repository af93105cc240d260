//! # Key-Value Repository
//!
//! Durable string payloads keyed by string, stored in the `kv_store` table.
//!
//! ## Write Semantics
//! `set` is a single UPSERT statement, so a payload is either fully replaced
//! or left as it was. There is no partial write for a reader to observe.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::store::KeyValueStore;

/// Repository for key-value operations.
#[derive(Debug, Clone)]
pub struct KeyValueRepository {
    pool: SqlitePool,
}

impl KeyValueRepository {
    /// Creates a new KeyValueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        KeyValueRepository { pool }
    }

    /// Lists every stored key, sorted.
    pub async fn keys(&self) -> DbResult<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(keys)
    }
}

#[async_trait]
impl KeyValueStore for KeyValueRepository {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        debug!(key = %key, found = value.is_some(), "kv get");

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(key = %key, bytes = value.len(), "kv set");

        Ok(())
    }

    async fn remove(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> KeyValueRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.key_values()
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let repo = repo().await;

        assert_eq!(repo.get("@GoMarketplace:cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let repo = repo().await;

        repo.set("@GoMarketplace:cart", "[]").await.unwrap();

        assert_eq!(
            repo.get("@GoMarketplace:cart").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let repo = repo().await;

        repo.set("k", "first").await.unwrap();
        repo.set("k", "second").await.unwrap();

        assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("second"));
        assert_eq!(repo.keys().await.unwrap(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let repo = repo().await;

        repo.set("b", "2").await.unwrap();
        repo.set("a", "1").await.unwrap();

        assert_eq!(repo.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(repo.get("b").await.unwrap().as_deref(), Some("2"));
        assert_eq!(repo.keys().await.unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_remove() {
        let repo = repo().await;
        repo.set("k", "v").await.unwrap();

        assert!(repo.remove("k").await.unwrap());
        assert!(!repo.remove("k").await.unwrap());
        assert_eq!(repo.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_closed_pool_is_retryable_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.key_values();
        db.close().await;

        let err = repo.set("k", "v").await.unwrap_err();

        assert!(err.is_retryable());
    }
}
