use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tokio::sync::RwLock;

/// Raw dataset text cached after a successful load.
pub const CACHED_CSV_KEY: &str = "cached_csv_content";
/// JSON array of user-authored foods.
pub const CUSTOM_FOODS_KEY: &str = "customFoods";

/// Key of the diary log for one calendar day.
pub fn food_entries_key(date: time::Date) -> String {
    format!("foodEntries_{}", date)
}

/// String-keyed byte store. Values are opaque to the store.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>>;
    async fn set(&self, key: &str, value: Bytes) -> anyhow::Result<()>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

pub async fn get_string(store: &dyn KvStore, key: &str) -> anyhow::Result<Option<String>> {
    match store.get(key).await? {
        Some(raw) => {
            let text = String::from_utf8(raw.to_vec())
                .with_context(|| format!("value of `{}` is not utf-8", key))?;
            Ok(Some(text))
        }
        None => Ok(None),
    }
}

pub async fn set_string(store: &dyn KvStore, key: &str, value: &str) -> anyhow::Result<()> {
    store.set(key, Bytes::copy_from_slice(value.as_bytes())).await
}

pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> anyhow::Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => {
            let value = serde_json::from_slice(&raw)
                .with_context(|| format!("decode json for `{}`", key))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub async fn put_json<T: Serialize + ?Sized>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    let body = serde_json::to_vec(value).with_context(|| format!("encode json for `{}`", key))?;
    store.set(key, Bytes::from(body)).await
}

/// SQLite-backed store, one row per key.
#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        let row = sqlx::query_as::<_, (Vec<u8>,)>(
            r#"
            SELECT value
            FROM kv_entries
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("kv get {}", key))?;
        Ok(row.map(|(value,)| Bytes::from(value)))
    }

    async fn set(&self, key: &str, value: Bytes) -> anyhow::Result<()> {
        let updated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("format updated_at")?;
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE
               SET value = excluded.value,
                   updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value.to_vec())
        .bind(updated_at)
        .execute(&self.db)
        .await
        .with_context(|| format!("kv set {}", key))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?1")
            .bind(key)
            .execute(&self.db)
            .await
            .with_context(|| format!("kv remove {}", key))?;
        Ok(())
    }
}

/// Process-local store used by tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Bytes) -> anyhow::Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
