use crate::core::{CacheEntry, KeyValueStore};
use crate::utils::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_PREFIX: &str = "cache:";

/// 建立在 KeyValueStore 上的 TTL 快取
///
/// 過期項目只在下一次讀取時清除，沒有背景清理。`get_or_fetch` 不保證互斥，
/// 同一個 key 可能同時觸發兩次 fetch。
#[derive(Debug, Clone)]
pub struct TtlCache<S: KeyValueStore> {
    store: S,
    prefix: String,
    default_ttl: Duration,
}

impl<S: KeyValueStore> TtlCache<S> {
    pub fn new(store: S, default_ttl: Duration) -> Self {
        Self {
            store,
            prefix: DEFAULT_PREFIX.to_string(),
            default_ttl,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX / 2);
        let entry = CacheEntry::new(value, now_ms(), ttl_ms);

        let raw = serde_json::to_string(&entry)?;
        self.store.set(&self.storage_key(key), &raw).await?;
        tracing::debug!("Cached '{}' for {:?}", key, ttl);
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let storage_key = self.storage_key(key);
        let Some(raw) = self.store.get(&storage_key).await? else {
            return Ok(None);
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Dropping unreadable cache entry '{}': {}", key, e);
                self.store.remove(&storage_key).await?;
                return Ok(None);
            }
        };

        if entry.is_fresh(now_ms()) {
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Cache entry '{}' expired", key);
            self.store.remove(&storage_key).await?;
            Ok(None)
        }
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(&self.storage_key(key)).await
    }

    /// 只清除帶有本快取前綴的 key
    pub async fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for key in self.store.keys().await? {
            if key.starts_with(&self.prefix) {
                self.store.remove(&key).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, ttl: Option<Duration>, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(cached) = self.get(key).await? {
            tracing::trace!("Cache hit for '{}'", key);
            return Ok(cached);
        }

        let value = fetch().await?;
        self.set(key, &value, ttl).await?;
        Ok(value)
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
