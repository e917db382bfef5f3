use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{CacheKey, FetchResponse};
use tokio::sync::RwLock;

/// Named buckets of request → response snapshots.
///
/// Writes are upserts by key; the last writer wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Creates the bucket if it does not exist yet.
    async fn open(&self, bucket: &str) -> Result<()>;
    async fn match_entry(&self, bucket: &str, key: &CacheKey) -> Result<Option<FetchResponse>>;
    async fn put(&self, bucket: &str, key: &CacheKey, response: &FetchResponse) -> Result<()>;
    /// Writes every entry or none of them.
    async fn put_all(&self, bucket: &str, entries: &[(CacheKey, FetchResponse)]) -> Result<()>;
    async fn delete(&self, bucket: &str, key: &CacheKey) -> Result<bool>;
    async fn keys(&self, bucket: &str) -> Result<Vec<CacheKey>>;
    async fn bucket_names(&self) -> Result<Vec<String>>;
    async fn delete_bucket(&self, bucket: &str) -> Result<bool>;
}

#[derive(Default)]
pub struct MemoryCacheStorage {
    buckets: RwLock<BTreeMap<String, HashMap<CacheKey, FetchResponse>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, bucket: &str) -> Result<()> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn match_entry(&self, bucket: &str, key: &CacheKey) -> Result<Option<FetchResponse>> {
        Ok(self
            .buckets
            .read()
            .await
            .get(bucket)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(&self, bucket: &str, key: &CacheKey, response: &FetchResponse) -> Result<()> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default()
            .insert(key.clone(), response.clone());
        Ok(())
    }

    async fn put_all(&self, bucket: &str, entries: &[(CacheKey, FetchResponse)]) -> Result<()> {
        let mut buckets = self.buckets.write().await;
        let target = buckets.entry(bucket.to_string()).or_default();
        for (key, response) in entries {
            target.insert(key.clone(), response.clone());
        }
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &CacheKey) -> Result<bool> {
        Ok(self
            .buckets
            .write()
            .await
            .get_mut(bucket)
            .is_some_and(|entries| entries.remove(key).is_some()))
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<CacheKey>> {
        let buckets = self.buckets.read().await;
        let mut keys: Vec<CacheKey> = buckets
            .get(bucket)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    async fn bucket_names(&self) -> Result<Vec<String>> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool> {
        Ok(self.buckets.write().await.remove(bucket).is_some())
    }
}
