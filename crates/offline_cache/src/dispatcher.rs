use std::sync::Arc;

use futures::future::try_join_all;
use shared::{
    domain::{CacheKey, FetchRequest, FetchResponse},
    error::FetchError,
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    classify::{self, Route, Strategy},
    config::DispatcherConfig,
    error::LifecycleError,
    fetcher::Fetcher,
    store::CacheStorage,
};

pub struct Dispatcher {
    config: Arc<DispatcherConfig>,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    revalidations: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        config: DispatcherConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            fetcher,
            revalidations: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    pub fn route(&self, request: &FetchRequest) -> Route {
        classify::route(&self.config, request)
    }

    /// Errors reach the caller only when the strategy has no cached answer to fall back on.
    pub async fn respond(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let (class, strategy) = match self.route(request) {
            Route::Passthrough => {
                debug!(method = %request.method, url = %request.url, "cache: passthrough");
                return self.fetcher.fetch(request).await;
            }
            Route::Intercept { class, strategy } => (class, strategy),
        };
        // Intercepted requests are always GET, so they always have a key.
        let Some(key) = request.cache_key() else {
            return self.fetcher.fetch(request).await;
        };
        debug!(url = %request.url, ?class, ?strategy, "cache: intercepted");

        match strategy {
            Strategy::CacheFirst => self.cache_first(request, &key).await,
            Strategy::NetworkFirst { fallback } => {
                self.network_first(request, &key, fallback.as_ref()).await
            }
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request, key).await,
        }
    }

    async fn cache_first(
        &self,
        request: &FetchRequest,
        key: &CacheKey,
    ) -> Result<FetchResponse, FetchError> {
        if let Some(cached) = self.lookup(key).await {
            return Ok(cached);
        }
        let response = self.fetcher.fetch(request).await?;
        if response.is_ok() {
            self.store(key, &response).await;
        }
        Ok(response)
    }

    async fn network_first(
        &self,
        request: &FetchRequest,
        key: &CacheKey,
        fallback: Option<&CacheKey>,
    ) -> Result<FetchResponse, FetchError> {
        let outcome = match self.fetcher.fetch(request).await {
            Ok(response) if response.is_ok() => {
                self.store(key, &response).await;
                return Ok(response);
            }
            Ok(response) => {
                debug!(url = %request.url, status = %response.status, "cache: network-first got non-OK status");
                Ok(response)
            }
            Err(err) => {
                debug!(url = %request.url, "cache: network-first fetch failed: {err}");
                Err(err)
            }
        };

        if let Some(cached) = self.lookup(key).await {
            return Ok(cached);
        }
        if let Some(fallback) = fallback {
            if let Some(document) = self.lookup(fallback).await {
                info!(url = %request.url, fallback = %fallback, "cache: serving offline fallback document");
                return Ok(document);
            }
        }
        outcome
    }

    async fn stale_while_revalidate(
        &self,
        request: &FetchRequest,
        key: CacheKey,
    ) -> Result<FetchResponse, FetchError> {
        if let Some(cached) = self.lookup(&key).await {
            self.spawn_revalidation(request.clone(), key).await;
            return Ok(cached);
        }
        let response = self.fetcher.fetch(request).await?;
        if response.is_ok() {
            self.store(&key, &response).await;
        }
        Ok(response)
    }

    async fn spawn_revalidation(&self, request: FetchRequest, key: CacheKey) {
        let storage = Arc::clone(&self.storage);
        let fetcher = Arc::clone(&self.fetcher);
        let bucket = self.config.cache_name.clone();

        // Detached tasks outlive the dispatcher; a superseded version still writes back.
        let task = tokio::spawn(async move {
            match fetcher.fetch(&request).await {
                Ok(response) if response.is_ok() => {
                    if let Err(err) = storage.put(&bucket, &key, &response).await {
                        warn!(bucket = %bucket, key = %key, "cache: revalidation write failed: {err:#}");
                    }
                }
                Ok(response) => {
                    debug!(key = %key, status = %response.status, "cache: revalidation kept stale entry")
                }
                Err(err) => debug!(key = %key, "cache: revalidation fetch failed: {err}"),
            }
        });

        let mut revalidations = self.revalidations.lock().await;
        revalidations.retain(|pending| !pending.is_finished());
        revalidations.push(task);
    }

    pub async fn drain_revalidations(&self) {
        let pending = std::mem::take(&mut *self.revalidations.lock().await);
        for task in pending {
            if let Err(err) = task.await {
                warn!("cache: revalidation task did not complete: {err}");
            }
        }
    }

    async fn lookup(&self, key: &CacheKey) -> Option<FetchResponse> {
        match self.storage.match_entry(&self.config.cache_name, key).await {
            Ok(found) => found,
            Err(err) => {
                warn!(bucket = %self.config.cache_name, key = %key, "cache: lookup failed: {err:#}");
                None
            }
        }
    }

    async fn store(&self, key: &CacheKey, response: &FetchResponse) {
        if let Err(err) = self
            .storage
            .put(&self.config.cache_name, key, response)
            .await
        {
            warn!(bucket = %self.config.cache_name, key = %key, "cache: write failed: {err:#}");
        }
    }

    /// Any failed or non-OK manifest fetch aborts the install before anything is written.
    pub async fn on_install(&self) -> Result<usize, LifecycleError> {
        let cache_name = self.config.cache_name.clone();
        info!(
            bucket = %cache_name,
            assets = self.config.manifest.len(),
            "cache: installing manifest"
        );

        let fetches = self.config.manifest.iter().map(|url| async move {
            let request = FetchRequest::get(url.clone());
            let response = self.fetcher.fetch(&request).await?;
            if !response.is_ok() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: response.status.as_u16(),
                });
            }
            Ok::<_, FetchError>((CacheKey::for_url(url), response))
        });
        let entries = try_join_all(fetches).await.map_err(|source| {
            warn!(bucket = %cache_name, "cache: manifest population failed: {source}");
            LifecycleError::ManifestPopulation {
                cache_name: cache_name.clone(),
                source,
            }
        })?;

        self.storage
            .put_all(&cache_name, &entries)
            .await
            .map_err(|source| LifecycleError::Storage {
                cache_name: cache_name.clone(),
                action: "populating",
                source,
            })?;

        info!(bucket = %cache_name, stored = entries.len(), "cache: manifest installed");
        Ok(entries.len())
    }

    pub async fn on_activate(&self) -> Result<Vec<String>, LifecycleError> {
        let cache_name = &self.config.cache_name;
        let storage_error = |action: &'static str| {
            move |source: anyhow::Error| LifecycleError::Storage {
                cache_name: cache_name.clone(),
                action,
                source,
            }
        };

        self.storage
            .open(cache_name)
            .await
            .map_err(storage_error("opening"))?;
        let stale: Vec<String> = self
            .storage
            .bucket_names()
            .await
            .map_err(storage_error("listing buckets for"))?
            .into_iter()
            .filter(|name| name != cache_name)
            .collect();

        for name in &stale {
            self.storage
                .delete_bucket(name)
                .await
                .map_err(storage_error("purging stale buckets for"))?;
            info!(bucket = %name, current = %cache_name, "cache: purged stale bucket");
        }
        Ok(stale)
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
