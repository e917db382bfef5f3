use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use shared::{
    domain::{FetchRequest, FetchResponse},
    error::FetchError,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    config::DispatcherConfig, dispatcher::Dispatcher, error::LifecycleError, fetcher::Fetcher,
    store::CacheStorage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

/// Holds the active dispatcher version and the clients it controls.
pub struct Registration {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    active: RwLock<Option<Arc<Dispatcher>>>,
    clients: RwLock<BTreeMap<ClientId, Option<String>>>,
    next_client_id: AtomicU64,
}

impl Registration {
    pub fn new(storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            storage,
            fetcher,
            active: RwLock::new(None),
            clients: RwLock::new(BTreeMap::new()),
            next_client_id: AtomicU64::new(1),
        }
    }

    /// Installs, activates and claims clients for a new version.
    ///
    /// The new version takes over as soon as install succeeds; if install fails the
    /// previous version keeps control and its bucket is left untouched.
    pub async fn register(
        &self,
        config: DispatcherConfig,
    ) -> Result<Arc<Dispatcher>, LifecycleError> {
        let dispatcher = Arc::new(Dispatcher::new(
            config,
            Arc::clone(&self.storage),
            Arc::clone(&self.fetcher),
        ));

        if let Err(err) = dispatcher.on_install().await {
            let previous = self
                .active
                .read()
                .await
                .as_ref()
                .map(|active| active.cache_name().to_string());
            warn!(
                bucket = %dispatcher.cache_name(),
                previous = previous.as_deref().unwrap_or("none"),
                "cache: install failed; keeping previous version"
            );
            return Err(err);
        }

        let purged = dispatcher.on_activate().await?;
        *self.active.write().await = Some(Arc::clone(&dispatcher));
        let claimed = self.claim_clients(dispatcher.cache_name()).await;
        info!(
            bucket = %dispatcher.cache_name(),
            purged = purged.len(),
            claimed,
            "cache: version activated"
        );
        Ok(dispatcher)
    }

    pub async fn active(&self) -> Option<Arc<Dispatcher>> {
        self.active.read().await.clone()
    }

    /// Pages opened after activation start out controlled by the active version.
    pub async fn connect_client(&self) -> ClientId {
        let id = ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed));
        let controller = self
            .active
            .read()
            .await
            .as_ref()
            .map(|active| active.cache_name().to_string());
        self.clients.write().await.insert(id, controller);
        id
    }

    pub async fn disconnect_client(&self, id: ClientId) -> bool {
        self.clients.write().await.remove(&id).is_some()
    }

    pub async fn controller(&self, id: ClientId) -> Option<String> {
        self.clients.read().await.get(&id).cloned().flatten()
    }

    async fn claim_clients(&self, cache_name: &str) -> usize {
        let mut clients = self.clients.write().await;
        for controller in clients.values_mut() {
            *controller = Some(cache_name.to_string());
        }
        clients.len()
    }

    /// Resolves through the active version, or straight from the network before any
    /// version has activated.
    pub async fn respond(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        match self.active().await {
            Some(dispatcher) => dispatcher.respond(request).await,
            None => self.fetcher.fetch(request).await,
        }
    }
}
