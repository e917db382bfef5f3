use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use carousel::{
    Carousel, CarouselEvent, CarouselOptions, CarouselRuntime, LazyImage, Slide, SlideChange,
    TracingView,
};
use offline_cache::{
    CacheStorage, Dispatcher, Fetcher, HttpFetcher, OfflineFetcher, Registration,
};
use shared::domain::{Destination, FetchRequest, FetchResponse};
use site::{load_catalog, CertificateRenderer};
use storage::{BucketSummary, Storage};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use url::Url;

use crate::config::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheReport {
    pub bucket: String,
    pub entries: usize,
    pub buckets: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub navigate: bool,
    pub destination: Option<Destination>,
    pub offline: bool,
}

async fn open_storage(settings: &Settings) -> Result<Arc<Storage>> {
    let storage = Storage::new(&settings.database_url)
        .await
        .with_context(|| format!("failed to open cache store '{}'", settings.database_url))?;
    Ok(Arc::new(storage))
}

/// Installs and activates the site's precache manifest.
pub async fn precache(settings: &Settings) -> Result<PrecacheReport> {
    let scope = settings
        .origin_url()?
        .ok_or_else(|| anyhow!("no origin configured; pass --origin or set FOLIO_ORIGIN"))?;
    let config = settings.dispatcher_config(scope)?;
    let storage = open_storage(settings).await?;

    let registration = Registration::new(storage.clone(), Arc::new(HttpFetcher::new()));
    let active = registration.register(config).await?;
    let bucket = active.cache_name().to_string();
    let entries = storage.keys(&bucket).await?.len();
    let buckets = storage.bucket_names().await?;
    info!(%bucket, entries, "folio: precache complete");

    Ok(PrecacheReport {
        bucket,
        entries,
        buckets,
    })
}

/// Resolves one request through the dispatcher, as the page would.
pub async fn fetch(
    settings: &Settings,
    url: &str,
    options: &FetchOptions,
) -> Result<FetchResponse> {
    let url = Url::parse(url).with_context(|| format!("invalid url '{url}'"))?;
    let scope = match settings.origin_url()? {
        Some(scope) => scope,
        None => url.join("/").context("url has no origin")?,
    };
    let config = settings.dispatcher_config(scope)?;
    let storage = open_storage(settings).await?;
    let fetcher: Arc<dyn Fetcher> = if options.offline {
        Arc::new(OfflineFetcher)
    } else {
        Arc::new(HttpFetcher::new())
    };

    let mut request = if options.navigate {
        FetchRequest::navigate(url)
    } else {
        FetchRequest::get(url)
    };
    if let Some(destination) = options.destination {
        request = request.with_destination(destination);
    }

    let dispatcher = Dispatcher::new(config, storage, fetcher);
    let response = dispatcher.respond(&request).await?;
    dispatcher.drain_revalidations().await;
    Ok(response)
}

pub async fn buckets(settings: &Settings) -> Result<Vec<BucketSummary>> {
    let storage = open_storage(settings).await?;
    storage.bucket_summaries().await
}

/// Gallery HTML, or `None` when the data file cannot be loaded.
pub fn certificates(path: &Path) -> Option<String> {
    let catalog = load_catalog(path)?;
    Some(CertificateRenderer::default().render_section(&catalog))
}

/// Runs an autoplaying carousel until `ticks` slide changes have been seen.
pub async fn carousel_demo(
    slides: usize,
    ticks: usize,
    interval: Duration,
) -> Result<Vec<SlideChange>> {
    let slides = (0..slides)
        .map(|index| {
            Slide::new(format!("demo-{index}"))
                .with_image(LazyImage::deferred(format!("img/demo-{index}.webp")))
        })
        .collect();
    let options = CarouselOptions {
        auto_play_interval: interval,
        ..CarouselOptions::default()
    };
    let carousel = Carousel::new(slides, options, Box::new(TracingView::new("demo")));
    let total = carousel.total_slides();
    let handle = CarouselRuntime::spawn(carousel);
    let mut events = handle.subscribe();

    let mut changes = Vec::with_capacity(ticks);
    if total > 1 {
        while changes.len() < ticks {
            match events.recv().await {
                Ok(CarouselEvent::SlideChanged(change)) => changes.push(change),
                Ok(CarouselEvent::Destroyed) | Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "folio: carousel demo missed events");
                }
            }
        }
    }

    handle.destroy().await?;
    Ok(changes)
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
