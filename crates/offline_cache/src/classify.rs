use http::Method;
use shared::domain::{CacheKey, Destination, FetchRequest, RequestMode};

use crate::config::DispatcherConfig;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "svg"];
const DATA_EXTENSIONS: &[&str] = &["json"];
const STYLE_OR_SCRIPT_EXTENSIONS: &[&str] = &["css", "js"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    NavigationDocument,
    Image,
    DataJson,
    StyleOrScript,
    CrossOriginAsset,
    Unhandled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    CacheFirst,
    /// `fallback` is served from cache when both the network and the exact key miss.
    NetworkFirst { fallback: Option<CacheKey> },
    StaleWhileRevalidate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Left to default network handling; nothing is read from or written to the cache.
    Passthrough,
    Intercept {
        class: ResourceClass,
        strategy: Strategy,
    },
}

impl ResourceClass {
    pub fn strategy(self, config: &DispatcherConfig) -> Option<Strategy> {
        match self {
            Self::CrossOriginAsset | Self::StyleOrScript => Some(Strategy::StaleWhileRevalidate),
            Self::NavigationDocument => Some(Strategy::NetworkFirst {
                fallback: Some(CacheKey::for_url(&config.fallback_document)),
            }),
            Self::Image => Some(Strategy::CacheFirst),
            Self::DataJson => Some(Strategy::NetworkFirst { fallback: None }),
            Self::Unhandled => None,
        }
    }
}

/// First matching rule wins; the order below is significant.
pub fn classify(config: &DispatcherConfig, request: &FetchRequest) -> ResourceClass {
    if request.method != Method::GET {
        return ResourceClass::Unhandled;
    }

    if request
        .url
        .host_str()
        .is_some_and(|host| config.is_cross_origin_asset_host(host))
    {
        return ResourceClass::CrossOriginAsset;
    }

    if request.url.origin() != config.origin() {
        return ResourceClass::Unhandled;
    }

    if request.mode == RequestMode::Navigate || request.destination == Destination::Document {
        return ResourceClass::NavigationDocument;
    }

    let Some(extension) = path_extension(request.url.path()) else {
        return ResourceClass::Unhandled;
    };
    let extension = extension.as_str();
    if IMAGE_EXTENSIONS.contains(&extension) {
        ResourceClass::Image
    } else if DATA_EXTENSIONS.contains(&extension) {
        ResourceClass::DataJson
    } else if STYLE_OR_SCRIPT_EXTENSIONS.contains(&extension) {
        ResourceClass::StyleOrScript
    } else {
        ResourceClass::Unhandled
    }
}

pub(crate) fn route(config: &DispatcherConfig, request: &FetchRequest) -> Route {
    let class = classify(config, request);
    match class.strategy(config) {
        Some(strategy) => Route::Intercept { class, strategy },
        None => Route::Passthrough,
    }
}

fn path_extension(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next()?;
    let (_, extension) = file_name.rsplit_once('.')?;
    (!extension.is_empty()).then(|| extension.to_ascii_lowercase())
}

#[cfg(test)]
#[path = "tests/classify_tests.rs"]
mod tests;
