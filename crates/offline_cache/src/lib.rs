//! Service-worker style request interception: classifies outgoing requests,
//! resolves them through a caching strategy and manages versioned cache buckets.

mod classify;
pub mod config;
mod dispatcher;
pub mod error;
mod fetcher;
mod registration;
mod store;

pub use classify::{classify, ResourceClass, Route, Strategy};
pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use error::LifecycleError;
pub use fetcher::{Fetcher, HttpFetcher, OfflineFetcher};
pub use registration::{ClientId, Registration};
pub use store::{CacheStorage, MemoryCacheStorage};
