use shared::error::FetchError;
use thiserror::Error;

/// Failure of an install or activate step. The previously active version stays in control.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("manifest population for {cache_name} failed: {source}")]
    ManifestPopulation {
        cache_name: String,
        source: FetchError,
    },
    #[error("cache storage failed while {action} {cache_name}: {source}")]
    Storage {
        cache_name: String,
        action: &'static str,
        source: anyhow::Error,
    },
}
