use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{FetchRequest, FetchResponse},
    error::FetchError,
};

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let response = self
            .http
            .request(request.method.clone(), request.url.clone())
            .send()
            .await
            .map_err(|err| FetchError::network(request.url.as_str(), err.to_string()))?;

        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::network(request.url.as_str(), err.to_string()))?;

        Ok(FetchResponse {
            url,
            status,
            headers,
            body,
        })
    }
}

/// Fails every request, for resolving against the cache alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        Err(FetchError::Offline {
            url: request.url.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "tests/fetcher_tests.rs"]
mod tests;
