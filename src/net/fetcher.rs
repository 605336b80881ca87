// Allow dead code: error variants for non-HTTP fetcher implementations
#![allow(dead_code)]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use thiserror::Error;

/// HTTP request timeout in seconds.
/// Long enough for slow asset servers, short enough to fail usably.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("no response available for {0}")]
    Unavailable(String),
}

/// A response captured at fetch time: status, content type, body bytes.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Issues a request and returns the captured response.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, method: Method, url: &str) -> Result<FetchedAsset, FetchError>;
}

/// reqwest-backed fetcher.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, method: Method, url: &str) -> Result<FetchedAsset, FetchError> {
        let response = self.client.request(method, url).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();
        Ok(FetchedAsset {
            status,
            content_type,
            body,
        })
    }
}
