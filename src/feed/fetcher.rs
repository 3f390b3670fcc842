use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use thiserror::Error;

use crate::recipe::{FetchParams, FetchRecipe};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while retrieving a feed payload.
///
/// Any of these is fatal to the pipeline run that triggered the fetch: the
/// run aborts and no partial catalog is published. No retry happens here —
/// retry policy, if any, belongs to the transport client.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,
    /// Response body exceeded the configured size limit
    #[error("response too large")]
    ResponseTooLarge,
}

/// The network boundary behind [`FeedFetcher`].
///
/// The pipeline only ever sees success (raw payload bytes) or a
/// [`FetchError`]; everything about connections, TLS, and proxies lives
/// behind this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Default [`Transport`]: reqwest with a per-request timeout and a bounded
/// streaming body read.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_TIMEOUT, DEFAULT_MAX_FEED_SIZE)
    }

    pub fn with_limits(timeout: Duration, max_bytes: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
            max_bytes,
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, self.max_bytes).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

/// Executes one data-retrieval recipe: resolves the URL template and hands
/// the request to the transport. Pure I/O boundary — no parsing knowledge.
#[derive(Clone)]
pub struct FeedFetcher {
    transport: Arc<dyn Transport>,
}

impl FeedFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Convenience constructor for the default HTTP transport.
    pub fn over_http(timeout: Duration, max_bytes: usize) -> Self {
        Self::new(Arc::new(HttpTransport::with_limits(timeout, max_bytes)))
    }

    /// Retrieve the raw feed payload for `recipe`.
    ///
    /// # Errors
    ///
    /// Returns the transport's [`FetchError`] unchanged. The orchestrator
    /// treats any fetch error as fatal to the current run.
    pub async fn fetch(
        &self,
        recipe: &FetchRecipe,
        params: &FetchParams,
    ) -> Result<Vec<u8>, FetchError> {
        let url = recipe.resolve_url(params);
        tracing::debug!(recipe = %recipe.name, url = %url, "fetching feed");

        match self.transport.get(&url).await {
            Ok(bytes) => {
                tracing::debug!(recipe = %recipe.name, bytes = bytes.len(), "feed download complete");
                Ok(bytes)
            }
            Err(e) => {
                tracing::warn!(recipe = %recipe.name, url = %url, error = %e, "feed fetch failed");
                Err(e)
            }
        }
    }
}
