//! HTTP fetcher on top of reqwest.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use tracing::debug;

use crate::metrics;

use super::types::entry_name_from_url;
use super::{Download, FetchError, Fetcher, FetcherConfig};

/// Fetcher issuing HEAD requests for validation and GET requests for download.
pub struct HttpFetcher {
    client: Client,
    config: FetcherConfig,
}

impl HttpFetcher {
    /// Create a new HttpFetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| FetchError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Reject non-success responses and disallowed content types.
    fn check_response(&self, response: &Response) -> Result<(), FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let declared: Vec<String> = response
            .headers()
            .get_all(CONTENT_TYPE)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();

        if declared.is_empty() {
            return Err(FetchError::ContentTypeMissing);
        }

        if !self.config.accepts(declared.iter().map(String::as_str)) {
            return Err(FetchError::ContentTypeUnsupported(declared));
        }

        Ok(())
    }

    async fn fetch_body(&self, url: &str) -> Result<Download, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        self.check_response(&response)?;

        // Redirects are already followed, so this is the final location.
        let entry_name = entry_name_from_url(response.url());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Request(format!("failed to read body: {}", e)))?;

        Ok(Download {
            bytes: bytes.to_vec(),
            entry_name,
        })
    }

    fn record(operation: &str, started: Instant, succeeded: bool) {
        let status = if succeeded { "success" } else { "error" };
        metrics::REMOTE_REQUESTS
            .with_label_values(&[operation, status])
            .inc();
        metrics::REMOTE_REQUEST_DURATION
            .with_label_values(&[operation])
            .observe(started.elapsed().as_secs_f64());
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn validate(&self, url: &str) -> Result<(), FetchError> {
        let started = Instant::now();
        debug!(url = url, "Validating remote resource");

        let result = match self.client.head(url).send().await {
            Ok(response) => self.check_response(&response),
            Err(e) => Err(FetchError::Request(e.to_string())),
        };

        Self::record("validate", started, result.is_ok());
        result
    }

    async fn download(&self, url: &str) -> Result<Download, FetchError> {
        let started = Instant::now();
        debug!(url = url, "Downloading remote resource");

        let result = self.fetch_body(url).await;
        Self::record("download", started, result.is_ok());
        result
    }
}
