//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetcher::{Download, FetchError, Fetcher};

/// Scripted behaviour for one URL.
#[derive(Debug, Clone)]
pub struct MockResource {
    /// Result returned by `validate`.
    pub validation: Result<(), FetchError>,
    /// Result returned by `download`.
    pub download: Result<Download, FetchError>,
    /// How long `validate` takes before answering.
    pub validate_delay: Duration,
}

impl MockResource {
    /// A resource that validates and downloads successfully.
    pub fn ok(entry_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            validation: Ok(()),
            download: Ok(Download {
                bytes: bytes.into(),
                entry_name: entry_name.into(),
            }),
            validate_delay: Duration::ZERO,
        }
    }

    /// A resource rejected during validation.
    pub fn invalid(error: FetchError) -> Self {
        Self {
            validation: Err(error.clone()),
            download: Err(error),
            validate_delay: Duration::ZERO,
        }
    }

    /// A resource that validates but cannot be downloaded.
    pub fn download_fails(error: FetchError) -> Self {
        Self {
            validation: Ok(()),
            download: Err(error),
            validate_delay: Duration::ZERO,
        }
    }

    /// Delay the validation answer.
    pub fn with_validate_delay(mut self, delay: Duration) -> Self {
        self.validate_delay = delay;
        self
    }
}

/// Mock implementation of the Fetcher trait.
///
/// URLs without a registered resource fail as unreachable.
#[derive(Debug)]
pub struct MockFetcher {
    resources: Arc<RwLock<HashMap<String, MockResource>>>,
    validate_calls: Arc<RwLock<Vec<String>>>,
    download_calls: Arc<RwLock<Vec<String>>>,
    download_delay: Arc<RwLock<Duration>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a mock fetcher with no resources.
    pub fn new() -> Self {
        Self {
            resources: Arc::new(RwLock::new(HashMap::new())),
            validate_calls: Arc::new(RwLock::new(Vec::new())),
            download_calls: Arc::new(RwLock::new(Vec::new())),
            download_delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Register the behaviour for `url`.
    pub async fn add_resource(&self, url: impl Into<String>, resource: MockResource) {
        self.resources.write().await.insert(url.into(), resource);
    }

    /// Delay every download by `delay`.
    pub async fn set_download_delay(&self, delay: Duration) {
        *self.download_delay.write().await = delay;
    }

    /// URLs passed to `validate`, in call order.
    pub async fn validate_calls(&self) -> Vec<String> {
        self.validate_calls.read().await.clone()
    }

    /// URLs passed to `download`, in call order.
    pub async fn download_calls(&self) -> Vec<String> {
        self.download_calls.read().await.clone()
    }

    async fn resource(&self, url: &str) -> Result<MockResource, FetchError> {
        self.resources
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Request(format!("no route to {}", url)))
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn validate(&self, url: &str) -> Result<(), FetchError> {
        self.validate_calls.write().await.push(url.to_string());
        let resource = self.resource(url).await?;
        if !resource.validate_delay.is_zero() {
            tokio::time::sleep(resource.validate_delay).await;
        }
        resource.validation
    }

    async fn download(&self, url: &str) -> Result<Download, FetchError> {
        self.download_calls.write().await.push(url.to_string());
        let delay = *self.download_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.resource(url).await?.download
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_resources() {
        let fetcher = MockFetcher::new();
        fetcher
            .add_resource("http://a/ok.jpg", MockResource::ok("ok.jpg", b"data".to_vec()))
            .await;
        fetcher
            .add_resource(
                "http://a/page",
                MockResource::invalid(FetchError::ContentTypeUnsupported(vec![
                    "text/html".to_string(),
                ])),
            )
            .await;

        assert!(fetcher.validate("http://a/ok.jpg").await.is_ok());
        let download = fetcher.download("http://a/ok.jpg").await.unwrap();
        assert_eq!(download.entry_name, "ok.jpg");
        assert_eq!(download.bytes, b"data");

        assert!(matches!(
            fetcher.validate("http://a/page").await,
            Err(FetchError::ContentTypeUnsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_url_is_unreachable() {
        let fetcher = MockFetcher::new();
        let err = fetcher.validate("http://nowhere/x").await.unwrap_err();
        assert!(err.is_unreachable());
        assert_eq!(fetcher.validate_calls().await, vec!["http://nowhere/x"]);
        assert!(fetcher.download_calls().await.is_empty());
    }
}
