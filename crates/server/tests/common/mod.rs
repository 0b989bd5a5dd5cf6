//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process with
//! a mock fetcher and a real zip writer over a temporary archive directory.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use fetchzip_core::{
    testing::{MockFetcher, MockResource},
    ArchiveConfig, ArchiveOperator, Config, InMemoryJobStore, OperatorConfig, ServerConfig,
    ZipArchiveWriter,
};
use fetchzip_server::state::AppState;

/// Host header sent with every fixture request.
pub const TEST_HOST: &str = "fetchzip.test";

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_create_archive() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/archives", json!({})).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock fetcher - configure remote resources
    pub fetcher: Arc<MockFetcher>,
    /// Operator behind the router
    pub operator: Arc<ArchiveOperator>,
    /// Temporary directory holding the archives
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub max_jobs_processing: usize,
    pub max_files_per_job: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            max_jobs_processing: 3,
            max_files_per_job: 3,
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default limits.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom limits.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            operator: OperatorConfig {
                max_jobs_processing: test_config.max_jobs_processing,
                max_files_per_job: test_config.max_files_per_job,
                stall_timeout_secs: None,
            },
            archive: ArchiveConfig {
                dir: temp_dir.path().join("archives"),
                ..Default::default()
            },
            ..Default::default()
        };

        let fetcher = Arc::new(MockFetcher::new());
        let operator = Arc::new(ArchiveOperator::new(
            config.operator.clone(),
            config.archive.clone(),
            Arc::new(InMemoryJobStore::new()),
            fetcher.clone(),
            Arc::new(ZipArchiveWriter::new()),
        ));

        let state = Arc::new(AppState::new(config, Arc::clone(&operator)));
        let router = fetchzip_server::api::create_router(state);

        Self {
            router,
            fetcher,
            operator,
            temp_dir,
        }
    }

    /// Register a downloadable resource and return its URL.
    pub async fn add_file(&self, name: &str, bytes: &[u8]) -> String {
        let url = format!("http://remote.test/{}", name);
        self.fetcher
            .add_resource(url.clone(), MockResource::ok(name, bytes.to_vec()))
            .await;
        url
    }

    /// Poll a job until its status matches or give up after a few seconds.
    pub async fn wait_for_status(&self, job_id: &str, status: &str) -> Value {
        let path = format!("/api/archives/{}", job_id);
        for _ in 0..250 {
            let response = self.get(&path).await;
            if response.body["status"] == status {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("job {} never reached status {}", job_id, status);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a GET request and return the raw body.
    pub async fn get_bytes(&self, path: &str) -> (StatusCode, Bytes) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .header("Host", TEST_HOST)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, bytes)
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Host", TEST_HOST)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder()
            .method(method)
            .uri(path)
            .header("Host", TEST_HOST);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
