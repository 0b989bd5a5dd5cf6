//! HttpFetcher and end-to-end packing tests against a local HTTP server.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use tempfile::TempDir;

use fetchzip_core::{
    ArchiveConfig, ArchiveOperator, FetchError, Fetcher, FetcherConfig, HttpFetcher,
    InMemoryJobStore, JobStatus, OperatorConfig, ZipArchiveWriter,
};

const JPEG_BYTES: &[u8] = b"\xff\xd8\xff\xe0 not really a jpeg";
const PDF_BYTES: &[u8] = b"%PDF-1.4 fake document";

async fn jpeg() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/jpeg")], JPEG_BYTES)
}

async fn pdf() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/pdf")], PDF_BYTES)
}

async fn html() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html")], "<html></html>")
}

async fn untyped() -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .body(Body::from("mystery"))
        .unwrap()
}

async fn missing() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}

async fn moved() -> Redirect {
    Redirect::temporary("/files/final%20photo.jpg")
}

/// Serve test resources on an ephemeral port.
async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route("/files/photo.jpg", get(jpeg))
        .route("/files/final%20photo.jpg", get(jpeg))
        .route("/files/report.pdf", get(pdf))
        .route("/files/index.html", get(html))
        .route("/files/untyped", get(untyped))
        .route("/files/missing.jpg", get(missing))
        .route("/files/moved", get(moved));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(FetcherConfig {
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_validate_accepts_supported_types() {
    let addr = spawn_server().await;
    let fetcher = fetcher();

    assert!(fetcher
        .validate(&format!("http://{}/files/photo.jpg", addr))
        .await
        .is_ok());
    assert!(fetcher
        .validate(&format!("http://{}/files/report.pdf", addr))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_validate_rejections() {
    let addr = spawn_server().await;
    let fetcher = fetcher();

    let err = fetcher
        .validate(&format!("http://{}/files/index.html", addr))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        FetchError::ContentTypeUnsupported(vec!["text/html".to_string()])
    );

    let err = fetcher
        .validate(&format!("http://{}/files/untyped", addr))
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::ContentTypeMissing);

    let err = fetcher
        .validate(&format!("http://{}/files/missing.jpg", addr))
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::Status(404));
    assert!(err.is_unreachable());
}

#[tokio::test]
async fn test_validate_unreachable_host() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetcher()
        .validate(&format!("http://{}/files/photo.jpg", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Request(_)));
}

#[tokio::test]
async fn test_download_returns_body_and_entry_name() {
    let addr = spawn_server().await;
    let download = fetcher()
        .download(&format!("http://{}/files/report.pdf", addr))
        .await
        .unwrap();

    assert_eq!(download.bytes, PDF_BYTES);
    assert_eq!(download.entry_name, "report.pdf");
}

#[tokio::test]
async fn test_download_names_entry_after_redirect_target() {
    let addr = spawn_server().await;
    let download = fetcher()
        .download(&format!("http://{}/files/moved", addr))
        .await
        .unwrap();

    assert_eq!(download.bytes, JPEG_BYTES);
    assert_eq!(download.entry_name, "final photo.jpg");
}

#[tokio::test]
async fn test_download_rechecks_content_type() {
    let addr = spawn_server().await;
    let err = fetcher()
        .download(&format!("http://{}/files/index.html", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::ContentTypeUnsupported(_)));
}

#[tokio::test]
async fn test_job_produces_zip_with_downloaded_files() {
    let addr = spawn_server().await;
    let temp_dir = TempDir::new().unwrap();
    let archive = ArchiveConfig {
        dir: temp_dir.path().join("archives"),
        ..Default::default()
    };

    let op = ArchiveOperator::new(
        OperatorConfig {
            max_jobs_processing: 1,
            max_files_per_job: 2,
            stall_timeout_secs: None,
        },
        archive.clone(),
        Arc::new(InMemoryJobStore::new()),
        Arc::new(fetcher()),
        Arc::new(ZipArchiveWriter::new()),
    );

    let job = op.create_job().await.unwrap();
    let job = op
        .attach_urls(
            &job.id,
            vec![
                format!("http://{}/files/photo.jpg", addr),
                format!("http://{}/files/index.html", addr),
                format!("http://{}/files/report.pdf", addr),
            ],
        )
        .await
        .unwrap();
    assert_eq!(job.valid_count(), 2);
    assert!(job.url.is_some());

    let mut done = None;
    for _ in 0..250 {
        let current = op.get_job(&job.id).await.unwrap();
        if current.status == JobStatus::Done {
            done = Some(current);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let done = done.expect("job should finish");
    assert_eq!(done.archived_count(), 2);

    let file = std::fs::File::open(archive.container_path(&job.id)).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<String> = zip.file_names().map(String::from).collect();
    names.sort();
    assert_eq!(names, vec!["photo.jpg", "report.pdf"]);

    let mut contents = Vec::new();
    zip.by_name("report.pdf")
        .unwrap()
        .read_to_end(&mut contents)
        .unwrap();
    assert_eq!(contents, PDF_BYTES);
}
