//! Archive job API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use fetchzip_core::{Job, OperatorError};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for attaching files to an archive job
#[derive(Debug, Deserialize)]
pub struct AddFilesBody {
    pub urls: Vec<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ArchiveErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ArchiveErrorResponse>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ArchiveErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<OperatorError> for ArchiveErrorResponse {
    fn from(e: OperatorError) -> Self {
        Self {
            error: e.to_string(),
        }
    }
}

fn operator_error(e: OperatorError) -> ApiError {
    let status = match &e {
        OperatorError::MaxJobsProcessing(_) => StatusCode::CONFLICT,
        OperatorError::JobExpired(_) => StatusCode::CONFLICT,
        OperatorError::JobNotFound(_) => StatusCode::NOT_FOUND,
        OperatorError::MaxFilesPerJob(_) => StatusCode::BAD_REQUEST,
        OperatorError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ArchiveErrorResponse::from(e)))
}

/// Turn a job's download path into an absolute URL for the requesting client.
fn with_public_url(mut job: Job, headers: &HeaderMap) -> Job {
    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
    if let (Some(path), Some(host)) = (job.url.as_deref(), host) {
        job.url = Some(format!("http://{}{}", host, path));
    }
    job
}

// ============================================================================
// Handlers
// ============================================================================

/// Admit a new archive job
pub async fn create_archive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    let job = state.operator().create_job().await.map_err(operator_error)?;
    Ok((StatusCode::CREATED, Json(with_public_url(job, &headers))))
}

/// List all archive jobs
pub async fn list_archives(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<Vec<Job>> {
    let jobs = state
        .operator()
        .list_jobs()
        .await
        .into_iter()
        .map(|job| with_public_url(job, &headers))
        .collect();
    Json(jobs)
}

/// Get an archive job by ID
pub async fn get_archive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Job>, ApiError> {
    let job = state.operator().get_job(&id).await.map_err(operator_error)?;
    Ok(Json(with_public_url(job, &headers)))
}

/// Attach a batch of URLs to an archive job
pub async fn add_files(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<AddFilesBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    let Json(body) = body.map_err(|e| {
        debug!(job_id = %id, "Rejected files body: {}", e);
        error_response(StatusCode::UNPROCESSABLE_ENTITY, "invalid JSON body")
    })?;

    if body.urls.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "urls list is empty"));
    }

    let job = state
        .operator()
        .attach_urls(&id, body.urls)
        .await
        .map_err(operator_error)?;
    Ok((StatusCode::CREATED, Json(with_public_url(job, &headers))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_public_url_uses_host_header() {
        let mut job = Job::new();
        job.url = Some("/static/archives/abc.zip".to_string());

        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("example.com:8080"));

        let job = with_public_url(job, &headers);
        assert_eq!(
            job.url.as_deref(),
            Some("http://example.com:8080/static/archives/abc.zip")
        );
    }

    #[test]
    fn test_public_url_without_host_or_path() {
        let job = with_public_url(Job::new(), &HeaderMap::new());
        assert!(job.url.is_none());

        let mut job = Job::new();
        job.url = Some("/static/archives/abc.zip".to_string());
        let job = with_public_url(job, &HeaderMap::new());
        assert_eq!(job.url.as_deref(), Some("/static/archives/abc.zip"));
    }

    #[test]
    fn test_operator_error_status_codes() {
        let cases = [
            (OperatorError::MaxJobsProcessing(3), StatusCode::CONFLICT),
            (OperatorError::JobExpired("a".into()), StatusCode::CONFLICT),
            (OperatorError::JobNotFound("a".into()), StatusCode::NOT_FOUND),
            (OperatorError::MaxFilesPerJob(3), StatusCode::BAD_REQUEST),
        ];
        for (err, expected) in cases {
            let (status, _) = operator_error(err);
            assert_eq!(status, expected);
        }
    }
}
