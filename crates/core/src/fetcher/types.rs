//! Fetcher trait and types.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while talking to a remote resource.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("failed to send request to remote resource: {0}")]
    Request(String),

    /// The remote answered with a non-success status.
    #[error("remote resource responded with status code {0}")]
    Status(u16),

    /// The remote did not declare a content type.
    #[error("cannot determine the file type of the remote resource")]
    ContentTypeMissing,

    /// The declared content type is not allowed.
    #[error("unsupported file type on remote resource: {}", .0.join(", "))]
    ContentTypeUnsupported(Vec<String>),
}

impl FetchError {
    /// Whether the remote could not be reached or answered with an error.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status(_))
    }
}

/// A fully downloaded remote file.
#[derive(Debug, Clone)]
pub struct Download {
    /// Response body.
    pub bytes: Vec<u8>,
    /// Basename of the final resolved URL, used as the archive entry name.
    pub entry_name: String,
}

/// Validates and downloads remote files.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Check that `url` answers with an allowed content type, without
    /// downloading the body.
    async fn validate(&self, url: &str) -> Result<(), FetchError>;

    /// Download the body of `url`.
    async fn download(&self, url: &str) -> Result<Download, FetchError>;
}

/// Derive an archive entry name from the last path segment of a URL.
///
/// Falls back to `file` when the path has no usable basename.
pub fn entry_name_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .map(|name| name.replace(['/', '\\'], "_"))
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| "file".to_string())
}
