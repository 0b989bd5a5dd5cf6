//! Error types for the archive module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing a container.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Failed to open or inspect the existing container.
    #[error("Failed to open archive {path}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create the staging file for the rewrite.
    #[error("Failed to create staging file in {dir}")]
    StagingFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The existing container is not a readable zip or an entry could not be copied.
    #[error("Zip error in {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Failed to replace the container with the rewritten one.
    #[error("Failed to replace archive {path}")]
    CommitFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub(crate) fn zip(path: &std::path::Path, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.to_path_buf(),
            source,
        }
    }
}
