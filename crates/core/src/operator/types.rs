//! Types for the archive operator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::{File, StoreError};

/// Errors surfaced synchronously by the operator.
#[derive(Debug, Error)]
pub enum OperatorError {
    /// Admission control rejected a new job.
    #[error("too many jobs are being processed at once (limit {0})")]
    MaxJobsProcessing(usize),

    /// The job already holds its full quota of files.
    #[error("file limit per job exceeded (limit {0})")]
    MaxFilesPerJob(usize),

    /// Job not found.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// The job was retired before completing.
    #[error("job {0} has expired and no longer accepts files")]
    JobExpired(String),

    /// Job store error.
    #[error("job store error: {0}")]
    Store(#[from] StoreError),
}

impl OperatorError {
    /// Recover the operator error carried through an aborted store transaction.
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::JobNotFound(id) => Self::JobNotFound(id),
            StoreError::Aborted(inner) => match inner.downcast::<OperatorError>() {
                Ok(op) => *op,
                Err(other) => Self::Store(StoreError::Aborted(other)),
            },
            other => Self::Store(other),
        }
    }
}

/// A downloaded file waiting to be packed by its job's writer.
#[derive(Debug)]
pub(crate) struct PackItem {
    pub file: File,
    pub bytes: Vec<u8>,
    pub entry_name: String,
}

/// Current status of the operator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorStatus {
    /// Jobs currently holding a writer task.
    pub active_jobs: usize,
    /// Admission limit.
    pub max_jobs_processing: usize,
    /// Files that complete a job.
    pub max_files_per_job: usize,
    /// Jobs holding a writer, oldest admission first.
    pub jobs: Vec<ActiveJobSummary>,
}

/// A job currently holding a writer task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveJobSummary {
    pub job_id: String,
    pub admitted_at: DateTime<Utc>,
}
