//! Job storage trait and errors.

use std::future::Future;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;

use super::{File, Job};

/// Errors returned by a [`JobStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    /// A transaction closure rejected the mutation.
    #[error("{0}")]
    Aborted(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wrap a caller error so it can abort a transaction.
    pub fn aborted(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Aborted(Box::new(err))
    }
}

/// Read-modify-write step applied by [`JobStore::transact`].
///
/// Receives the current job and returns its replacement; returning an error
/// leaves the stored job untouched.
pub type JobMutation<'a> =
    Box<dyn FnOnce(Job) -> BoxFuture<'a, Result<Job, StoreError>> + Send + 'a>;

/// Read-modify-write step applied by [`JobStore::update_file`].
pub type FileMutation = Box<dyn FnOnce(File) -> File + Send>;

/// Build a [`JobMutation`] from an async closure.
pub fn job_mutation<'a, F, Fut>(f: F) -> JobMutation<'a>
where
    F: FnOnce(Job) -> Fut + Send + 'a,
    Fut: Future<Output = Result<Job, StoreError>> + Send + 'a,
{
    Box::new(move |job| f(job).boxed())
}

/// Build a [`FileMutation`] from a closure.
pub fn file_mutation<F>(f: F) -> FileMutation
where
    F: FnOnce(File) -> File + Send + 'static,
{
    Box::new(f)
}

/// Trait for job storage backends.
///
/// Writes to one job (`transact`, `update_file`) are mutually exclusive;
/// reads never observe a partially applied write.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a new job in the processing state.
    async fn create_job(&self) -> Job;

    /// Get a job by ID.
    async fn get_job(&self, id: &str) -> Option<Job>;

    /// List all jobs, oldest first.
    async fn list_jobs(&self) -> Vec<Job>;

    /// Append fresh file records for `urls` without validation.
    async fn append_files(&self, job_id: &str, urls: &[String]) -> Option<Job>;

    /// Atomically replace a job with the result of `mutation`.
    async fn transact<'a>(&'a self, job_id: &str, mutation: JobMutation<'a>)
        -> Result<Job, StoreError>;

    /// Atomically update one file inside its owning job.
    async fn update_file(&self, file: &File, mutation: FileMutation) -> Result<File, StoreError>;
}
