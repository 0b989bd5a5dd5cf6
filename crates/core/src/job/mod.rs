//! Job and file records, and the store that owns them.

mod memory_store;
mod store;
mod types;

pub use memory_store::InMemoryJobStore;
pub use store::{file_mutation, job_mutation, FileMutation, JobMutation, JobStore, StoreError};
pub use types::{File, Job, JobStatus};
