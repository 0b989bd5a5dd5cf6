//! Job operator: admission control, URL intake and per-job archive writers.
//!
//! - **Admission**: at most `max_jobs_processing` jobs hold a writer at once
//! - **Intake**: URLs are validated concurrently inside one job transaction
//! - **Packing**: one writer task per job serializes every container append

mod config;
mod runner;
mod types;
mod writer;

pub use config::OperatorConfig;
pub use runner::ArchiveOperator;
pub use types::{ActiveJobSummary, OperatorError, OperatorStatus};
