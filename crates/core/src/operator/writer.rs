//! Per-job archive writer task.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::archive::ArchiveWriter;
use crate::job::{file_mutation, job_mutation, File, JobStatus, JobStore};
use crate::metrics;

use super::types::PackItem;

/// Message recorded on files that reach a job after its writer retired.
pub(crate) const NOT_ACCEPTING: &str = "job is no longer accepting files";

/// Handle to a running writer task.
pub(crate) struct ActiveJob {
    pub sender: mpsc::Sender<PackItem>,
    pub task: JoinHandle<()>,
    /// Signalled whenever URLs are attached, restarting the idle timer.
    pub activity: Arc<Notify>,
    pub admitted_at: DateTime<Utc>,
}

/// Jobs currently holding a writer, keyed by job ID.
pub(crate) type ActiveJobs = Arc<Mutex<HashMap<String, ActiveJob>>>;

enum Next {
    Item(PackItem),
    Closed,
    Stalled,
}

/// Background task that packs downloaded files into one job's container.
///
/// Exactly one exists per admitted job, so appends to a container never race.
pub(crate) struct JobWriter {
    pub job_id: String,
    pub rx: mpsc::Receiver<PackItem>,
    pub container: PathBuf,
    pub max_files: usize,
    pub stall_timeout: Option<Duration>,
    pub activity: Arc<Notify>,
    pub store: Arc<dyn JobStore>,
    pub writer: Arc<dyn ArchiveWriter>,
    pub active_jobs: ActiveJobs,
}

impl JobWriter {
    /// Run the writer until the job completes, stalls, or the channel closes.
    pub async fn run(mut self) {
        debug!(job_id = %self.job_id, "Archive writer started");

        loop {
            match self.next_item().await {
                Next::Item(item) => {
                    self.pack(item).await;
                    if self.is_complete().await {
                        self.finish().await;
                        break;
                    }
                }
                Next::Stalled => {
                    if self.expire().await {
                        break;
                    }
                }
                Next::Closed => {
                    debug!(job_id = %self.job_id, "Archive writer channel closed");
                    break;
                }
            }
        }

        debug!(job_id = %self.job_id, "Archive writer stopped");
    }

    async fn next_item(&mut self) -> Next {
        let Some(limit) = self.stall_timeout else {
            return match self.rx.recv().await {
                Some(item) => Next::Item(item),
                None => Next::Closed,
            };
        };

        loop {
            tokio::select! {
                received = self.rx.recv() => {
                    return match received {
                        Some(item) => Next::Item(item),
                        None => Next::Closed,
                    };
                }
                _ = self.activity.notified() => continue,
                _ = tokio::time::sleep(limit) => return Next::Stalled,
            }
        }
    }

    /// Append one file to the container and record the outcome on it.
    async fn pack(&self, item: PackItem) {
        let PackItem {
            file,
            bytes,
            entry_name,
        } = item;

        let writer = Arc::clone(&self.writer);
        let container = self.container.clone();
        let started = Instant::now();

        let result = tokio::task::spawn_blocking(move || {
            if let Some(parent) = container.parent() {
                std::fs::create_dir_all(parent)?;
            }
            writer.upsert(&container, &entry_name, &bytes)
        })
        .await;

        let outcome = match result {
            Ok(Ok(stored)) => Ok(stored),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(format!("archive writer task failed: {}", e)),
        };

        let label = if outcome.is_ok() { "success" } else { "failed" };
        metrics::PACKS.with_label_values(&[label]).inc();
        metrics::PACK_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        match outcome {
            Ok(stored) => {
                debug!(job_id = %self.job_id, file_id = %file.id, entry = %stored, "File archived");
                let updated = self
                    .store
                    .update_file(
                        &file,
                        file_mutation(|mut f| {
                            f.archived = true;
                            f
                        }),
                    )
                    .await;
                if let Err(e) = updated {
                    error!(job_id = %self.job_id, file_id = %file.id, "Failed to mark file archived: {}", e);
                }
            }
            Err(reason) => {
                warn!(job_id = %self.job_id, file_id = %file.id, "Failed to pack file: {}", reason);
                fail_file(
                    self.store.as_ref(),
                    &file,
                    format!("failed to pack file into archive: {}", reason),
                )
                .await;
            }
        }
    }

    async fn is_complete(&self) -> bool {
        match self.store.get_job(&self.job_id).await {
            Some(job) => job.archived_count() >= self.max_files,
            None => {
                error!(job_id = %self.job_id, "Job vanished from store while packing");
                false
            }
        }
    }

    /// Retire after the last file slot was archived.
    async fn finish(&mut self) {
        self.rx.close();
        self.active_jobs.lock().await.remove(&self.job_id);
        self.set_status(JobStatus::Done).await;
        metrics::JOBS_FINISHED.with_label_values(&["done"]).inc();
        info!(job_id = %self.job_id, "Job done");
    }

    /// Retire after sitting idle past the stall timeout.
    ///
    /// The job only expires when no accepted file is still downloading or
    /// queued. The check and the status change happen in one transaction so
    /// an attach racing the timeout either lands first and keeps the job
    /// alive, or sees it expired. Returns whether the writer retired.
    async fn expire(&mut self) -> bool {
        let result = self
            .store
            .transact(
                &self.job_id,
                job_mutation(|mut job| async move {
                    if job.status == JobStatus::Processing && job.pending_count() == 0 {
                        job.status = JobStatus::Expired;
                    }
                    Ok(job)
                }),
            )
            .await;

        match result {
            Ok(job) if job.status == JobStatus::Expired => {}
            Ok(job) => {
                debug!(
                    job_id = %self.job_id,
                    pending = job.pending_count(),
                    "Stall timeout reached with files in flight"
                );
                return false;
            }
            Err(e) => {
                error!(job_id = %self.job_id, "Failed to expire job: {}", e);
                return false;
            }
        }

        self.active_jobs.lock().await.remove(&self.job_id);
        self.rx.close();
        metrics::JOBS_FINISHED.with_label_values(&["expired"]).inc();
        info!(job_id = %self.job_id, "Job expired after stalling");
        true
    }

    async fn set_status(&self, status: JobStatus) {
        let result = self
            .store
            .transact(
                &self.job_id,
                job_mutation(move |mut job| async move {
                    if job.status == JobStatus::Processing {
                        job.status = status;
                    }
                    Ok(job)
                }),
            )
            .await;

        if let Err(e) = result {
            error!(job_id = %self.job_id, "Failed to set job status to {}: {}", status.as_str(), e);
        }
    }
}

/// Record a terminal failure on a file.
pub(crate) async fn fail_file(store: &dyn JobStore, file: &File, reason: String) {
    let result = store
        .update_file(
            file,
            file_mutation(move |mut f| {
                f.error = reason;
                f
            }),
        )
        .await;

    if let Err(e) = result {
        error!(job_id = %file.job_id, file_id = %file.id, "Failed to record file error: {}", e);
    }
}
