//! Archive operator implementation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, Mutex, Notify};
use tracing::{debug, info, warn};

use crate::archive::ArchiveWriter;
use crate::config::ArchiveConfig;
use crate::fetcher::Fetcher;
use crate::job::{file_mutation, job_mutation, File, Job, JobStatus, JobStore, StoreError};
use crate::metrics;

use super::config::OperatorConfig;
use super::types::{ActiveJobSummary, OperatorError, OperatorStatus, PackItem};
use super::writer::{fail_file, ActiveJob, ActiveJobs, JobWriter, NOT_ACCEPTING};

/// Queue depth between a job's downloads and its writer.
const PACK_QUEUE_SIZE: usize = 16;

/// The archive operator - admits jobs, takes in URLs and routes downloads to
/// each job's writer.
pub struct ArchiveOperator {
    config: OperatorConfig,
    archive: ArchiveConfig,
    store: Arc<dyn JobStore>,
    fetcher: Arc<dyn Fetcher>,
    writer: Arc<dyn ArchiveWriter>,
    active_jobs: ActiveJobs,
}

impl ArchiveOperator {
    /// Create a new operator.
    pub fn new(
        config: OperatorConfig,
        archive: ArchiveConfig,
        store: Arc<dyn JobStore>,
        fetcher: Arc<dyn Fetcher>,
        writer: Arc<dyn ArchiveWriter>,
    ) -> Self {
        Self {
            config,
            archive,
            store,
            fetcher,
            writer,
            active_jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Admit a new job and start its writer.
    ///
    /// Fails without side effects when `max_jobs_processing` jobs are active.
    pub async fn create_job(&self) -> Result<Job, OperatorError> {
        let mut active = self.active_jobs.lock().await;
        if active.len() >= self.config.max_jobs_processing {
            metrics::JOBS_REJECTED.inc();
            return Err(OperatorError::MaxJobsProcessing(
                self.config.max_jobs_processing,
            ));
        }

        let job = self.store.create_job().await;
        let (sender, rx) = mpsc::channel(PACK_QUEUE_SIZE);

        let activity = Arc::new(Notify::new());
        let writer = JobWriter {
            job_id: job.id.clone(),
            rx,
            container: self.archive.container_path(&job.id),
            max_files: self.config.max_files_per_job,
            stall_timeout: self.config.stall_timeout(),
            activity: Arc::clone(&activity),
            store: Arc::clone(&self.store),
            writer: Arc::clone(&self.writer),
            active_jobs: Arc::clone(&self.active_jobs),
        };
        let task = tokio::spawn(writer.run());

        active.insert(
            job.id.clone(),
            ActiveJob {
                sender,
                task,
                activity,
                admitted_at: Utc::now(),
            },
        );

        metrics::JOBS_CREATED.inc();
        info!(job_id = %job.id, active = active.len(), "Job admitted");
        Ok(job)
    }

    /// Get a job by ID.
    pub async fn get_job(&self, job_id: &str) -> Result<Job, OperatorError> {
        self.store
            .get_job(job_id)
            .await
            .ok_or_else(|| OperatorError::JobNotFound(job_id.to_string()))
    }

    /// List all jobs, oldest first.
    pub async fn list_jobs(&self) -> Vec<Job> {
        self.store.list_jobs().await
    }

    /// Attach a batch of URLs to a job.
    ///
    /// The whole batch runs as one transaction on the job. Per-URL failures
    /// are recorded on the new files; only a full job or a missing/expired
    /// job fails the call.
    pub async fn attach_urls(&self, job_id: &str, urls: Vec<String>) -> Result<Job, OperatorError> {
        let job = self
            .store
            .transact(
                job_id,
                job_mutation(move |job| self.attach_batch(job, urls)),
            )
            .await
            .map_err(OperatorError::from_store)?;

        if let Some(active) = self.active_jobs.lock().await.get(job_id) {
            active.activity.notify_one();
        }
        Ok(job)
    }

    async fn attach_batch(&self, mut job: Job, urls: Vec<String>) -> Result<Job, StoreError> {
        let max = self.config.max_files_per_job;

        if job.status == JobStatus::Expired {
            return Err(StoreError::aborted(OperatorError::JobExpired(job.id)));
        }
        if job.valid_count() >= max {
            return Err(StoreError::aborted(OperatorError::MaxFilesPerJob(max)));
        }

        let mut validations: FuturesUnordered<_> = urls
            .into_iter()
            .map(|url| {
                let file = File::new(job.id.clone(), url);
                async move {
                    let result = self.fetcher.validate(&file.url).await;
                    (file, result)
                }
            })
            .collect();

        // Files land in the job in validation completion order.
        while let Some((mut file, result)) = validations.next().await {
            match result {
                Err(e) => {
                    debug!(job_id = %job.id, url = %file.url, "URL rejected: {}", e);
                    metrics::FILES_ATTACHED.with_label_values(&["rejected"]).inc();
                    file.error = e.to_string();
                }
                Ok(()) if job.valid_count() < max => {
                    debug!(job_id = %job.id, url = %file.url, "URL accepted");
                    metrics::FILES_ATTACHED.with_label_values(&["accepted"]).inc();
                    self.spawn_download(file.clone());
                }
                Ok(()) => {
                    debug!(job_id = %job.id, url = %file.url, "URL over file limit");
                    metrics::FILES_ATTACHED.with_label_values(&["over_limit"]).inc();
                    file.error = OperatorError::MaxFilesPerJob(max).to_string();
                }
            }
            job.files.push(file);
        }

        if job.valid_count() == max && job.url.is_none() {
            job.url = Some(self.archive.download_path(&job.id));
        }

        Ok(job)
    }

    /// Download a validated file in the background and hand it to its job's writer.
    fn spawn_download(&self, file: File) {
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let active_jobs = Arc::clone(&self.active_jobs);

        tokio::spawn(async move {
            let download = match fetcher.download(&file.url).await {
                Ok(download) => download,
                Err(e) => {
                    warn!(job_id = %file.job_id, url = %file.url, "Download failed: {}", e);
                    metrics::DOWNLOADS.with_label_values(&["failed"]).inc();
                    fail_file(store.as_ref(), &file, e.to_string()).await;
                    return;
                }
            };
            metrics::DOWNLOADS.with_label_values(&["success"]).inc();

            let sender = active_jobs
                .lock()
                .await
                .get(&file.job_id)
                .map(|active| active.sender.clone());
            let Some(sender) = sender else {
                warn!(job_id = %file.job_id, file_id = %file.id, "Download finished after job retired");
                fail_file(store.as_ref(), &file, NOT_ACCEPTING.to_string()).await;
                return;
            };

            if let Err(e) = store
                .update_file(
                    &file,
                    file_mutation(|mut f| {
                        f.downloaded = true;
                        f
                    }),
                )
                .await
            {
                warn!(job_id = %file.job_id, file_id = %file.id, "Failed to mark file downloaded: {}", e);
                return;
            }

            let item = PackItem {
                file: file.clone(),
                bytes: download.bytes,
                entry_name: download.entry_name,
            };
            if sender.send(item).await.is_err() {
                warn!(job_id = %file.job_id, file_id = %file.id, "Writer closed before file was queued");
                fail_file(store.as_ref(), &file, NOT_ACCEPTING.to_string()).await;
            }
        });
    }

    /// Get current operator status.
    pub async fn status(&self) -> OperatorStatus {
        let active = self.active_jobs.lock().await;
        let mut jobs: Vec<_> = active
            .iter()
            .map(|(job_id, job)| ActiveJobSummary {
                job_id: job_id.clone(),
                admitted_at: job.admitted_at,
            })
            .collect();
        jobs.sort_by_key(|job| job.admitted_at);

        OperatorStatus {
            active_jobs: active.len(),
            max_jobs_processing: self.config.max_jobs_processing,
            max_files_per_job: self.config.max_files_per_job,
            jobs,
        }
    }

    /// Stop every writer, letting appends already queued finish.
    pub async fn shutdown(&self) {
        let drained: Vec<_> = self.active_jobs.lock().await.drain().collect();
        if drained.is_empty() {
            return;
        }

        info!("Stopping {} archive writers", drained.len());
        for (job_id, active) in drained {
            drop(active.sender);
            if let Err(e) = active.task.await {
                warn!(job_id = %job_id, "Archive writer ended abnormally: {}", e);
            }
        }
    }
}
