//! In-memory job store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{File, FileMutation, Job, JobMutation, JobStore, StoreError};

/// Job store backed by a process-local map.
///
/// Each job sits behind its own lock, so a slow transaction on one job never
/// blocks reads or writes on another.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, Arc<RwLock<Job>>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, job_id: &str) -> Option<Arc<RwLock<Job>>> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create_job(&self) -> Job {
        let job = Job::new();
        self.jobs
            .write()
            .await
            .insert(job.id.clone(), Arc::new(RwLock::new(job.clone())));
        job
    }

    async fn get_job(&self, id: &str) -> Option<Job> {
        let entry = self.entry(id).await?;
        let job = entry.read().await.clone();
        Some(job)
    }

    async fn list_jobs(&self) -> Vec<Job> {
        let entries: Vec<_> = self.jobs.read().await.values().cloned().collect();
        let mut jobs = Vec::with_capacity(entries.len());
        for entry in entries {
            jobs.push(entry.read().await.clone());
        }
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }

    async fn append_files(&self, job_id: &str, urls: &[String]) -> Option<Job> {
        let entry = self.entry(job_id).await?;
        let mut job = entry.write().await;
        job.files
            .extend(urls.iter().map(|url| File::new(job_id, url.clone())));
        Some(job.clone())
    }

    async fn transact<'a>(
        &'a self,
        job_id: &str,
        mutation: JobMutation<'a>,
    ) -> Result<Job, StoreError> {
        let entry = self
            .entry(job_id)
            .await
            .ok_or_else(|| StoreError::JobNotFound(job_id.to_string()))?;

        let mut job = entry.write().await;
        let updated = mutation(job.clone()).await?;
        *job = updated.clone();
        Ok(updated)
    }

    async fn update_file(&self, file: &File, mutation: FileMutation) -> Result<File, StoreError> {
        let entry = self
            .entry(&file.job_id)
            .await
            .ok_or_else(|| StoreError::JobNotFound(file.job_id.clone()))?;

        let mut job = entry.write().await;
        let slot = job
            .files
            .iter_mut()
            .find(|f| f.id == file.id)
            .ok_or_else(|| StoreError::FileNotFound(file.id.clone()))?;

        *slot = mutation(slot.clone());
        Ok(slot.clone())
    }
}
