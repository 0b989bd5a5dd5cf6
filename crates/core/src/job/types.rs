//! Job and file record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepting URLs and packing downloaded files.
    Processing,
    /// Every file slot has been archived.
    Done,
    /// Retired after sitting idle past the stall timeout.
    Expired,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Expired => "expired",
        }
    }
}

/// A single URL attached to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: String,
    pub url: String,
    pub downloaded: bool,
    pub archived: bool,
    /// Non-empty once the file failed permanently.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub added_at: DateTime<Utc>,
    #[serde(skip)]
    pub job_id: String,
}

impl File {
    /// Create a fresh file record for `url` owned by `job_id`.
    pub fn new(job_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            downloaded: false,
            archived: false,
            error: String::new(),
            added_at: Utc::now(),
            job_id: job_id.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_empty()
    }

    pub fn is_archived(&self) -> bool {
        self.archived && self.error.is_empty()
    }
}

/// A job collecting files into one archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<File>,
    /// Where the finished archive can be fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: JobStatus::Processing,
            files: Vec::new(),
            url: None,
            created_at: Utc::now(),
        }
    }

    /// Files without a recorded error.
    pub fn valid_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_valid()).count()
    }

    /// Files successfully written into the container.
    pub fn archived_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_archived()).count()
    }

    /// Accepted files still being downloaded or waiting to be packed.
    pub fn pending_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.is_valid() && !f.archived)
            .count()
    }

    pub fn file(&self, file_id: &str) -> Option<&File> {
        self.files.iter().find(|f| f.id == file_id)
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with(error: &str, archived: bool) -> File {
        let mut file = File::new("job", "http://example.com/a.jpg");
        file.error = error.to_string();
        file.archived = archived;
        file
    }

    #[test]
    fn test_counts_skip_errored_files() {
        let mut job = Job::new();
        job.files = vec![
            file_with("", true),
            file_with("", false),
            file_with("boom", false),
            file_with("pack failed", true),
        ];

        assert_eq!(job.valid_count(), 2);
        assert_eq!(job.archived_count(), 1);
        assert_eq!(job.pending_count(), 1);
    }

    #[test]
    fn test_job_serialization_omits_empty_fields() {
        let job = Job::new();
        let json = serde_json::to_value(&job).unwrap();

        assert_eq!(json["status"], "processing");
        assert!(json.get("files").is_none());
        assert!(json.get("url").is_none());
        assert!(json["created_at"].is_string());
    }

    #[test]
    fn test_file_serialization_hides_job_id_and_empty_error() {
        let file = File::new("job-1", "http://example.com/doc.pdf");
        let json = serde_json::to_value(&file).unwrap();

        assert_eq!(json["url"], "http://example.com/doc.pdf");
        assert_eq!(json["downloaded"], false);
        assert_eq!(json["archived"], false);
        assert!(json.get("error").is_none());
        assert!(json.get("job_id").is_none());
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(JobStatus::Processing.as_str(), "processing");
        assert_eq!(JobStatus::Done.as_str(), "done");
        assert_eq!(
            serde_json::to_value(JobStatus::Expired).unwrap(),
            serde_json::json!("expired")
        );
    }
}
