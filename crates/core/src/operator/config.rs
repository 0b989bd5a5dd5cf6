//! Operator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the archive operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Maximum number of jobs processing at the same time.
    #[serde(default = "default_max_jobs")]
    pub max_jobs_processing: usize,

    /// Number of files that completes a job.
    #[serde(default = "default_max_files")]
    pub max_files_per_job: usize,

    /// Retire a job whose writer has been idle this long (seconds).
    /// Unset means jobs wait for their files indefinitely.
    #[serde(default)]
    pub stall_timeout_secs: Option<u64>,
}

fn default_max_jobs() -> usize {
    3
}

fn default_max_files() -> usize {
    3
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            max_jobs_processing: default_max_jobs(),
            max_files_per_job: default_max_files(),
            stall_timeout_secs: None,
        }
    }
}

impl OperatorConfig {
    pub fn stall_timeout(&self) -> Option<Duration> {
        self.stall_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OperatorConfig::default();
        assert_eq!(config.max_jobs_processing, 3);
        assert_eq!(config.max_files_per_job, 3);
        assert!(config.stall_timeout().is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            max_files_per_job = 10
            stall_timeout_secs = 120
        "#;
        let config: OperatorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_jobs_processing, 3);
        assert_eq!(config.max_files_per_job, 10);
        assert_eq!(config.stall_timeout(), Some(Duration::from_secs(120)));
    }
}
