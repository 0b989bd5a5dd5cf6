use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::fetcher::FetcherConfig;
use crate::operator::OperatorConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub operator: OperatorConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Where finished archives live and how clients reach them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    /// Directory holding `<job id>.zip` containers.
    #[serde(default = "default_archive_dir")]
    pub dir: PathBuf,
    /// URL path under which `dir` is served (e.g. "/static/archives").
    #[serde(default = "default_public_path")]
    pub public_path: String,
    /// Directory for in-progress container rewrites.
    /// Must be on the same filesystem as `dir`; defaults to `dir` itself.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            dir: default_archive_dir(),
            public_path: default_public_path(),
            staging_dir: None,
        }
    }
}

impl ArchiveConfig {
    /// Filesystem path of the container for a job.
    pub fn container_path(&self, job_id: &str) -> PathBuf {
        self.dir.join(format!("{}.zip", job_id))
    }

    /// Public URL path of the container for a job.
    pub fn download_path(&self, job_id: &str) -> String {
        format!("{}/{}.zip", self.public_path.trim_end_matches('/'), job_id)
    }
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("static/archives")
}

fn default_public_path() -> String {
    "/static/archives".to_string()
}
