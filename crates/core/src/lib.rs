pub mod archive;
pub mod config;
pub mod fetcher;
pub mod job;
pub mod metrics;
pub mod operator;
pub mod testing;

pub use archive::{ArchiveError, ArchiveWriter, ZipArchiveWriter};
pub use config::{
    load_config, load_config_from_str, validate_config, ArchiveConfig, Config, ConfigError,
    ServerConfig,
};
pub use fetcher::{Download, FetchError, Fetcher, FetcherConfig, HttpFetcher};
pub use job::{File, InMemoryJobStore, Job, JobStatus, JobStore, StoreError};
pub use operator::{
    ActiveJobSummary, ArchiveOperator, OperatorConfig, OperatorError, OperatorStatus,
};
