//! Remote resource validation and download.

mod config;
mod http;
mod types;

pub use config::FetcherConfig;
pub use http::HttpFetcher;
pub use types::{entry_name_from_url, Download, FetchError, Fetcher};
