//! Fetcher configuration.

use serde::{Deserialize, Serialize};

/// Configuration for remote fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Content types accepted for download (exact, case-sensitive match).
    #[serde(default = "default_supported_types")]
    pub supported_types: Vec<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_supported_types() -> Vec<String> {
    vec!["image/jpeg".to_string(), "application/pdf".to_string()]
}

fn default_timeout() -> u32 {
    30
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            supported_types: default_supported_types(),
            timeout_secs: default_timeout(),
        }
    }
}

impl FetcherConfig {
    /// Whether any of the reported content types is allowed.
    pub fn accepts<'a>(&self, content_types: impl IntoIterator<Item = &'a str>) -> bool {
        content_types
            .into_iter()
            .any(|ct| self.supported_types.iter().any(|allowed| allowed == ct))
    }
}
