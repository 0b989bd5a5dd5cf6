use std::sync::Arc;
use fetchzip_core::{ArchiveOperator, Config};

/// Shared application state
pub struct AppState {
    config: Config,
    operator: Arc<ArchiveOperator>,
}

impl AppState {
    pub fn new(config: Config, operator: Arc<ArchiveOperator>) -> Self {
        Self { config, operator }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn operator(&self) -> &ArchiveOperator {
        self.operator.as_ref()
    }
}
