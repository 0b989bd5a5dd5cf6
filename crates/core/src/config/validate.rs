use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Job and file limits are positive
/// - At least one content type is allowed
/// - Archive public path is absolute
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.operator.max_jobs_processing == 0 {
        return Err(ConfigError::ValidationError(
            "operator.max_jobs_processing must be at least 1".to_string(),
        ));
    }

    if config.operator.max_files_per_job == 0 {
        return Err(ConfigError::ValidationError(
            "operator.max_files_per_job must be at least 1".to_string(),
        ));
    }

    if config.operator.stall_timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "operator.stall_timeout_secs cannot be 0 (omit it to disable)".to_string(),
        ));
    }

    if config.fetcher.supported_types.is_empty() {
        return Err(ConfigError::ValidationError(
            "fetcher.supported_types cannot be empty".to_string(),
        ));
    }

    if !config.archive.public_path.starts_with('/') {
        return Err(ConfigError::ValidationError(format!(
            "archive.public_path must start with '/': {}",
            config.archive.public_path
        )));
    }

    if config.archive.public_path.trim_end_matches('/').is_empty() {
        return Err(ConfigError::ValidationError(
            "archive.public_path cannot be the root path".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_limits_fail() {
        let mut config = Config::default();
        config.operator.max_jobs_processing = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.operator.max_files_per_job = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.operator.stall_timeout_secs = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_allow_list_fails() {
        let mut config = Config::default();
        config.fetcher.supported_types.clear();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("supported_types"));
    }

    #[test]
    fn test_validate_relative_public_path_fails() {
        let mut config = Config::default();
        config.archive.public_path = "static/archives".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_root_public_path_fails() {
        let mut config = Config::default();
        config.archive.public_path = "/".to_string();
        assert!(validate_config(&config).is_err());
    }
}
