use crate::config::types::{
    Config, CrawlConfig, FetchConfig, OutputConfig, ResolverConfig, SchedulerConfig,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scheduler_config(&config.scheduler)?;
    validate_crawl_config(&config.crawl)?;
    validate_resolver_config(&config.resolver)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.concurrency < 1 || config.concurrency > 1000 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 1000, got {}",
            config.concurrency
        )));
    }

    Ok(())
}

fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.domain_time_budget_ms == 0 {
        return Err(ConfigError::Validation(
            "domain_time_budget_ms must be > 0".to_string(),
        ));
    }

    if config.max_consecutive_failures < 1 {
        return Err(ConfigError::Validation(format!(
            "max_consecutive_failures must be >= 1, got {}",
            config.max_consecutive_failures
        )));
    }

    if config.jitter_min_ms > config.jitter_max_ms {
        return Err(ConfigError::Validation(format!(
            "jitter_min_ms ({}) must not exceed jitter_max_ms ({})",
            config.jitter_min_ms, config.jitter_max_ms
        )));
    }

    Ok(())
}

fn validate_resolver_config(config: &ResolverConfig) -> Result<(), ConfigError> {
    if config.passes < 1 {
        return Err(ConfigError::Validation(format!(
            "resolver passes must be >= 1, got {}",
            config.passes
        )));
    }
    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    // Connect timeout must be strictly shorter than the total request timeout
    if config.connect_timeout_ms >= config.request_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_ms ({}) must be shorter than request_timeout_ms ({})",
            config.connect_timeout_ms, config.request_timeout_ms
        )));
    }

    if config.retry_timeout_ms < config.request_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "retry_timeout_ms ({}) must not be shorter than request_timeout_ms ({})",
            config.retry_timeout_ms, config.request_timeout_ms
        )));
    }

    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user_agents must contain at least one entry".to_string(),
        ));
    }

    if let Some(blank) = config.user_agents.iter().find(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "user_agents contains a blank entry: '{}'",
            blank
        )));
    }

    if config.max_redirects > 30 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= 30, got {}",
            config.max_redirects
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}
