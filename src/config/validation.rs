//! Configuration validation
//!
//! Checks that a parsed configuration is internally consistent before the
//! worker starts: at least one community to crawl, sane limits, parseable
//! base URLs, and known queue names.

use crate::config::types::Config;
use crate::queue::ALL_QUEUES;
use crate::ConfigError;
use url::Url;

/// Validates a parsed configuration
///
/// # Arguments
///
/// * `config` - The configuration to validate
///
/// # Returns
///
/// * `Ok(())` - Configuration is valid
/// * `Err(ConfigError::Validation)` - A check failed, with a message naming it
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.worker.concurrency == 0 {
        return Err(ConfigError::Validation(
            "worker.concurrency must be greater than 0".to_string(),
        ));
    }

    if config.worker.max_attempts == 0 {
        return Err(ConfigError::Validation(
            "worker.max-attempts must be greater than 0".to_string(),
        ));
    }

    if config.sources.imageboard.boards.is_empty() && config.sources.reddit.subreddits.is_empty() {
        return Err(ConfigError::Validation(
            "no communities configured: both sources.imageboard.boards and \
             sources.reddit.subreddits are empty"
                .to_string(),
        ));
    }

    for (name, base) in [
        ("sources.imageboard.base-url", &config.sources.imageboard.base_url),
        ("sources.reddit.base-url", &config.sources.reddit.base_url),
    ] {
        Url::parse(base).map_err(|e| {
            ConfigError::Validation(format!("{} is not a valid URL ({}): {}", name, base, e))
        })?;
    }

    if config.sources.reddit.listing_limit == 0 {
        return Err(ConfigError::Validation(
            "sources.reddit.listing-limit must be greater than 0".to_string(),
        ));
    }

    for queue in &config.worker.queues {
        if !ALL_QUEUES.contains(&queue.as_str()) {
            return Err(ConfigError::Validation(format!(
                "unknown queue name {:?} (expected one of {:?})",
                queue, ALL_QUEUES
            )));
        }
    }

    Ok(())
}
