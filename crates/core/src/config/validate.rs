use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Slack token, channel and queue URL are present (not blank)
/// - Retry threshold is at least 1
/// - Queue receive parameters are within SQS limits
/// - Clip duration is not 0
/// - Status port is not 0 when the status server is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    require_non_blank("slack.token", &config.slack.token)?;
    require_non_blank("slack.channel_id", &config.slack.channel_id)?;
    require_non_blank("queue.url", &config.queue.url)?;

    if config.slack.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "slack.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.orchestrator.retry.max_consecutive_failures == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.retry.max_consecutive_failures must be at least 1".to_string(),
        ));
    }

    if !(1..=10).contains(&config.queue.max_messages) {
        return Err(ConfigError::ValidationError(format!(
            "queue.max_messages must be between 1 and 10, got {}",
            config.queue.max_messages
        )));
    }

    if !(0..=20).contains(&config.queue.wait_time_secs) {
        return Err(ConfigError::ValidationError(format!(
            "queue.wait_time_secs must be between 0 and 20, got {}",
            config.queue.wait_time_secs
        )));
    }

    if config.orchestrator.clip_duration_secs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.clip_duration_secs cannot be 0".to_string(),
        ));
    }

    if config.status.enabled && config.status.port == 0 {
        return Err(ConfigError::ValidationError(
            "status.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}

fn require_non_blank(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!("{} is empty", key)));
    }
    Ok(())
}
