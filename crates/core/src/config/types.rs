use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::capture::CaptureConfig;
use crate::notify::NoticeConfig;
use crate::orchestrator::{OrchestratorConfig, RetryPolicy};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub slack: SlackConfig,
    pub queue: QueueConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub notices: NoticeConfig,
    #[serde(default)]
    pub status: StatusConfig,
}

/// Slack delivery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`).
    pub token: String,
    /// Channel that receives notices and clips.
    pub channel_id: String,
    /// Web API base URL (overridable for tests and proxies).
    #[serde(default = "default_slack_api_base_url")]
    pub api_base_url: String,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_slack_timeout")]
    pub timeout_secs: u64,
    /// File name shown in the channel for uploaded clips.
    #[serde(default = "default_upload_filename")]
    pub upload_filename: String,
}

fn default_slack_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_slack_timeout() -> u64 {
    60
}

fn default_upload_filename() -> String {
    "movie.mp4".to_string()
}

/// SQS work queue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Queue URL (e.g., "https://sqs.ap-northeast-1.amazonaws.com/123456789012/petcam")
    pub url: String,
    /// AWS region of the queue.
    #[serde(default = "default_region")]
    pub region: String,
    /// Shared credentials profile. An empty string uses the default provider chain.
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Endpoint override (e.g., a local SQS emulator).
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Maximum messages per receive call (1-10).
    #[serde(default = "default_max_messages")]
    pub max_messages: i32,
    /// Long-poll wait in seconds (0-20).
    #[serde(default = "default_wait_time")]
    pub wait_time_secs: i32,
    /// Total attempts per SDK call, including the first one.
    #[serde(default = "default_sdk_max_attempts")]
    pub sdk_max_attempts: u32,
}

fn default_region() -> String {
    "ap-northeast-1".to_string()
}

fn default_profile() -> String {
    "petcam".to_string()
}

fn default_max_messages() -> i32 {
    10
}

fn default_wait_time() -> i32 {
    20
}

fn default_sdk_max_attempts() -> u32 {
    4
}

/// Status HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    9100
}

/// Sanitized config for logs and the status API (token redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub slack: SanitizedSlackConfig,
    pub queue: QueueConfig,
    pub capture: CaptureConfig,
    pub orchestrator: OrchestratorConfig,
    pub status: StatusConfig,
}

/// Sanitized Slack config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSlackConfig {
    pub channel_id: String,
    pub api_base_url: String,
    pub token_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            slack: SanitizedSlackConfig {
                channel_id: config.slack.channel_id.clone(),
                api_base_url: config.slack.api_base_url.clone(),
                token_configured: !config.slack.token.is_empty(),
                timeout_secs: config.slack.timeout_secs,
            },
            queue: config.queue.clone(),
            capture: config.capture.clone(),
            orchestrator: config.orchestrator.clone(),
            status: config.status.clone(),
        }
    }
}

impl Config {
    /// The retry policy driving poll failure escalation.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.orchestrator.retry
    }
}
