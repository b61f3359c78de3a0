//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What the orchestrator does when a cycle step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Stop the service after a final notice.
    #[default]
    Terminate,
    /// Log the failure and keep polling.
    Continue,
}

/// Escalation policy for consecutive queue poll failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Consecutive transient poll failures that stop the service (at least 1).
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures: u32,

    /// Sleep after a transient poll failure before polling again (seconds).
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
}

fn default_max_failures() -> u32 {
    3
}

fn default_cooldown() -> u64 {
    60
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: default_max_failures(),
            cooldown_secs: default_cooldown(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_consecutive_failures: u32, cooldown_secs: u64) -> Self {
        Self {
            max_consecutive_failures,
            cooldown_secs,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Configuration for the polling orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Length of each recorded clip (seconds).
    #[serde(default = "default_clip_duration")]
    pub clip_duration_secs: u64,

    /// Directory for in-flight capture files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Failure of the "starting" notice.
    #[serde(default)]
    pub on_start_notice_error: FailureMode,

    /// Capture or delivery failure. `continue` abandons the batch without
    /// acknowledging it, so the queue redelivers it later.
    #[serde(default)]
    pub on_action_error: FailureMode,

    /// Acknowledgment failure after a successful delivery.
    #[serde(default)]
    pub on_ack_error: FailureMode,
}

fn default_clip_duration() -> u64 {
    10
}

fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("petcam")
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            clip_duration_secs: default_clip_duration(),
            output_dir: default_output_dir(),
            on_start_notice_error: FailureMode::Terminate,
            on_action_error: FailureMode::Terminate,
            on_ack_error: FailureMode::Terminate,
        }
    }
}

impl OrchestratorConfig {
    /// Keeps running through cycle failures instead of stopping.
    pub fn hardened(mut self) -> Self {
        self.on_start_notice_error = FailureMode::Continue;
        self.on_action_error = FailureMode::Continue;
        self.on_ack_error = FailureMode::Continue;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn clip_duration(&self) -> Duration {
        Duration::from_secs(self.clip_duration_secs)
    }
}
