//! Types for the polling orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::CaptureError;
use crate::notify::NotifyError;
use crate::queue::WorkSourceError;

/// Fatal errors that stop the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Too many consecutive transient poll failures.
    #[error("gave up after {failures} consecutive poll failures: {last_error}")]
    RetriesExhausted {
        failures: u32,
        last_error: WorkSourceError,
    },

    /// The queue reported an error that retrying will not fix.
    #[error("queue poll failed: {0}")]
    Poll(WorkSourceError),

    /// The "starting" notice could not be posted.
    #[error("starting notice failed: {0}")]
    StartNotice(NotifyError),

    /// Recording or packaging failed.
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// The clip could not be delivered.
    #[error("delivery failed: {0}")]
    Delivery(NotifyError),

    /// One or more triggers could not be acknowledged.
    #[error("{failed} of {total} acknowledgments failed: {first}")]
    Acknowledge {
        failed: usize,
        total: usize,
        first: WorkSourceError,
    },

    /// `step` was called after a fatal error.
    #[error("orchestrator already stopped after a fatal error")]
    Terminated,
}

impl OrchestratorError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RetriesExhausted { .. } => "retries_exhausted",
            Self::Poll(_) => "poll",
            Self::StartNotice(_) => "start_notice",
            Self::Capture(_) => "capture",
            Self::Delivery(_) => "delivery",
            Self::Acknowledge { .. } => "acknowledge",
            Self::Terminated => "terminated",
        }
    }
}

/// Counts consecutive transient poll failures.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailureCounter {
    consecutive_failures: u32,
}

impl FailureCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed poll. Returns the new count.
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_failures
    }

    /// Record a successful poll (resets the count).
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn count(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether the count has reached `threshold`.
    pub fn reached(&self, threshold: u32) -> bool {
        self.consecutive_failures >= threshold
    }
}

/// Observable phase of the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    #[default]
    Polling,
    Cooldown,
    Acting,
    Acknowledging,
    Cleanup,
    Stopped,
    Failed,
}

impl PhaseKind {
    /// Whether no further steps will run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Phase the next step will run.
    pub phase: PhaseKind,
    /// Consecutive transient poll failures.
    pub consecutive_failures: u32,
    /// Failure count that stops the service.
    pub max_consecutive_failures: u32,
    /// Cycles that delivered a clip.
    pub cycles_completed: u64,
    /// Cycles dropped without acknowledgment.
    pub cycles_abandoned: u64,
    /// Triggers acknowledged since start.
    pub triggers_acknowledged: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_poll_at: Option<DateTime<Utc>>,
    pub last_cycle_at: Option<DateTime<Utc>>,
    /// Most recent error, fatal or not.
    pub last_error: Option<String>,
}
