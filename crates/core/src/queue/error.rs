//! Error types for the work source module.

use thiserror::Error;

/// Errors that can occur while talking to the work queue.
#[derive(Debug, Clone, Error)]
pub enum WorkSourceError {
    /// The queue is unreachable or returned a retryable fault.
    #[error("Work source temporarily unavailable: {reason}")]
    Transient { reason: String },

    /// The request can never succeed as configured (missing queue, bad credentials, ...).
    #[error("Work source rejected the request: {reason}")]
    Permanent { reason: String },

    /// Removing a consumed trigger failed.
    #[error("Failed to acknowledge trigger {trigger_id}: {reason}")]
    AcknowledgeFailed { trigger_id: String, reason: String },
}

impl WorkSourceError {
    /// Creates a new transient error.
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient {
            reason: reason.into(),
        }
    }

    /// Creates a new permanent error.
    pub fn permanent(reason: impl Into<String>) -> Self {
        Self::Permanent {
            reason: reason.into(),
        }
    }

    /// Creates a new acknowledgment error.
    pub fn acknowledge_failed(trigger_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AcknowledgeFailed {
            trigger_id: trigger_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether a later retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
