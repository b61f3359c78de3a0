//! Error types for the notify module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while delivering to the notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Notifier is missing required settings.
    #[error("Notifier not configured: {0}")]
    NotConfigured(String),

    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("{method} returned HTTP {status}: {body}")]
    Status {
        method: String,
        status: u16,
        body: String,
    },

    /// The service answered 2xx but reported an application error.
    #[error("{method} failed: {error}")]
    Api { method: String, error: String },

    /// The response body could not be understood.
    #[error("Invalid {method} response: {reason}")]
    InvalidResponse { method: String, reason: String },

    /// The artifact file could not be read for upload.
    #[error("Failed to read artifact {path}: {source}")]
    ReadArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl NotifyError {
    /// Creates a new API error.
    pub fn api(method: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Api {
            method: method.into(),
            error: error.into(),
        }
    }

    /// Creates a new invalid response error.
    pub fn invalid_response(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            method: method.into(),
            reason: reason.into(),
        }
    }
}
