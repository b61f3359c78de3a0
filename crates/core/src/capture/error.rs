//! Error types for the capture module.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The external process a capture error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStep {
    Record,
    Package,
}

impl fmt::Display for CaptureStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record => write!(f, "recording"),
            Self::Package => write!(f, "packaging"),
        }
    }
}

/// Errors that can occur during capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// A capture binary was not found.
    #[error("{step} binary not found at path: {path}")]
    BinaryNotFound { step: CaptureStep, path: PathBuf },

    /// A capture process exited unsuccessfully.
    #[error("{step} failed: {reason}")]
    StepFailed {
        step: CaptureStep,
        reason: String,
        stderr: Option<String>,
    },

    /// A capture process ran past its deadline and was killed.
    #[error("{step} timed out after {timeout_secs} seconds")]
    Timeout { step: CaptureStep, timeout_secs: u64 },

    /// The packager exited successfully but left no output file.
    #[error("Capture output not created: {path}")]
    OutputMissing { path: PathBuf },

    /// Failed to create the output directory.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// I/O error during capture or release.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// Creates a new step failed error with stderr output.
    pub fn step_failed(step: CaptureStep, reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::StepFailed {
            step,
            reason: reason.into(),
            stderr,
        }
    }

    /// The step that failed, if the error came from one.
    pub fn step(&self) -> Option<CaptureStep> {
        match self {
            Self::BinaryNotFound { step, .. }
            | Self::StepFailed { step, .. }
            | Self::Timeout { step, .. } => Some(*step),
            _ => None,
        }
    }
}
