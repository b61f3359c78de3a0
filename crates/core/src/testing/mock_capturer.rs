//! Mock capturer for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::capture::{Artifact, CaptureError, Capturer, OutputPaths};

use super::call_log::{Call, CallLog};

/// Mock implementation of the Capturer trait.
///
/// Returns artifacts pointing at the requested output paths without touching
/// the filesystem. Tracks captures and releases so tests can check that every
/// artifact is released exactly once.
#[derive(Debug)]
pub struct MockCapturer {
    /// File stems of all capture requests.
    captures: Arc<RwLock<Vec<String>>>,
    /// Ids of released artifacts.
    released: Arc<RwLock<Vec<String>>>,
    /// If set, the next capture will fail with this error.
    next_error: Arc<RwLock<Option<CaptureError>>>,
    /// If set, the next release will fail with this error.
    next_release_error: Arc<RwLock<Option<CaptureError>>>,
    /// Simulated capture duration.
    capture_delay: Arc<RwLock<Duration>>,
    log: CallLog,
}

impl Default for MockCapturer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCapturer {
    /// Create a new mock capturer.
    pub fn new() -> Self {
        Self {
            captures: Arc::new(RwLock::new(Vec::new())),
            released: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            next_release_error: Arc::new(RwLock::new(None)),
            capture_delay: Arc::new(RwLock::new(Duration::ZERO)),
            log: CallLog::new(),
        }
    }

    /// Record calls into a shared log.
    pub fn with_call_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Configure the next capture to fail with the given error.
    pub async fn set_next_error(&self, error: CaptureError) {
        *self.next_error.write().await = Some(error);
    }

    /// Configure the next release to fail with the given error.
    pub async fn set_next_release_error(&self, error: CaptureError) {
        *self.next_release_error.write().await = Some(error);
    }

    /// Set the simulated capture duration.
    pub async fn set_capture_delay(&self, delay: Duration) {
        *self.capture_delay.write().await = delay;
    }

    /// Get the number of captures attempted.
    pub async fn capture_count(&self) -> usize {
        self.captures.read().await.len()
    }

    /// Get the ids of released artifacts, in release order.
    pub async fn released(&self) -> Vec<String> {
        self.released.read().await.clone()
    }
}

#[async_trait]
impl Capturer for MockCapturer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn capture(
        &self,
        duration: Duration,
        output: &OutputPaths,
    ) -> Result<Artifact, CaptureError> {
        self.captures.write().await.push(output.file_stem.clone());
        self.log.record(Call::Capture(output.file_stem.clone())).await;

        let delay = *self.capture_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        Ok(Artifact {
            id: output.file_stem.clone(),
            path: output.final_path(),
            intermediates: vec![output.raw_path()],
            size_bytes: 1024 * 512,
            duration,
            captured_at: Utc::now(),
        })
    }

    async fn release(&self, artifact: Artifact) -> Result<(), CaptureError> {
        self.log.record(Call::Release(artifact.id.clone())).await;
        self.released.write().await.push(artifact.id);

        if let Some(error) = self.next_release_error.write().await.take() {
            return Err(error);
        }
        Ok(())
    }

    async fn validate(&self) -> Result<(), CaptureError> {
        Ok(())
    }
}
