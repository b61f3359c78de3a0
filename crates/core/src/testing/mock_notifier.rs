//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::capture::Artifact;
use crate::notify::{Notifier, NotifyError};

use super::call_log::{Call, CallLog};

/// Mock implementation of the Notifier trait.
///
/// Provides controllable behavior for testing:
/// - Record posted notices and delivered artifacts
/// - Fail the next delivery or notice, or every notice
#[derive(Debug)]
pub struct MockNotifier {
    /// Texts of all attempted notices (including failed ones).
    notices: Arc<RwLock<Vec<String>>>,
    /// Ids of successfully delivered artifacts.
    delivered: Arc<RwLock<Vec<String>>>,
    /// If set, the next artifact delivery will fail with this error.
    next_artifact_error: Arc<RwLock<Option<NotifyError>>>,
    /// If set, the next notice will fail with this error.
    next_notice_error: Arc<RwLock<Option<NotifyError>>>,
    /// Fail every notice.
    fail_notices: Arc<RwLock<bool>>,
    log: CallLog,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    /// Create a new mock notifier.
    pub fn new() -> Self {
        Self {
            notices: Arc::new(RwLock::new(Vec::new())),
            delivered: Arc::new(RwLock::new(Vec::new())),
            next_artifact_error: Arc::new(RwLock::new(None)),
            next_notice_error: Arc::new(RwLock::new(None)),
            fail_notices: Arc::new(RwLock::new(false)),
            log: CallLog::new(),
        }
    }

    /// Record calls into a shared log.
    pub fn with_call_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Configure the next artifact delivery to fail with the given error.
    pub async fn set_next_artifact_error(&self, error: NotifyError) {
        *self.next_artifact_error.write().await = Some(error);
    }

    /// Configure the next notice to fail with the given error.
    pub async fn set_next_notice_error(&self, error: NotifyError) {
        *self.next_notice_error.write().await = Some(error);
    }

    /// Make every notice fail.
    pub async fn set_fail_notices(&self, fail: bool) {
        *self.fail_notices.write().await = fail;
    }

    /// Get all attempted notice texts.
    pub async fn notices(&self) -> Vec<String> {
        self.notices.read().await.clone()
    }

    /// Get the ids of delivered artifacts.
    pub async fn delivered(&self) -> Vec<String> {
        self.delivered.read().await.clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn deliver_artifact(&self, artifact: &Artifact) -> Result<(), NotifyError> {
        self.log.record(Call::DeliverArtifact(artifact.id.clone())).await;

        if let Some(error) = self.next_artifact_error.write().await.take() {
            return Err(error);
        }

        self.delivered.write().await.push(artifact.id.clone());
        Ok(())
    }

    async fn deliver_notice(&self, text: &str) -> Result<(), NotifyError> {
        self.log.record(Call::DeliverNotice(text.to_string())).await;
        self.notices.write().await.push(text.to_string());

        if let Some(error) = self.next_notice_error.write().await.take() {
            return Err(error);
        }
        if *self.fail_notices.read().await {
            return Err(NotifyError::api("chat.postMessage", "ratelimited"));
        }
        Ok(())
    }
}
