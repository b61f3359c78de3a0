//! Shared call log for ordering assertions across mocks.

use std::sync::Arc;
use tokio::sync::RwLock;

/// One recorded call on a mock collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Poll,
    /// Trigger id.
    Acknowledge(String),
    /// Output file stem.
    Capture(String),
    /// Artifact id.
    Release(String),
    /// Artifact id.
    DeliverArtifact(String),
    /// Notice text.
    DeliverNotice(String),
}

/// Ordered record of calls, shared by every mock built with it.
///
/// # Example
///
/// ```rust,ignore
/// let log = CallLog::new();
/// let source = MockWorkSource::new().with_call_log(log.clone());
/// let notifier = MockNotifier::new().with_call_log(log.clone());
/// // ... run the orchestrator ...
/// assert!(log.position(|c| matches!(c, Call::DeliverArtifact(_))).await
///     < log.position(|c| matches!(c, Call::Acknowledge(_))).await);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<RwLock<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, call: Call) {
        self.calls.write().await.push(call);
    }

    /// All calls in the order they were made.
    pub async fn calls(&self) -> Vec<Call> {
        self.calls.read().await.clone()
    }

    /// Index of the first call matching `predicate`.
    pub async fn position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.read().await.iter().position(predicate)
    }

    /// Number of calls matching `predicate`.
    pub async fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.read().await.iter().filter(|c| predicate(*c)).count()
    }

    pub async fn clear(&self) {
        self.calls.write().await.clear();
    }
}
