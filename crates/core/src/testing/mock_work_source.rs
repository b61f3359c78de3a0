//! Mock work source for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::queue::{Batch, Trigger, WorkSource, WorkSourceError};

use super::call_log::{Call, CallLog};

/// Mock implementation of the WorkSource trait.
///
/// Provides controllable behavior for testing:
/// - Script poll results in order (batches, empty polls, errors)
/// - Fail acknowledgment of specific triggers
/// - Track polls and acknowledgments for assertions
///
/// Once the script is exhausted, `poll` waits briefly and returns an empty batch,
/// like a long poll on an idle queue.
///
/// # Example
///
/// ```rust,ignore
/// use petcam_core::testing::{fixtures, MockWorkSource};
///
/// let source = MockWorkSource::new();
/// source.push_error(WorkSourceError::transient("connection reset")).await;
/// source.push_batch(fixtures::batch(3)).await;
///
/// // ... run the orchestrator ...
///
/// assert_eq!(source.acknowledged().await.len(), 3);
/// ```
#[derive(Debug)]
pub struct MockWorkSource {
    /// Scripted poll results.
    script: Arc<RwLock<VecDeque<Result<Batch, WorkSourceError>>>>,
    /// Acknowledgment errors by trigger id.
    ack_errors: Arc<RwLock<HashMap<String, WorkSourceError>>>,
    /// Acknowledged trigger ids.
    acknowledged: Arc<RwLock<Vec<String>>>,
    /// Number of polls performed.
    polls: Arc<RwLock<usize>>,
    /// Wait applied when the script is exhausted.
    idle_wait: Duration,
    log: CallLog,
}

impl Default for MockWorkSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWorkSource {
    /// Create a new mock work source with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(RwLock::new(VecDeque::new())),
            ack_errors: Arc::new(RwLock::new(HashMap::new())),
            acknowledged: Arc::new(RwLock::new(Vec::new())),
            polls: Arc::new(RwLock::new(0)),
            idle_wait: Duration::from_millis(10),
            log: CallLog::new(),
        }
    }

    /// Record calls into a shared log.
    pub fn with_call_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Wait applied to polls once the script is exhausted.
    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    /// Queue a batch to be returned by a future poll.
    pub async fn push_batch(&self, batch: Batch) {
        self.script.write().await.push_back(Ok(batch));
    }

    /// Queue `count` empty polls.
    pub async fn push_empty(&self, count: usize) {
        let mut script = self.script.write().await;
        for _ in 0..count {
            script.push_back(Ok(Batch::empty()));
        }
    }

    /// Queue a poll failure.
    pub async fn push_error(&self, error: WorkSourceError) {
        self.script.write().await.push_back(Err(error));
    }

    /// Make acknowledging `trigger_id` fail.
    pub async fn set_ack_error(&self, trigger_id: impl Into<String>, error: WorkSourceError) {
        self.ack_errors.write().await.insert(trigger_id.into(), error);
    }

    /// Get the ids of all acknowledged triggers.
    pub async fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.read().await.clone()
    }

    /// Get the number of polls performed.
    pub async fn poll_count(&self) -> usize {
        *self.polls.read().await
    }

    /// Number of scripted results not yet returned.
    pub async fn remaining(&self) -> usize {
        self.script.read().await.len()
    }
}

#[async_trait]
impl WorkSource for MockWorkSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn poll(&self) -> Result<Batch, WorkSourceError> {
        *self.polls.write().await += 1;
        self.log.record(Call::Poll).await;

        let next = self.script.write().await.pop_front();
        match next {
            Some(result) => result,
            None => {
                tokio::time::sleep(self.idle_wait).await;
                Ok(Batch::empty())
            }
        }
    }

    async fn acknowledge(&self, trigger: &Trigger) -> Result<(), WorkSourceError> {
        self.log.record(Call::Acknowledge(trigger.id.clone())).await;

        if let Some(error) = self.ack_errors.read().await.get(&trigger.id) {
            return Err(error.clone());
        }

        self.acknowledged.write().await.push(trigger.id.clone());
        Ok(())
    }
}
