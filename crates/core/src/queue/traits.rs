//! Trait definitions for the work source module.

use async_trait::async_trait;

use super::error::WorkSourceError;
use super::types::{Batch, Trigger};

/// A queue of pending capture triggers.
#[async_trait]
pub trait WorkSource: Send + Sync {
    /// Returns the name of this work source implementation.
    fn name(&self) -> &str;

    /// Receives the next batch of pending triggers.
    ///
    /// Blocks for at most the implementation's wait window. An empty batch
    /// means nothing is pending and is not an error.
    async fn poll(&self) -> Result<Batch, WorkSourceError>;

    /// Removes a consumed trigger from the queue.
    ///
    /// Not idempotent: call exactly once per processed trigger.
    async fn acknowledge(&self, trigger: &Trigger) -> Result<(), WorkSourceError>;
}
