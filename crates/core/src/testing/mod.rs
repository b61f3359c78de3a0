//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits used by
//! the orchestrator, so its state machine can be driven without a queue, a
//! camera or a chat service.
//!
//! # Example
//!
//! ```rust,ignore
//! use petcam_core::testing::{fixtures, CallLog, MockCapturer, MockNotifier, MockWorkSource};
//!
//! let log = CallLog::new();
//! let source = Arc::new(MockWorkSource::new().with_call_log(log.clone()));
//! let capturer = Arc::new(MockCapturer::new().with_call_log(log.clone()));
//! let notifier = Arc::new(MockNotifier::new().with_call_log(log.clone()));
//!
//! source.push_batch(fixtures::batch(3)).await;
//! ```

mod call_log;
mod mock_capturer;
mod mock_notifier;
mod mock_work_source;

pub use call_log::{Call, CallLog};
pub use mock_capturer::MockCapturer;
pub use mock_notifier::MockNotifier;
pub use mock_work_source::MockWorkSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::queue::{Batch, Trigger};

    /// Create a trigger with a receipt derived from its id.
    pub fn trigger(id: &str) -> Trigger {
        Trigger::new(id, format!("receipt-{}", id))
    }

    /// Create a batch of `count` triggers with ids `t-1`, `t-2`, ...
    pub fn batch(count: usize) -> Batch {
        (1..=count).map(|i| trigger(&format!("t-{}", i))).collect()
    }
}
