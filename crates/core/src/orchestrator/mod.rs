//! Polling orchestrator: turns queue triggers into delivered clips.
//!
//! One cycle runs at a time because there is one camera:
//! - **Polling**: long-poll the work source; empty batches loop immediately
//! - **Cooldown**: sleep after a transient poll failure, until the retry policy gives up
//! - **Cycle**: capture, deliver, acknowledge, release

mod config;
mod runner;
mod types;

pub use config::{FailureMode, OrchestratorConfig, RetryPolicy};
pub use runner::{PollingOrchestrator, ShutdownHandle};
pub use types::{FailureCounter, OrchestratorError, OrchestratorStatus, PhaseKind};
