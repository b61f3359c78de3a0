pub mod capture;
pub mod config;
pub mod metrics;
pub mod notify;
pub mod orchestrator;
pub mod queue;
pub mod testing;

pub use capture::{Artifact, CaptureConfig, CaptureError, Capturer, CommandCapturer, OutputPaths};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, QueueConfig,
    SanitizedConfig, SlackConfig, StatusConfig,
};
pub use notify::{NoticeConfig, Notifier, NotifyError, SlackNotifier};
pub use orchestrator::{
    FailureMode, OrchestratorConfig, OrchestratorError, OrchestratorStatus, PhaseKind,
    PollingOrchestrator, RetryPolicy, ShutdownHandle,
};
pub use queue::{Batch, SqsWorkSource, Trigger, WorkSource, WorkSourceError};
