//! Notice texts posted by the orchestrator.

use serde::{Deserialize, Serialize};

const ERROR_PLACEHOLDER: &str = "{error}";

/// Configurable notice templates.
///
/// Templates may contain `{error}`, replaced by the error that caused the notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeConfig {
    /// Post a notice when a capture cycle starts.
    #[serde(default = "default_true")]
    pub announce_cycles: bool,

    /// Post notices when entering and leaving cooldown.
    #[serde(default = "default_true")]
    pub announce_pauses: bool,

    #[serde(default = "default_poll_failed")]
    pub poll_failed: String,

    #[serde(default = "default_pausing")]
    pub pausing: String,

    #[serde(default = "default_resuming")]
    pub resuming: String,

    /// Final notice once the consecutive failure limit is reached.
    #[serde(default = "default_retries_exhausted")]
    pub retries_exhausted: String,

    /// Final notice for any other fatal error.
    #[serde(default = "default_fatal")]
    pub fatal: String,

    #[serde(default = "default_starting")]
    pub starting: String,

    /// Posted when a cycle is abandoned and the service keeps running.
    #[serde(default = "default_cycle_failed")]
    pub cycle_failed: String,
}

fn default_true() -> bool {
    true
}

fn default_poll_failed() -> String {
    "Failed to fetch messages from the queue: {error}".to_string()
}

fn default_pausing() -> String {
    "Pausing for a while before retrying.".to_string()
}

fn default_resuming() -> String {
    "Resuming.".to_string()
}

fn default_retries_exhausted() -> String {
    "Reached the maximum number of retries, stopping. Last error: {error}".to_string()
}

fn default_fatal() -> String {
    "Stopping after an unrecoverable error: {error}".to_string()
}

fn default_starting() -> String {
    "Recording started.".to_string()
}

fn default_cycle_failed() -> String {
    "Capture cycle failed and was skipped: {error}".to_string()
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            announce_cycles: true,
            announce_pauses: true,
            poll_failed: default_poll_failed(),
            pausing: default_pausing(),
            resuming: default_resuming(),
            retries_exhausted: default_retries_exhausted(),
            fatal: default_fatal(),
            starting: default_starting(),
            cycle_failed: default_cycle_failed(),
        }
    }
}

impl NoticeConfig {
    /// Disables the optional starting, pausing and resuming notices.
    pub fn quiet() -> Self {
        Self {
            announce_cycles: false,
            announce_pauses: false,
            ..Default::default()
        }
    }

    pub fn poll_failed(&self, error: &str) -> String {
        render(&self.poll_failed, error)
    }

    pub fn retries_exhausted(&self, error: &str) -> String {
        render(&self.retries_exhausted, error)
    }

    pub fn fatal(&self, error: &str) -> String {
        render(&self.fatal, error)
    }

    pub fn cycle_failed(&self, error: &str) -> String {
        render(&self.cycle_failed, error)
    }
}

fn render(template: &str, error: &str) -> String {
    template.replace(ERROR_PLACEHOLDER, error)
}
