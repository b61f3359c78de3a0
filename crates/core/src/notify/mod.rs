//! Notify module for delivering clips and status notices.
//!
//! The `Notifier` trait covers the two delivery operations the orchestrator
//! needs: uploading a captured clip and posting a short text notice. The
//! destination is bound into the notifier at construction.
//!
//! # Example
//!
//! ```ignore
//! use petcam_core::notify::{Notifier, SlackNotifier};
//!
//! let notifier = SlackNotifier::new(config.slack.clone())?;
//! notifier.deliver_notice("Recording started.").await?;
//! notifier.deliver_artifact(&artifact).await?;
//! ```

mod error;
mod notices;
mod slack;
mod traits;

pub use error::NotifyError;
pub use notices::NoticeConfig;
pub use slack::SlackNotifier;
pub use traits::Notifier;
