//! Trait definitions for the notify module.

use async_trait::async_trait;

use super::error::NotifyError;
use crate::capture::Artifact;

/// A notification sink bound to one destination.
///
/// Implementations do not retry internally.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the name of this notifier implementation.
    fn name(&self) -> &str;

    /// Uploads the clip behind `artifact`.
    ///
    /// The artifact is only borrowed; releasing its files stays with the caller.
    async fn deliver_artifact(&self, artifact: &Artifact) -> Result<(), NotifyError>;

    /// Posts a short text notice.
    async fn deliver_notice(&self, text: &str) -> Result<(), NotifyError>;
}
