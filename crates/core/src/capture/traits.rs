//! Trait definitions for the capture module.

use async_trait::async_trait;
use std::time::Duration;

use super::error::CaptureError;
use super::types::{Artifact, OutputPaths};

/// Something that can record a clip: one camera, one capture at a time.
#[async_trait]
pub trait Capturer: Send + Sync {
    /// Returns the name of this capturer implementation.
    fn name(&self) -> &str;

    /// Records a clip of `duration` and packages it into the final format.
    ///
    /// Packaging only runs if recording succeeded. The returned artifact is the
    /// sole reference to the files it names.
    async fn capture(&self, duration: Duration, output: &OutputPaths)
        -> Result<Artifact, CaptureError>;

    /// Deletes the files backing an artifact.
    async fn release(&self, artifact: Artifact) -> Result<(), CaptureError>;

    /// Validates that the capturer is properly configured and ready.
    async fn validate(&self) -> Result<(), CaptureError>;
}
