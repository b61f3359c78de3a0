//! Capture module for recording video clips.
//!
//! This module provides the `Capturer` trait and a command-line implementation
//! that records with `raspivid` and packages the raw H.264 stream into MP4 with
//! `MP4Box`.
//!
//! # Example
//!
//! ```ignore
//! use petcam_core::capture::{CommandCapturer, Capturer, OutputPaths};
//!
//! let capturer = CommandCapturer::with_defaults();
//! capturer.validate().await?;
//!
//! let output = OutputPaths::new("/tmp/petcam", "clip-1");
//! let artifact = capturer.capture(Duration::from_secs(10), &output).await?;
//! println!("Captured {} bytes to {:?}", artifact.size_bytes, artifact.path);
//!
//! // The artifact owns the files on disk until released.
//! capturer.release(artifact).await?;
//! ```

mod command;
mod config;
mod error;
mod traits;
mod types;

pub use command::CommandCapturer;
pub use config::CaptureConfig;
pub use error::{CaptureError, CaptureStep};
pub use traits::Capturer;
pub use types::{Artifact, OutputPaths};
