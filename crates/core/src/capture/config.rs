//! Configuration for the capture module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the command-line capturer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Path to the recorder binary.
    #[serde(default = "default_recorder_path")]
    pub recorder_path: PathBuf,

    /// Path to the packager binary.
    #[serde(default = "default_packager_path")]
    pub packager_path: PathBuf,

    /// Frame width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Frame height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Flip the image vertically.
    #[serde(default = "default_true")]
    pub vflip: bool,

    /// Flip the image horizontally.
    #[serde(default = "default_true")]
    pub hflip: bool,

    /// Frame rate written into the MP4 container.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Extra time allowed on top of the clip duration before a step is killed.
    #[serde(default = "default_timeout_margin")]
    pub timeout_margin_secs: u64,

    /// Additional recorder arguments.
    #[serde(default)]
    pub extra_recorder_args: Vec<String>,

    /// Additional packager arguments.
    #[serde(default)]
    pub extra_packager_args: Vec<String>,
}

fn default_recorder_path() -> PathBuf {
    PathBuf::from("raspivid")
}

fn default_packager_path() -> PathBuf {
    PathBuf::from("MP4Box")
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

fn default_true() -> bool {
    true
}

fn default_fps() -> u32 {
    30
}

fn default_timeout_margin() -> u64 {
    30
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            recorder_path: default_recorder_path(),
            packager_path: default_packager_path(),
            width: default_width(),
            height: default_height(),
            vflip: true,
            hflip: true,
            fps: default_fps(),
            timeout_margin_secs: default_timeout_margin(),
            extra_recorder_args: Vec::new(),
            extra_packager_args: Vec::new(),
        }
    }
}

impl CaptureConfig {
    /// Creates a new config with custom recorder/packager paths.
    pub fn with_paths(recorder_path: PathBuf, packager_path: PathBuf) -> Self {
        Self {
            recorder_path,
            packager_path,
            ..Default::default()
        }
    }

    /// Sets the frame size.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the timeout margin in seconds.
    pub fn with_timeout_margin(mut self, secs: u64) -> Self {
        self.timeout_margin_secs = secs;
        self
    }
}
