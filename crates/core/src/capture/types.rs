//! Types for the capture module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where a capture writes its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    /// Directory for the raw recording and the final clip.
    pub directory: PathBuf,
    /// File name without extension, unique per cycle.
    pub file_stem: String,
}

impl OutputPaths {
    pub fn new(directory: impl Into<PathBuf>, file_stem: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_stem: file_stem.into(),
        }
    }

    /// Path of the raw H.264 stream written by the recorder.
    pub fn raw_path(&self) -> PathBuf {
        self.directory.join(format!("{}.h264", self.file_stem))
    }

    /// Path of the packaged MP4 clip.
    pub fn final_path(&self) -> PathBuf {
        self.directory.join(format!("{}.mp4", self.file_stem))
    }
}

/// A captured clip on local storage.
///
/// Deliberately not `Clone`: the artifact is the only handle to its files and
/// is consumed by [`Capturer::release`](super::Capturer::release).
#[derive(Debug, Serialize)]
pub struct Artifact {
    /// Identifier (the output file stem).
    pub id: String,
    /// The deliverable file.
    pub path: PathBuf,
    /// Intermediate files removed together with the deliverable.
    pub intermediates: Vec<PathBuf>,
    /// Size of the deliverable in bytes.
    pub size_bytes: u64,
    /// Requested clip duration.
    pub duration: Duration,
    /// When the recording finished.
    pub captured_at: DateTime<Utc>,
}

impl Artifact {
    /// File name of the deliverable.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}.mp4", self.id))
    }

    /// Every file backing this artifact, deliverable first.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.path.as_path()).chain(self.intermediates.iter().map(PathBuf::as_path))
    }
}
