//! Command-line capturer: `raspivid` records, `MP4Box` packages.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::config::CaptureConfig;
use super::error::{CaptureError, CaptureStep};
use super::traits::Capturer;
use super::types::{Artifact, OutputPaths};

/// Characters of stderr kept in error reports.
const STDERR_TAIL_CHARS: usize = 2000;

/// Capturer that shells out to a recorder and a packager binary.
pub struct CommandCapturer {
    config: CaptureConfig,
}

impl CommandCapturer {
    /// Creates a new capturer with the given configuration.
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    /// Creates a capturer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CaptureConfig::default())
    }

    /// Builds recorder arguments for a clip of `duration`.
    fn build_recorder_args(&self, raw_path: &Path, duration: Duration) -> Vec<String> {
        let mut args = Vec::new();

        if self.config.vflip {
            args.push("-vf".to_string());
        }
        if self.config.hflip {
            args.push("-hf".to_string());
        }

        args.extend([
            "-o".to_string(),
            raw_path.to_string_lossy().to_string(),
            "-w".to_string(),
            self.config.width.to_string(),
            "-h".to_string(),
            self.config.height.to_string(),
            "-t".to_string(),
            duration.as_millis().to_string(),
        ]);

        args.extend(self.config.extra_recorder_args.iter().cloned());

        args
    }

    /// Builds packager arguments wrapping the raw stream into MP4.
    fn build_packager_args(&self, raw_path: &Path, final_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-fps".to_string(),
            self.config.fps.to_string(),
            "-add".to_string(),
            raw_path.to_string_lossy().to_string(),
        ];

        args.extend(self.config.extra_packager_args.iter().cloned());

        args.extend(["-new".to_string(), final_path.to_string_lossy().to_string()]);

        args
    }

    fn binary(&self, step: CaptureStep) -> &Path {
        match step {
            CaptureStep::Record => &self.config.recorder_path,
            CaptureStep::Package => &self.config.packager_path,
        }
    }

    /// Runs one capture step to completion, killing it at the deadline.
    async fn run_step(
        &self,
        step: CaptureStep,
        args: &[String],
        deadline: Duration,
    ) -> Result<(), CaptureError> {
        let program = self.binary(step);
        debug!(%step, program = %program.display(), ?args, "Running capture step");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptureError::BinaryNotFound {
                        step,
                        path: program.to_path_buf(),
                    }
                } else {
                    CaptureError::Io(e)
                }
            })?;

        match timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => Err(CaptureError::step_failed(
                step,
                format!("exited with code: {:?}", output.status.code()),
                stderr_tail(&output.stderr),
            )),
            Ok(Err(e)) => Err(CaptureError::Io(e)),
            // Dropping the wait future drops the child, which kills it.
            Err(_) => Err(CaptureError::Timeout {
                step,
                timeout_secs: deadline.as_secs(),
            }),
        }
    }

    /// Removes leftovers of a failed capture.
    async fn discard(&self, paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = remove_if_exists(path).await {
                warn!(path = %path.display(), "Failed to remove partial capture file: {}", e);
            }
        }
    }
}

#[async_trait]
impl Capturer for CommandCapturer {
    fn name(&self) -> &str {
        "command"
    }

    async fn capture(
        &self,
        duration: Duration,
        output: &OutputPaths,
    ) -> Result<Artifact, CaptureError> {
        let start = Instant::now();

        tokio::fs::create_dir_all(&output.directory)
            .await
            .map_err(|_| CaptureError::OutputDirectoryFailed {
                path: output.directory.clone(),
            })?;

        let raw_path = output.raw_path();
        let final_path = output.final_path();
        let deadline = duration + Duration::from_secs(self.config.timeout_margin_secs);

        let record_args = self.build_recorder_args(&raw_path, duration);
        if let Err(e) = self.run_step(CaptureStep::Record, &record_args, deadline).await {
            self.discard(&[raw_path]).await;
            return Err(e);
        }
        let captured_at = Utc::now();

        let package_args = self.build_packager_args(&raw_path, &final_path);
        if let Err(e) = self.run_step(CaptureStep::Package, &package_args, deadline).await {
            self.discard(&[raw_path, final_path]).await;
            return Err(e);
        }

        let size_bytes = match tokio::fs::metadata(&final_path).await {
            Ok(meta) => meta.len(),
            Err(_) => {
                self.discard(&[raw_path]).await;
                return Err(CaptureError::OutputMissing { path: final_path });
            }
        };

        info!(
            clip = %output.file_stem,
            size_bytes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Clip captured"
        );

        Ok(Artifact {
            id: output.file_stem.clone(),
            path: final_path,
            intermediates: vec![raw_path],
            size_bytes,
            duration,
            captured_at,
        })
    }

    async fn release(&self, artifact: Artifact) -> Result<(), CaptureError> {
        let mut first_error = None;

        for path in artifact.files() {
            if let Err(e) = remove_if_exists(path).await {
                warn!(path = %path.display(), "Failed to remove capture file: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(CaptureError::Io(e)),
            None => {
                debug!(clip = %artifact.id, "Released capture files");
                Ok(())
            }
        }
    }

    async fn validate(&self) -> Result<(), CaptureError> {
        for (step, probe_arg) in [(CaptureStep::Record, "--help"), (CaptureStep::Package, "-version")] {
            let program = self.binary(step);
            let result = Command::new(program)
                .arg(probe_arg)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;

            if let Err(e) = result {
                if e.kind() == std::io::ErrorKind::NotFound {
                    return Err(CaptureError::BinaryNotFound {
                        step,
                        path: program.to_path_buf(),
                    });
                }
                return Err(CaptureError::Io(e));
            }
        }

        Ok(())
    }
}

async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn stderr_tail(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let skip = text.chars().count().saturating_sub(STDERR_TAIL_CHARS);
    Some(text.chars().skip(skip).collect())
}
