//! Polling orchestrator implementation.
//!
//! Drives one capture cycle at a time:
//! - Polling: long-poll the work source for triggers
//! - Acting: post the starting notice, record and package a clip
//! - Acknowledging: deliver the clip, then acknowledge every trigger of the batch
//! - Cleanup: release the clip files, then apply any pending failure decision
//!
//! Poll failures go through Cooldown until the retry policy gives up.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::capture::{Artifact, Capturer, CaptureError, OutputPaths};
use crate::metrics;
use crate::notify::{NoticeConfig, Notifier, NotifyError};
use crate::queue::{Batch, WorkSource, WorkSourceError};

use super::config::{FailureMode, OrchestratorConfig};
use super::types::{FailureCounter, OrchestratorError, OrchestratorStatus, PhaseKind};

/// Phase plus the data it owns.
#[derive(Debug)]
enum Phase {
    Polling,
    Cooldown,
    Acting(Batch),
    Acknowledging { batch: Batch, artifact: Artifact },
    Cleanup {
        artifact: Artifact,
        fault: Option<Fault>,
    },
    Stopped,
    Failed,
}

impl Phase {
    fn kind(&self) -> PhaseKind {
        match self {
            Phase::Polling => PhaseKind::Polling,
            Phase::Cooldown => PhaseKind::Cooldown,
            Phase::Acting(_) => PhaseKind::Acting,
            Phase::Acknowledging { .. } => PhaseKind::Acknowledging,
            Phase::Cleanup { .. } => PhaseKind::Cleanup,
            Phase::Stopped => PhaseKind::Stopped,
            Phase::Failed => PhaseKind::Failed,
        }
    }
}

/// A failed step, before the policy has decided what it means.
#[derive(Debug)]
enum Fault {
    Poll(WorkSourceError),
    StartNotice(NotifyError),
    Capture(CaptureError),
    Delivery(NotifyError),
    Acknowledge {
        failed: usize,
        total: usize,
        first: WorkSourceError,
    },
}

/// Outcome of a non-fatal fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    /// Carry on with the current cycle.
    Proceed,
    /// Sleep, then poll again.
    Cooldown,
    /// Drop the batch unacknowledged and poll again.
    Abandon,
}

/// Requests a graceful stop. Honored while polling or cooling down; a cycle
/// already in progress runs to completion first.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: broadcast::Sender<()>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }
}

/// The polling orchestrator - turns queue triggers into delivered clips.
pub struct PollingOrchestrator {
    config: OrchestratorConfig,
    notices: NoticeConfig,
    work_source: Arc<dyn WorkSource>,
    capturer: Arc<dyn Capturer>,
    notifier: Arc<dyn Notifier>,

    // Runtime state
    phase: Phase,
    failures: FailureCounter,
    stats: OrchestratorStatus,
    status: Arc<RwLock<OrchestratorStatus>>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl PollingOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        notices: NoticeConfig,
        work_source: Arc<dyn WorkSource>,
        capturer: Arc<dyn Capturer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let stats = OrchestratorStatus {
            max_consecutive_failures: config.retry.max_consecutive_failures,
            ..Default::default()
        };

        Self {
            config,
            notices,
            work_source,
            capturer,
            notifier,
            phase: Phase::Polling,
            failures: FailureCounter::new(),
            status: Arc::new(RwLock::new(stats.clone())),
            stats,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Handle for requesting a graceful stop from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Read-only status snapshot, refreshed after every step.
    pub fn status_handle(&self) -> Arc<RwLock<OrchestratorStatus>> {
        Arc::clone(&self.status)
    }

    /// Phase the next step will run.
    pub fn phase(&self) -> PhaseKind {
        self.phase.kind()
    }

    /// Current consecutive poll failures.
    pub fn failure_count(&self) -> u32 {
        self.failures.count()
    }

    /// Run until shutdown (`Ok`) or a fatal error (`Err`).
    pub async fn run(&mut self) -> Result<(), OrchestratorError> {
        info!(
            work_source = self.work_source.name(),
            capturer = self.capturer.name(),
            notifier = self.notifier.name(),
            max_consecutive_failures = self.config.retry.max_consecutive_failures,
            cooldown_secs = self.config.retry.cooldown_secs,
            "Starting polling orchestrator"
        );
        self.stats.started_at = Some(Utc::now());

        loop {
            if self.step().await? == PhaseKind::Stopped {
                info!("Polling orchestrator stopped");
                return Ok(());
            }
        }
    }

    /// Run the current phase once and return the next one.
    pub async fn step(&mut self) -> Result<PhaseKind, OrchestratorError> {
        let phase = std::mem::replace(&mut self.phase, Phase::Polling);

        let next = match phase {
            Phase::Polling => self.poll().await,
            Phase::Cooldown => self.cool_down().await,
            Phase::Acting(batch) => self.act(batch).await,
            Phase::Acknowledging { batch, artifact } => self.deliver(batch, artifact).await,
            Phase::Cleanup { artifact, fault } => self.clean_up(artifact, fault).await,
            Phase::Stopped => Ok(Phase::Stopped),
            Phase::Failed => {
                self.phase = Phase::Failed;
                return Err(OrchestratorError::Terminated);
            }
        };

        match next {
            Ok(phase) => {
                self.phase = phase;
                self.publish().await;
                Ok(self.phase.kind())
            }
            Err(e) => {
                self.phase = Phase::Failed;
                self.stats.last_error = Some(e.to_string());
                self.publish().await;
                Err(e)
            }
        }
    }

    async fn poll(&mut self) -> Result<Phase, OrchestratorError> {
        let result = tokio::select! {
            biased;
            _ = self.shutdown_rx.recv() => {
                info!("Shutdown requested while polling");
                return Ok(Phase::Stopped);
            }
            result = self.work_source.poll() => result,
        };
        self.stats.last_poll_at = Some(Utc::now());

        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                let label = if e.is_transient() {
                    "transient_error"
                } else {
                    "permanent_error"
                };
                metrics::POLLS_TOTAL.with_label_values(&[label]).inc();
                return match self.escalate(Fault::Poll(e)).await? {
                    Decision::Cooldown => Ok(Phase::Cooldown),
                    _ => Ok(Phase::Polling),
                };
            }
        };

        if self.failures.count() > 0 {
            info!(
                failures = self.failures.count(),
                "Queue poll recovered"
            );
        }
        self.failures.record_success();
        metrics::CONSECUTIVE_FAILURES.set(0);

        if batch.is_empty() {
            metrics::POLLS_TOTAL.with_label_values(&["empty"]).inc();
            debug!("No pending triggers");
            return Ok(Phase::Polling);
        }

        metrics::POLLS_TOTAL.with_label_values(&["triggers"]).inc();
        metrics::TRIGGERS_RECEIVED.inc_by(batch.len() as u64);
        info!(count = batch.len(), ids = ?batch.ids(), "Received triggers");

        Ok(Phase::Acting(batch))
    }

    async fn cool_down(&mut self) -> Result<Phase, OrchestratorError> {
        let cooldown = self.config.retry.cooldown();
        metrics::COOLDOWNS_TOTAL.inc();
        info!(
            cooldown_secs = cooldown.as_secs(),
            failures = self.failures.count(),
            "Cooling down before next poll"
        );

        tokio::select! {
            biased;
            _ = self.shutdown_rx.recv() => {
                info!("Shutdown requested during cooldown");
                return Ok(Phase::Stopped);
            }
            _ = tokio::time::sleep(cooldown) => {}
        }

        if self.notices.announce_pauses {
            let text = self.notices.resuming.clone();
            self.notify_best_effort("resuming", &text).await;
        }

        Ok(Phase::Polling)
    }

    async fn act(&mut self, batch: Batch) -> Result<Phase, OrchestratorError> {
        if self.notices.announce_cycles {
            let result = self.notifier.deliver_notice(&self.notices.starting).await;
            match result {
                Ok(()) => {
                    metrics::NOTICES_TOTAL
                        .with_label_values(&["starting", "success"])
                        .inc();
                }
                Err(e) => {
                    metrics::NOTICES_TOTAL
                        .with_label_values(&["starting", "failed"])
                        .inc();
                    self.escalate(Fault::StartNotice(e)).await?;
                }
            }
        }

        let output = OutputPaths::new(&self.config.output_dir, clip_stem());
        let duration = self.config.clip_duration();
        let start = Instant::now();

        info!(
            clip = %output.file_stem,
            duration_secs = duration.as_secs(),
            triggers = batch.len(),
            "Capturing clip"
        );

        let result = self.capturer.capture(duration, &output).await;
        match result {
            Ok(artifact) => {
                metrics::CAPTURE_DURATION
                    .with_label_values(&["success"])
                    .observe(start.elapsed().as_secs_f64());
                Ok(Phase::Acknowledging { batch, artifact })
            }
            Err(e) => {
                metrics::CAPTURE_DURATION
                    .with_label_values(&["failed"])
                    .observe(start.elapsed().as_secs_f64());
                self.escalate(Fault::Capture(e)).await?;
                Ok(Phase::Polling)
            }
        }
    }

    async fn deliver(&mut self, batch: Batch, artifact: Artifact) -> Result<Phase, OrchestratorError> {
        let start = Instant::now();

        let result = self.notifier.deliver_artifact(&artifact).await;
        let fault = match result {
            Ok(()) => {
                metrics::DELIVERY_DURATION
                    .with_label_values(&["success"])
                    .observe(start.elapsed().as_secs_f64());
                info!(
                    clip = %artifact.id,
                    size_bytes = artifact.size_bytes,
                    "Clip delivered"
                );
                self.acknowledge_all(&batch).await
            }
            Err(e) => {
                metrics::DELIVERY_DURATION
                    .with_label_values(&["failed"])
                    .observe(start.elapsed().as_secs_f64());
                Some(Fault::Delivery(e))
            }
        };

        Ok(Phase::Cleanup { artifact, fault })
    }

    /// Acknowledges every trigger of the batch concurrently.
    async fn acknowledge_all(&mut self, batch: &Batch) -> Option<Fault> {
        let results = join_all(batch.iter().map(|t| self.work_source.acknowledge(t))).await;

        let total = results.len();
        let mut failed = 0;
        let mut first = None;
        for result in results {
            match result {
                Ok(()) => {
                    metrics::ACKNOWLEDGMENTS_TOTAL
                        .with_label_values(&["success"])
                        .inc();
                    self.stats.triggers_acknowledged += 1;
                }
                Err(e) => {
                    metrics::ACKNOWLEDGMENTS_TOTAL
                        .with_label_values(&["failed"])
                        .inc();
                    warn!(error = %e, "Trigger acknowledgment failed");
                    failed += 1;
                    first.get_or_insert(e);
                }
            }
        }

        debug!(total, failed, "Acknowledged batch");
        first.map(|first| Fault::Acknowledge {
            failed,
            total,
            first,
        })
    }

    async fn clean_up(
        &mut self,
        artifact: Artifact,
        fault: Option<Fault>,
    ) -> Result<Phase, OrchestratorError> {
        let clip = artifact.id.clone();
        if let Err(e) = self.capturer.release(artifact).await {
            warn!(clip = %clip, "Failed to release capture files: {}", e);
        }

        if let Some(fault) = fault {
            if self.escalate(fault).await? == Decision::Abandon {
                return Ok(Phase::Polling);
            }
        }

        self.stats.cycles_completed += 1;
        self.stats.last_cycle_at = Some(Utc::now());
        metrics::CYCLES_TOTAL.with_label_values(&["completed"]).inc();
        info!(clip = %clip, "Cycle complete");

        Ok(Phase::Polling)
    }

    /// Single decision point for every failure: returns how to go on, or the
    /// fatal error after the final notice has been attempted.
    async fn escalate(&mut self, fault: Fault) -> Result<Decision, OrchestratorError> {
        match fault {
            Fault::Poll(e) if e.is_transient() => {
                let failures = self.failures.record_failure();
                let max = self.config.retry.max_consecutive_failures;
                metrics::CONSECUTIVE_FAILURES.set(i64::from(failures));
                warn!(failures, max, error = %e, "Queue poll failed");
                self.stats.last_error = Some(e.to_string());

                let text = self.notices.poll_failed(&e.to_string());
                self.notify_best_effort("poll_failed", &text).await;

                if self.failures.reached(max) {
                    return Err(self
                        .terminate(OrchestratorError::RetriesExhausted {
                            failures,
                            last_error: e,
                        })
                        .await);
                }

                if self.notices.announce_pauses {
                    let text = self.notices.pausing.clone();
                    self.notify_best_effort("pausing", &text).await;
                }
                Ok(Decision::Cooldown)
            }
            Fault::Poll(e) => Err(self.terminate(OrchestratorError::Poll(e)).await),
            Fault::StartNotice(e) => match self.config.on_start_notice_error {
                FailureMode::Continue => {
                    warn!(error = %e, "Starting notice failed, capturing anyway");
                    Ok(Decision::Proceed)
                }
                FailureMode::Terminate => {
                    self.cycle_failed();
                    Err(self.terminate(OrchestratorError::StartNotice(e)).await)
                }
            },
            Fault::Capture(e) => self.action_failed(OrchestratorError::Capture(e)).await,
            Fault::Delivery(e) => self.action_failed(OrchestratorError::Delivery(e)).await,
            Fault::Acknowledge {
                failed,
                total,
                first,
            } => {
                let err = OrchestratorError::Acknowledge {
                    failed,
                    total,
                    first,
                };
                match self.config.on_ack_error {
                    FailureMode::Continue => {
                        warn!(error = %err, "Continuing after acknowledgment failure");
                        self.stats.last_error = Some(err.to_string());
                        Ok(Decision::Proceed)
                    }
                    FailureMode::Terminate => {
                        self.cycle_failed();
                        Err(self.terminate(err).await)
                    }
                }
            }
        }
    }

    async fn action_failed(&mut self, err: OrchestratorError) -> Result<Decision, OrchestratorError> {
        match self.config.on_action_error {
            FailureMode::Continue => {
                error!(error = %err, "Abandoning batch without acknowledgment");
                self.stats.cycles_abandoned += 1;
                self.stats.last_error = Some(err.to_string());
                metrics::CYCLES_TOTAL.with_label_values(&["abandoned"]).inc();

                let text = self.notices.cycle_failed(&err.to_string());
                self.notify_best_effort("cycle_failed", &text).await;
                Ok(Decision::Abandon)
            }
            FailureMode::Terminate => {
                self.cycle_failed();
                Err(self.terminate(err).await)
            }
        }
    }

    fn cycle_failed(&self) {
        metrics::CYCLES_TOTAL.with_label_values(&["failed"]).inc();
    }

    /// Attempts the one final notice for a fatal error and hands the error back.
    async fn terminate(&mut self, err: OrchestratorError) -> OrchestratorError {
        error!(kind = err.kind(), error = %err, "Stopping on fatal error");

        let text = match &err {
            OrchestratorError::RetriesExhausted { last_error, .. } => {
                self.notices.retries_exhausted(&last_error.to_string())
            }
            other => self.notices.fatal(&other.to_string()),
        };
        self.notify_best_effort("final", &text).await;

        err
    }

    /// Posts a notice; failures are logged and counted, never propagated.
    async fn notify_best_effort(&self, kind: &str, text: &str) -> bool {
        match self.notifier.deliver_notice(text).await {
            Ok(()) => {
                metrics::NOTICES_TOTAL
                    .with_label_values(&[kind, "success"])
                    .inc();
                true
            }
            Err(e) => {
                metrics::NOTICES_TOTAL
                    .with_label_values(&[kind, "failed"])
                    .inc();
                warn!(kind, error = %e, "Failed to post notice");
                false
            }
        }
    }

    async fn publish(&mut self) {
        self.stats.phase = self.phase.kind();
        self.stats.consecutive_failures = self.failures.count();
        *self.status.write().await = self.stats.clone();
    }
}

/// Unique per-cycle file stem, e.g. `clip-20261019-101500-3f2a9c1b`.
fn clip_stem() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("clip-{}-{}", Utc::now().format("%Y%m%d-%H%M%S"), &id[..8])
}
