//! Orchestrator lifecycle integration tests.
//!
//! These tests drive the polling orchestrator step by step against mock
//! collaborators: polling -> acting -> acknowledging -> cleanup -> polling,
//! plus the cooldown and fatal escalation paths.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

use petcam_core::{
    capture::CaptureStep,
    testing::{fixtures, Call, CallLog, MockCapturer, MockNotifier, MockWorkSource},
    CaptureError, Capturer, NoticeConfig, Notifier, NotifyError, OrchestratorConfig,
    OrchestratorError, PhaseKind, PollingOrchestrator, RetryPolicy, WorkSource, WorkSourceError,
};

/// Test helper wiring mocks into an orchestrator.
struct TestHarness {
    log: CallLog,
    source: Arc<MockWorkSource>,
    capturer: Arc<MockCapturer>,
    notifier: Arc<MockNotifier>,
    notices: NoticeConfig,
    _temp_dir: TempDir,
    config: OrchestratorConfig,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let log = CallLog::new();

        let config = OrchestratorConfig::default()
            .with_retry(RetryPolicy::new(3, 0))
            .with_output_dir(temp_dir.path());

        Self {
            source: Arc::new(MockWorkSource::new().with_call_log(log.clone())),
            capturer: Arc::new(MockCapturer::new().with_call_log(log.clone())),
            notifier: Arc::new(MockNotifier::new().with_call_log(log.clone())),
            notices: NoticeConfig::default(),
            log,
            _temp_dir: temp_dir,
            config,
        }
    }

    fn hardened() -> Self {
        let mut harness = Self::new();
        harness.config = harness.config.clone().hardened();
        harness
    }

    fn create_orchestrator(&self) -> PollingOrchestrator {
        PollingOrchestrator::new(
            self.config.clone(),
            self.notices.clone(),
            Arc::clone(&self.source) as Arc<dyn WorkSource>,
            Arc::clone(&self.capturer) as Arc<dyn Capturer>,
            Arc::clone(&self.notifier) as Arc<dyn Notifier>,
        )
    }

    /// Run `steps` steps, returning the phase after each one.
    async fn steps(&self, orchestrator: &mut PollingOrchestrator, steps: usize) -> Vec<PhaseKind> {
        let mut phases = Vec::with_capacity(steps);
        for _ in 0..steps {
            phases.push(assert_ok!(orchestrator.step().await));
        }
        phases
    }

    /// Number of attempted notices starting with the given template's prefix.
    async fn notices_like(&self, template: &str) -> usize {
        let prefix = template.split("{error}").next().unwrap_or(template);
        self.notifier
            .notices()
            .await
            .iter()
            .filter(|text| text.starts_with(prefix))
            .count()
    }

    async fn final_notices(&self) -> usize {
        self.notices_like(&self.notices.retries_exhausted).await
            + self.notices_like(&self.notices.fatal).await
    }
}

fn transient() -> WorkSourceError {
    WorkSourceError::transient("dispatch failure: connection reset by peer")
}

// =============================================================================
// Polling and escalation
// =============================================================================

#[tokio::test]
async fn test_empty_polls_keep_counter_at_zero_and_stay_quiet() {
    let harness = TestHarness::new();
    harness.source.push_empty(5).await;
    let mut orchestrator = harness.create_orchestrator();

    let phases = harness.steps(&mut orchestrator, 5).await;

    assert!(phases.iter().all(|p| *p == PhaseKind::Polling));
    assert_eq!(orchestrator.failure_count(), 0);
    assert_eq!(harness.source.poll_count().await, 5);
    assert!(harness.notifier.notices().await.is_empty());
    assert_eq!(harness.capturer.capture_count().await, 0);
}

#[tokio::test]
async fn test_failures_below_threshold_cool_down_and_resume() {
    let harness = TestHarness::new();
    harness.source.push_error(transient()).await;
    harness.source.push_error(transient()).await;
    let mut orchestrator = harness.create_orchestrator();

    let phases = harness.steps(&mut orchestrator, 4).await;

    assert_eq!(
        phases,
        vec![
            PhaseKind::Cooldown,
            PhaseKind::Polling,
            PhaseKind::Cooldown,
            PhaseKind::Polling
        ]
    );
    assert_eq!(orchestrator.failure_count(), 2);
    assert_eq!(harness.notices_like(&harness.notices.poll_failed).await, 2);
    assert_eq!(harness.notices_like(&harness.notices.pausing).await, 2);
    assert_eq!(harness.notices_like(&harness.notices.resuming).await, 2);
    assert_eq!(harness.final_notices().await, 0);
}

#[tokio::test]
async fn test_threshold_failures_are_fatal_with_one_final_notice() {
    let harness = TestHarness::new();
    for _ in 0..3 {
        harness.source.push_error(transient()).await;
    }
    let mut orchestrator = harness.create_orchestrator();

    harness.steps(&mut orchestrator, 4).await;
    let err = assert_err!(orchestrator.step().await);

    assert!(matches!(
        err,
        OrchestratorError::RetriesExhausted { failures: 3, .. }
    ));
    assert_eq!(orchestrator.phase(), PhaseKind::Failed);
    assert_eq!(harness.notices_like(&harness.notices.retries_exhausted).await, 1);
    assert_eq!(harness.final_notices().await, 1);
    // No pausing notice for the failure that gave up.
    assert_eq!(harness.notices_like(&harness.notices.pausing).await, 2);

    assert!(matches!(
        orchestrator.step().await,
        Err(OrchestratorError::Terminated)
    ));
    assert_eq!(harness.final_notices().await, 1);
}

#[tokio::test]
async fn test_single_failure_threshold() {
    let mut harness = TestHarness::new();
    harness.config.retry = RetryPolicy::new(1, 0);
    harness.source.push_error(transient()).await;
    let mut orchestrator = harness.create_orchestrator();

    let err = assert_err!(orchestrator.step().await);
    assert!(matches!(
        err,
        OrchestratorError::RetriesExhausted { failures: 1, .. }
    ));
    assert_eq!(harness.final_notices().await, 1);
}

#[tokio::test]
async fn test_successful_poll_resets_counter() {
    let harness = TestHarness::new();
    harness.source.push_error(transient()).await;
    harness.source.push_error(transient()).await;
    harness.source.push_batch(fixtures::batch(1)).await;
    let mut orchestrator = harness.create_orchestrator();

    harness.steps(&mut orchestrator, 4).await;
    assert_eq!(orchestrator.failure_count(), 2);

    assert_eq!(assert_ok!(orchestrator.step().await), PhaseKind::Acting);
    assert_eq!(orchestrator.failure_count(), 0);
}

#[tokio::test]
async fn test_empty_poll_also_resets_counter() {
    let harness = TestHarness::new();
    harness.source.push_error(transient()).await;
    harness.source.push_empty(1).await;
    harness.source.push_error(transient()).await;
    harness.source.push_error(transient()).await;
    let mut orchestrator = harness.create_orchestrator();

    // error, cooldown, empty, error, cooldown, error, cooldown
    let phases = harness.steps(&mut orchestrator, 7).await;

    assert_eq!(phases.last(), Some(&PhaseKind::Polling));
    assert_eq!(orchestrator.failure_count(), 2);
}

#[tokio::test]
async fn test_notice_failures_do_not_change_escalation() {
    let harness = TestHarness::new();
    harness.notifier.set_fail_notices(true).await;
    harness.source.push_error(transient()).await;
    let mut orchestrator = harness.create_orchestrator();

    let phases = harness.steps(&mut orchestrator, 2).await;

    assert_eq!(phases, vec![PhaseKind::Cooldown, PhaseKind::Polling]);
    assert_eq!(orchestrator.failure_count(), 1);
}

#[tokio::test]
async fn test_permanent_poll_error_is_immediately_fatal() {
    let harness = TestHarness::new();
    harness
        .source
        .push_error(WorkSourceError::permanent(
            "AWS.SimpleQueueService.NonExistentQueue",
        ))
        .await;
    let mut orchestrator = harness.create_orchestrator();

    let err = assert_err!(orchestrator.step().await);

    assert!(matches!(err, OrchestratorError::Poll(_)));
    assert_eq!(harness.notifier.notices().await.len(), 1);
    assert_eq!(harness.notices_like(&harness.notices.fatal).await, 1);
}

// =============================================================================
// Capture cycles
// =============================================================================

#[tokio::test]
async fn test_batch_of_three_runs_full_cycle() {
    let harness = TestHarness::new();
    harness.source.push_batch(fixtures::batch(3)).await;
    let mut orchestrator = harness.create_orchestrator();

    let phases = harness.steps(&mut orchestrator, 5).await;

    assert_eq!(
        phases,
        vec![
            PhaseKind::Acting,
            PhaseKind::Acknowledging,
            PhaseKind::Cleanup,
            PhaseKind::Polling,
            PhaseKind::Polling,
        ]
    );

    let mut acked = harness.source.acknowledged().await;
    acked.sort();
    assert_eq!(acked, vec!["t-1", "t-2", "t-3"]);
    assert_eq!(harness.capturer.released().await.len(), 1);
    assert_eq!(harness.notifier.delivered().await.len(), 1);
    assert_eq!(harness.notices_like(&harness.notices.starting).await, 1);

    let calls = harness.log.calls().await;
    let delivered = calls
        .iter()
        .position(|c| matches!(c, Call::DeliverArtifact(_)))
        .unwrap();
    let first_ack = calls
        .iter()
        .position(|c| matches!(c, Call::Acknowledge(_)))
        .unwrap();
    let released = calls
        .iter()
        .position(|c| matches!(c, Call::Release(_)))
        .unwrap();
    let last_poll = calls.iter().rposition(|c| *c == Call::Poll).unwrap();

    assert!(delivered < first_ack);
    assert!(first_ack < released);
    assert!(released < last_poll);
    assert_eq!(harness.log.count(|c| matches!(c, Call::Acknowledge(_))).await, 3);
}

#[tokio::test]
async fn test_no_action_until_first_non_empty_batch() {
    let harness = TestHarness::new();
    harness.source.push_empty(5).await;
    harness.source.push_batch(fixtures::batch(1)).await;
    let mut orchestrator = harness.create_orchestrator();

    harness.steps(&mut orchestrator, 5).await;
    assert_eq!(harness.capturer.capture_count().await, 0);

    let phases = harness.steps(&mut orchestrator, 4).await;
    assert_eq!(phases[0], PhaseKind::Acting);
    assert_eq!(phases[3], PhaseKind::Polling);
    assert_eq!(harness.source.poll_count().await, 6);
    assert_eq!(harness.capturer.capture_count().await, 1);
    assert_eq!(harness.source.acknowledged().await, vec!["t-1"]);
}

#[tokio::test]
async fn test_status_reflects_progress() {
    let harness = TestHarness::new();
    harness.source.push_error(transient()).await;
    harness.source.push_batch(fixtures::batch(2)).await;
    let mut orchestrator = harness.create_orchestrator();
    let status = orchestrator.status_handle();

    orchestrator.step().await.unwrap();
    {
        let snapshot = status.read().await;
        assert_eq!(snapshot.phase, PhaseKind::Cooldown);
        assert_eq!(snapshot.consecutive_failures, 1);
        assert_eq!(snapshot.max_consecutive_failures, 3);
        assert!(snapshot.last_error.is_some());
    }

    harness.steps(&mut orchestrator, 5).await;
    let snapshot = status.read().await;
    assert_eq!(snapshot.phase, PhaseKind::Polling);
    assert_eq!(snapshot.consecutive_failures, 0);
    assert_eq!(snapshot.cycles_completed, 1);
    assert_eq!(snapshot.triggers_acknowledged, 2);
    assert!(snapshot.last_cycle_at.is_some());
}

#[tokio::test]
async fn test_quiet_notices_skip_optional_notices() {
    let mut harness = TestHarness::new();
    harness.notices = NoticeConfig::quiet();
    harness.source.push_error(transient()).await;
    harness.source.push_batch(fixtures::batch(1)).await;
    let mut orchestrator = harness.create_orchestrator();

    harness.steps(&mut orchestrator, 6).await;

    // Only the failure notice remains.
    assert_eq!(
        harness.notifier.notices().await,
        vec![harness.notices.poll_failed(&transient().to_string())]
    );
    assert_eq!(harness.source.acknowledged().await.len(), 1);
}

#[tokio::test]
async fn test_release_failure_is_not_fatal() {
    let harness = TestHarness::new();
    harness.source.push_batch(fixtures::batch(1)).await;
    harness
        .capturer
        .set_next_release_error(CaptureError::Io(std::io::Error::other("read-only fs")))
        .await;
    let mut orchestrator = harness.create_orchestrator();

    let phases = harness.steps(&mut orchestrator, 4).await;

    assert_eq!(phases[3], PhaseKind::Polling);
    assert_eq!(harness.capturer.released().await.len(), 1);
}

// =============================================================================
// Action failures: reference behavior
// =============================================================================

#[tokio::test]
async fn test_delivery_failure_is_fatal_without_ack_but_releases() {
    let harness = TestHarness::new();
    harness.source.push_batch(fixtures::batch(2)).await;
    harness
        .notifier
        .set_next_artifact_error(NotifyError::api("files.completeUploadExternal", "not_in_channel"))
        .await;
    let mut orchestrator = harness.create_orchestrator();

    let phases = harness.steps(&mut orchestrator, 2).await;
    assert_eq!(phases, vec![PhaseKind::Acting, PhaseKind::Acknowledging]);

    // Delivery fails here; the decision waits until the clip is released.
    assert_eq!(assert_ok!(orchestrator.step().await), PhaseKind::Cleanup);
    assert!(harness.capturer.released().await.is_empty());

    let err = assert_err!(orchestrator.step().await);
    assert!(matches!(err, OrchestratorError::Delivery(_)));
    assert!(harness.source.acknowledged().await.is_empty());
    assert_eq!(harness.log.count(|c| matches!(c, Call::Acknowledge(_))).await, 0);
    assert_eq!(harness.capturer.released().await.len(), 1);
    assert_eq!(harness.final_notices().await, 1);

    let release = harness.log.position(|c| matches!(c, Call::Release(_))).await;
    let last_notice = harness
        .log
        .calls()
        .await
        .iter()
        .rposition(|c| matches!(c, Call::DeliverNotice(_)));
    assert!(release < last_notice);
}

#[tokio::test]
async fn test_capture_failure_is_fatal_without_delivery() {
    let harness = TestHarness::new();
    harness.source.push_batch(fixtures::batch(1)).await;
    harness
        .capturer
        .set_next_error(CaptureError::step_failed(
            CaptureStep::Record,
            "exited with code: Some(70)",
            Some("mmal: Camera is not detected".to_string()),
        ))
        .await;
    let mut orchestrator = harness.create_orchestrator();

    orchestrator.step().await.unwrap();
    let err = assert_err!(orchestrator.step().await);

    assert!(matches!(err, OrchestratorError::Capture(_)));
    assert_eq!(harness.log.count(|c| matches!(c, Call::DeliverArtifact(_))).await, 0);
    assert!(harness.source.acknowledged().await.is_empty());
    assert_eq!(harness.final_notices().await, 1);
}

#[tokio::test]
async fn test_ack_failure_is_fatal_after_release() {
    let harness = TestHarness::new();
    harness.source.push_batch(fixtures::batch(3)).await;
    harness
        .source
        .set_ack_error("t-2", WorkSourceError::acknowledge_failed("t-2", "ReceiptHandleIsInvalid"))
        .await;
    let mut orchestrator = harness.create_orchestrator();

    harness.steps(&mut orchestrator, 3).await;
    let err = assert_err!(orchestrator.step().await);

    assert!(matches!(
        err,
        OrchestratorError::Acknowledge {
            failed: 1,
            total: 3,
            ..
        }
    ));
    assert_eq!(harness.capturer.released().await.len(), 1);
    assert_eq!(harness.final_notices().await, 1);
}

#[tokio::test]
async fn test_start_notice_failure_is_fatal_before_capture() {
    let harness = TestHarness::new();
    harness.source.push_batch(fixtures::batch(1)).await;
    harness
        .notifier
        .set_next_notice_error(NotifyError::api("chat.postMessage", "invalid_auth"))
        .await;
    let mut orchestrator = harness.create_orchestrator();

    orchestrator.step().await.unwrap();
    let err = assert_err!(orchestrator.step().await);

    assert!(matches!(err, OrchestratorError::StartNotice(_)));
    assert_eq!(harness.capturer.capture_count().await, 0);
    assert_eq!(harness.final_notices().await, 1);
}

// =============================================================================
// Action failures: hardened behavior
// =============================================================================

#[tokio::test]
async fn test_hardened_delivery_failure_abandons_batch() {
    let harness = TestHarness::hardened();
    harness.source.push_batch(fixtures::batch(2)).await;
    harness
        .notifier
        .set_next_artifact_error(NotifyError::Status {
            method: "file upload".to_string(),
            status: 502,
            body: "bad gateway".to_string(),
        })
        .await;
    let mut orchestrator = harness.create_orchestrator();
    let status = orchestrator.status_handle();

    let phases = harness.steps(&mut orchestrator, 5).await;

    assert_eq!(phases[3], PhaseKind::Polling);
    assert_eq!(phases[4], PhaseKind::Polling);
    assert!(harness.source.acknowledged().await.is_empty());
    assert_eq!(harness.capturer.released().await.len(), 1);
    assert_eq!(harness.notices_like(&harness.notices.cycle_failed).await, 1);
    assert_eq!(harness.final_notices().await, 0);

    let snapshot = status.read().await;
    assert_eq!(snapshot.cycles_abandoned, 1);
    assert_eq!(snapshot.cycles_completed, 0);
}

#[tokio::test]
async fn test_hardened_capture_failure_keeps_polling() {
    let harness = TestHarness::hardened();
    harness.source.push_batch(fixtures::batch(1)).await;
    harness.source.push_batch(fixtures::batch(1)).await;
    harness
        .capturer
        .set_next_error(CaptureError::Timeout {
            step: CaptureStep::Package,
            timeout_secs: 40,
        })
        .await;
    let mut orchestrator = harness.create_orchestrator();

    let phases = harness.steps(&mut orchestrator, 6).await;

    assert_eq!(
        phases,
        vec![
            PhaseKind::Acting,
            PhaseKind::Polling,
            PhaseKind::Acting,
            PhaseKind::Acknowledging,
            PhaseKind::Cleanup,
            PhaseKind::Polling,
        ]
    );
    // Only the second batch was acknowledged.
    assert_eq!(harness.source.acknowledged().await, vec!["t-1"]);
    assert_eq!(harness.capturer.capture_count().await, 2);
    assert_eq!(harness.capturer.released().await.len(), 1);
}

#[tokio::test]
async fn test_hardened_ack_failure_continues() {
    let harness = TestHarness::hardened();
    harness.source.push_batch(fixtures::batch(3)).await;
    harness
        .source
        .set_ack_error("t-2", WorkSourceError::acknowledge_failed("t-2", "ReceiptHandleIsInvalid"))
        .await;
    let mut orchestrator = harness.create_orchestrator();
    let status = orchestrator.status_handle();

    let phases = harness.steps(&mut orchestrator, 4).await;

    assert_eq!(phases[3], PhaseKind::Polling);
    let mut acked = harness.source.acknowledged().await;
    acked.sort();
    assert_eq!(acked, vec!["t-1", "t-3"]);
    assert_eq!(status.read().await.cycles_completed, 1);
    assert_eq!(harness.final_notices().await, 0);
}

#[tokio::test]
async fn test_hardened_start_notice_failure_still_captures() {
    let harness = TestHarness::hardened();
    harness.source.push_batch(fixtures::batch(1)).await;
    harness
        .notifier
        .set_next_notice_error(NotifyError::api("chat.postMessage", "ratelimited"))
        .await;
    let mut orchestrator = harness.create_orchestrator();

    let phases = harness.steps(&mut orchestrator, 4).await;

    assert_eq!(phases[1], PhaseKind::Acknowledging);
    assert_eq!(harness.source.acknowledged().await, vec!["t-1"]);
}

#[tokio::test]
async fn test_hardened_mode_still_escalates_poll_failures() {
    let harness = TestHarness::hardened();
    for _ in 0..3 {
        harness.source.push_error(transient()).await;
    }
    let mut orchestrator = harness.create_orchestrator();

    harness.steps(&mut orchestrator, 4).await;
    assert!(matches!(
        orchestrator.step().await,
        Err(OrchestratorError::RetriesExhausted { .. })
    ));
}

// =============================================================================
// Run loop and shutdown
// =============================================================================

#[tokio::test]
async fn test_shutdown_interrupts_cooldown() {
    let mut harness = TestHarness::new();
    harness.config.retry = RetryPolicy::new(3, 3600);
    harness.source.push_error(transient()).await;
    let mut orchestrator = harness.create_orchestrator();
    let shutdown = orchestrator.shutdown_handle();

    assert_eq!(assert_ok!(orchestrator.step().await), PhaseKind::Cooldown);
    shutdown.shutdown();

    let phase = tokio::time::timeout(Duration::from_secs(1), orchestrator.step())
        .await
        .expect("cooldown was not interrupted");
    assert_eq!(assert_ok!(phase), PhaseKind::Stopped);
    assert_eq!(harness.notices_like(&harness.notices.resuming).await, 0);
}

#[tokio::test]
async fn test_shutdown_interrupts_long_poll() {
    let mut harness = TestHarness::new();
    harness.source = Arc::new(
        MockWorkSource::new()
            .with_call_log(harness.log.clone())
            .with_idle_wait(Duration::from_secs(3600)),
    );
    let mut orchestrator = harness.create_orchestrator();
    let shutdown = orchestrator.shutdown_handle();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.shutdown();
    });

    let phase = tokio::time::timeout(Duration::from_secs(2), orchestrator.step())
        .await
        .expect("long poll was not interrupted");
    assert_eq!(assert_ok!(phase), PhaseKind::Stopped);
    assert_eq!(harness.source.poll_count().await, 1);
    assert_eq!(orchestrator.failure_count(), 0);
    assert!(harness.notifier.notices().await.is_empty());
}

#[tokio::test]
async fn test_shutdown_lets_running_cycle_finish() {
    let harness = TestHarness::new();
    harness.source.push_batch(fixtures::batch(1)).await;
    let mut orchestrator = harness.create_orchestrator();
    let shutdown = orchestrator.shutdown_handle();

    assert_eq!(assert_ok!(orchestrator.step().await), PhaseKind::Acting);
    shutdown.shutdown();

    let phases = harness.steps(&mut orchestrator, 4).await;
    assert_eq!(
        phases,
        vec![
            PhaseKind::Acknowledging,
            PhaseKind::Cleanup,
            PhaseKind::Polling,
            PhaseKind::Stopped
        ]
    );
    assert_eq!(harness.source.acknowledged().await, vec!["t-1"]);
    assert_eq!(harness.source.poll_count().await, 1);
}

#[tokio::test]
async fn test_run_until_shutdown() {
    let harness = TestHarness::new();
    harness.source.push_batch(fixtures::batch(2)).await;
    let mut orchestrator = harness.create_orchestrator();
    let shutdown = orchestrator.shutdown_handle();

    let handle = tokio::spawn(async move { orchestrator.run().await });

    let start = std::time::Instant::now();
    while harness.source.acknowledged().await.len() < 2 {
        assert!(start.elapsed() < Duration::from_secs(5), "cycle did not complete");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    shutdown.shutdown();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("run did not stop")
        .expect("run task panicked");
    assert_ok!(result);
}

#[tokio::test]
async fn test_run_returns_fatal_error() {
    let harness = TestHarness::new();
    for _ in 0..3 {
        harness.source.push_error(transient()).await;
    }
    let mut orchestrator = harness.create_orchestrator();

    let result = tokio::time::timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("run did not finish");

    assert!(matches!(
        result,
        Err(OrchestratorError::RetriesExhausted { failures: 3, .. })
    ));
    assert_eq!(harness.final_notices().await, 1);
}
