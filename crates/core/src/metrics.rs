//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator (polls, cooldowns, cycles, consecutive failures)
//! - Capture and delivery durations
//! - Notices and acknowledgments

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Orchestrator - Polling Metrics
// =============================================================================

/// Queue polls total by result.
pub static POLLS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("petcam_polls_total", "Total queue polls"),
        &["result"], // "empty", "triggers", "transient_error", "permanent_error"
    )
    .unwrap()
});

/// Triggers received from the queue.
pub static TRIGGERS_RECEIVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("petcam_triggers_received_total", "Total triggers received").unwrap()
});

/// Current consecutive poll failures.
pub static CONSECUTIVE_FAILURES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "petcam_consecutive_poll_failures",
        "Current number of consecutive poll failures",
    )
    .unwrap()
});

/// Cooldowns entered total.
pub static COOLDOWNS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("petcam_cooldowns_total", "Total cooldown sleeps entered").unwrap()
});

// =============================================================================
// Orchestrator - Cycle Metrics
// =============================================================================

/// Capture cycles total by outcome.
pub static CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("petcam_cycles_total", "Total capture cycles"),
        &["outcome"], // "completed", "abandoned", "failed"
    )
    .unwrap()
});

/// Capture duration in seconds.
pub static CAPTURE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("petcam_capture_duration_seconds", "Duration of clip capture")
            .buckets(vec![1.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Delivery duration in seconds.
pub static DELIVERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("petcam_delivery_duration_seconds", "Duration of clip upload")
            .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"],
    )
    .unwrap()
});

/// Acknowledgments total by result.
pub static ACKNOWLEDGMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("petcam_acknowledgments_total", "Total trigger acknowledgments"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Notices
// =============================================================================

/// Notices posted by kind and result.
pub static NOTICES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("petcam_notices_total", "Total notices posted"),
        &["kind", "result"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Polling
        Box::new(POLLS_TOTAL.clone()),
        Box::new(TRIGGERS_RECEIVED.clone()),
        Box::new(CONSECUTIVE_FAILURES.clone()),
        Box::new(COOLDOWNS_TOTAL.clone()),
        // Cycles
        Box::new(CYCLES_TOTAL.clone()),
        Box::new(CAPTURE_DURATION.clone()),
        Box::new(DELIVERY_DURATION.clone()),
        Box::new(ACKNOWLEDGMENTS_TOTAL.clone()),
        // Notices
        Box::new(NOTICES_TOTAL.clone()),
    ]
}
