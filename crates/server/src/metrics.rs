//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric definitions (counters, histograms)
//! - Helper functions for recording session lifecycle metrics
//!
//! The helpers are safe to call before [`init_metrics`]; without a recorder
//! they are no-ops.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Returns `true` if this call installed the recorder, `false` if it was
/// already initialized. Concurrent callers wait for the first one.
pub fn init_metrics() -> bool {
    let mut installed = false;
    PROMETHEUS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Failed to set global metrics recorder (already set)");
        } else {
            describe_metrics();
            tracing::info!("Prometheus metrics initialized");
            installed = true;
        }
        handle
    });
    installed
}

fn describe_metrics() {
    describe_counter!(
        "runwatch_sessions_started_total",
        "Total number of sessions whose execution was started"
    );
    describe_counter!(
        "runwatch_sessions_finished_total",
        "Total number of sessions that reached a terminal status"
    );
    describe_counter!(
        "runwatch_output_lines_total",
        "Total number of non-blank runner output lines processed"
    );
    describe_histogram!(
        "runwatch_run_duration_seconds",
        "Wall-clock duration of finished runs in seconds"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

pub fn record_session_started() {
    counter!("runwatch_sessions_started_total").increment(1);
}

/// Record a session reaching `status` after `duration_seconds`.
pub fn record_session_finished(status: &str, duration_seconds: f64) {
    counter!("runwatch_sessions_finished_total", "status" => status.to_string()).increment(1);
    histogram!("runwatch_run_duration_seconds", "status" => status.to_string())
        .record(duration_seconds);
}

pub fn record_line_processed() {
    counter!("runwatch_output_lines_total").increment(1);
}
