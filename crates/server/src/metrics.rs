//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the Smart OCR server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Task counts and worker usage (collected dynamically)
//! - All core metrics (admission, tasks, recognition)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

use smartocr_core::TaskStatus;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "smartocr_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("smartocr_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "smartocr_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Orchestrator Metrics (collected dynamically)
// =============================================================================

/// Orchestrator running state (1 = running, 0 = stopped).
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "smartocr_orchestrator_running",
        "Whether the orchestrator accepts submissions (1) or not (0)",
    )
    .unwrap()
});

/// Tracked tasks by current status.
pub static TASKS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("smartocr_tasks_by_status", "Tracked task count by status"),
        &["status"],
    )
    .unwrap()
});

/// Submissions waiting for an admission permit.
pub static ADMISSION_WAITING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "smartocr_admission_waiting",
        "Number of submissions waiting for an admission permit",
    )
    .unwrap()
});

/// Recognition workers currently busy.
pub static RECOGNITION_WORKERS_BUSY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "smartocr_recognition_workers_busy",
        "Number of blocking recognition workers currently running a call",
    )
    .unwrap()
});

/// Pages dispatched per device since startup.
pub static DEVICE_DISPATCHED: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "smartocr_device_dispatched_pages",
            "Pages dispatched to each device since startup",
        ),
        &["device"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let server_metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // HTTP
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        // Orchestrator
        Box::new(ORCHESTRATOR_RUNNING.clone()),
        Box::new(TASKS_BY_STATUS.clone()),
        Box::new(ADMISSION_WAITING.clone()),
        Box::new(RECOGNITION_WORKERS_BUSY.clone()),
        Box::new(DEVICE_DISPATCHED.clone()),
    ];

    // Core metrics (admission, tasks, recognition)
    let core_metrics = smartocr_core::metrics::all_metrics();

    for metric in server_metrics.into_iter().chain(core_metrics) {
        if let Err(e) = registry.register(metric) {
            warn!("Failed to register metric: {}", e);
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the orchestrator right now.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let orchestrator = state.orchestrator();
    let status = orchestrator.status();

    ORCHESTRATOR_RUNNING.set(if status.running { 1 } else { 0 });
    ADMISSION_WAITING.set(status.admission.waiting as i64);
    RECOGNITION_WORKERS_BUSY.set(status.busy_workers as i64);
    for device in &status.devices {
        DEVICE_DISPATCHED
            .with_label_values(&[&device.device_id.to_string()])
            .set(device.dispatched as i64);
    }

    if let Ok(stats) = orchestrator.get_statistics() {
        for (task_status, count) in [
            (TaskStatus::Pending, stats.pending),
            (TaskStatus::Processing, stats.processing),
            (TaskStatus::Completed, stats.completed),
            (TaskStatus::Failed, stats.failed),
        ] {
            TASKS_BY_STATUS
                .with_label_values(&[task_status.as_str()])
                .set(count as i64);
        }
    }
}

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_PATTERN.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}
