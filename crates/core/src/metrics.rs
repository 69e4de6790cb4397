//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Admission (wait time, rejections, in-flight tasks)
//! - Task outcomes
//! - Recognition calls (duration, discarded late results)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Admission Metrics
// =============================================================================

/// Time spent waiting for an admission permit.
pub static ADMISSION_WAIT: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "smartocr_admission_wait_seconds",
            "Time spent waiting for an admission permit",
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]),
    )
    .unwrap()
});

/// Admission rejections by reason.
pub static ADMISSION_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "smartocr_admission_rejections_total",
            "Total submissions that could not obtain a permit",
        ),
        &["reason"], // "timeout", "queue_full", "closed"
    )
    .unwrap()
});

/// Tasks currently holding a permit.
pub static TASKS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "smartocr_tasks_in_flight",
        "Number of tasks currently holding an admission permit",
    )
    .unwrap()
});

// =============================================================================
// Task Metrics
// =============================================================================

/// Tasks submitted total.
pub static TASKS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("smartocr_tasks_submitted_total", "Total tasks submitted").unwrap()
});

/// Tasks reaching a terminal state, by outcome.
pub static TASKS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "smartocr_tasks_finished_total",
            "Total tasks that reached a terminal state",
        ),
        // "completed", "admission_timeout", "load_error", "recognition_error", "deadline_exceeded"
        &["outcome"],
    )
    .unwrap()
});

/// End-to-end task duration in seconds.
pub static TASK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "smartocr_task_duration_seconds",
            "Duration from submission to terminal state",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 60.0]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Recognition Metrics
// =============================================================================

/// Recognizer call duration in seconds.
pub static RECOGNITION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "smartocr_recognition_duration_seconds",
            "Duration of single-page recognizer calls",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["device", "result"], // result: "success", "error"
    )
    .unwrap()
});

/// Recognizer calls that finished after their task had already failed.
pub static DISCARDED_RECOGNITIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "smartocr_discarded_recognitions_total",
        "Recognizer results discarded because the task deadline had passed",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Admission
        Box::new(ADMISSION_WAIT.clone()),
        Box::new(ADMISSION_REJECTIONS.clone()),
        Box::new(TASKS_IN_FLIGHT.clone()),
        // Tasks
        Box::new(TASKS_SUBMITTED.clone()),
        Box::new(TASKS_FINISHED.clone()),
        Box::new(TASK_DURATION.clone()),
        // Recognition
        Box::new(RECOGNITION_DURATION.clone()),
        Box::new(DISCARDED_RECOGNITIONS.clone()),
    ]
}
