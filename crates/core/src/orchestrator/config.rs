//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the OCR orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Overall per-task deadline, measured from submission (milliseconds).
    #[serde(default = "default_request_deadline")]
    pub request_deadline_ms: u64,

    /// Concurrent recognizer calls allowed per device.
    /// The blocking worker pool holds `devices * workers_per_device` slots.
    #[serde(default = "default_workers_per_device")]
    pub workers_per_device: usize,
}

fn default_request_deadline() -> u64 {
    25_000 // 25 seconds
}

fn default_workers_per_device() -> usize {
    1
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            request_deadline_ms: default_request_deadline(),
            workers_per_device: default_workers_per_device(),
        }
    }
}

impl OrchestratorConfig {
    /// Request deadline as a duration.
    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }

    /// Sets the request deadline.
    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline_ms = deadline.as_millis() as u64;
        self
    }

    /// Sets the per-device worker count.
    pub fn with_workers_per_device(mut self, workers: usize) -> Self {
        self.workers_per_device = workers;
        self
    }
}
