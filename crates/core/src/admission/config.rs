//! Admission configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the admission controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Size of the permit pool (maximum simultaneously processing tasks).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// How long a submission may wait for a permit (milliseconds).
    #[serde(default = "default_max_queue_wait")]
    pub max_queue_wait_ms: u64,

    /// Maximum number of submissions waiting for a permit (0 = unlimited).
    /// Submissions beyond this are rejected without waiting.
    #[serde(default = "default_max_waiters")]
    pub max_waiters: usize,
}

fn default_max_concurrent() -> usize {
    100_000
}

fn default_max_queue_wait() -> u64 {
    30_000 // 30 seconds
}

fn default_max_waiters() -> usize {
    100_000
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_queue_wait_ms: default_max_queue_wait(),
            max_waiters: default_max_waiters(),
        }
    }
}

impl AdmissionConfig {
    /// Admission wait as a duration.
    pub fn max_queue_wait(&self) -> Duration {
        Duration::from_millis(self.max_queue_wait_ms)
    }

    /// Sets the permit pool size.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Sets the admission wait.
    pub fn with_max_queue_wait(mut self, wait: Duration) -> Self {
        self.max_queue_wait_ms = wait.as_millis() as u64;
        self
    }

    /// Sets the waiter cap.
    pub fn with_max_waiters(mut self, max: usize) -> Self {
        self.max_waiters = max;
        self
    }
}
