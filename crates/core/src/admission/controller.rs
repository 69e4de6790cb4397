//! Semaphore-backed admission controller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, warn};

use crate::metrics::{ADMISSION_REJECTIONS, ADMISSION_WAIT, TASKS_IN_FLIGHT};

use super::config::AdmissionConfig;

/// Reasons a permit could not be handed out.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// No permit freed up within the allowed wait.
    #[error("no admission permit available after {waited_ms} ms")]
    Timeout { waited_ms: u64 },

    /// Too many submissions are already waiting.
    #[error("admission queue full ({max_waiters} waiters)")]
    QueueFull { max_waiters: usize },

    /// The controller was closed for shutdown.
    #[error("admission controller is closed")]
    Closed,
}

impl AdmissionError {
    fn reason(&self) -> &'static str {
        match self {
            AdmissionError::Timeout { .. } => "timeout",
            AdmissionError::QueueFull { .. } => "queue_full",
            AdmissionError::Closed => "closed",
        }
    }
}

/// Current admission counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdmissionStatus {
    pub max_concurrent: usize,
    pub in_flight: usize,
    pub waiting: usize,
    pub total_admitted: u64,
    pub total_rejected: u64,
}

#[derive(Default)]
struct AdmissionStats {
    in_flight: AtomicU64,
    waiting: AtomicU64,
    total_admitted: AtomicU64,
    total_rejected: AtomicU64,
}

/// Decrements the waiter count when the wait ends, including when the
/// acquiring future is dropped mid-wait.
struct WaitingGuard<'a>(&'a AdmissionStats);

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.waiting.fetch_sub(1, Ordering::AcqRel);
    }
}

/// One unit of the concurrency budget. Dropping it releases the permit.
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    stats: Arc<AdmissionStats>,
    admitted_at: Instant,
}

impl AdmissionPermit {
    /// How long this permit has been held.
    pub fn held_for(&self) -> Duration {
        self.admitted_at.elapsed()
    }
}

impl std::fmt::Debug for AdmissionPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionPermit")
            .field("held_for", &self.held_for())
            .finish()
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.stats.in_flight.fetch_sub(1, Ordering::AcqRel);
        TASKS_IN_FLIGHT.dec();
    }
}

/// Bounded-concurrency gate with a bounded wait.
pub struct AdmissionController {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    max_waiters: usize,
    max_queue_wait: Duration,
    stats: Arc<AdmissionStats>,
}

impl AdmissionController {
    /// Creates a controller with `max_concurrent` permits.
    pub fn new(config: &AdmissionConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            max_concurrent: config.max_concurrent,
            max_waiters: config.max_waiters,
            max_queue_wait: config.max_queue_wait(),
            stats: Arc::new(AdmissionStats::default()),
        }
    }

    /// Acquires a permit, waiting at most `wait` for one to free up.
    pub async fn acquire(&self, wait: Duration) -> Result<AdmissionPermit, AdmissionError> {
        let start = Instant::now();

        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => return Ok(self.admit(permit, start)),
            Err(TryAcquireError::Closed) => return Err(self.reject(AdmissionError::Closed)),
            Err(TryAcquireError::NoPermits) => {}
        }

        let already_waiting = self.stats.waiting.fetch_add(1, Ordering::AcqRel) as usize;
        let guard = WaitingGuard(&self.stats);
        if self.max_waiters > 0 && already_waiting >= self.max_waiters {
            drop(guard);
            return Err(self.reject(AdmissionError::QueueFull {
                max_waiters: self.max_waiters,
            }));
        }

        let acquired =
            tokio::time::timeout(wait, Arc::clone(&self.semaphore).acquire_owned()).await;
        drop(guard);

        match acquired {
            Ok(Ok(permit)) => Ok(self.admit(permit, start)),
            Ok(Err(_)) => Err(self.reject(AdmissionError::Closed)),
            Err(_) => Err(self.reject(AdmissionError::Timeout {
                waited_ms: start.elapsed().as_millis() as u64,
            })),
        }
    }

    /// Configured upper bound on the wait for a permit.
    pub fn max_queue_wait(&self) -> Duration {
        self.max_queue_wait
    }

    /// Rejects all current and future waiters.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    pub fn status(&self) -> AdmissionStatus {
        AdmissionStatus {
            max_concurrent: self.max_concurrent,
            in_flight: self.stats.in_flight.load(Ordering::Acquire) as usize,
            waiting: self.stats.waiting.load(Ordering::Acquire) as usize,
            total_admitted: self.stats.total_admitted.load(Ordering::Relaxed),
            total_rejected: self.stats.total_rejected.load(Ordering::Relaxed),
        }
    }

    fn admit(&self, permit: OwnedSemaphorePermit, start: Instant) -> AdmissionPermit {
        self.stats.in_flight.fetch_add(1, Ordering::AcqRel);
        self.stats.total_admitted.fetch_add(1, Ordering::Relaxed);
        TASKS_IN_FLIGHT.inc();
        ADMISSION_WAIT.observe(start.elapsed().as_secs_f64());

        AdmissionPermit {
            _permit: permit,
            stats: Arc::clone(&self.stats),
            admitted_at: Instant::now(),
        }
    }

    fn reject(&self, error: AdmissionError) -> AdmissionError {
        self.stats.total_rejected.fetch_add(1, Ordering::Relaxed);
        ADMISSION_REJECTIONS
            .with_label_values(&[error.reason()])
            .inc();
        match &error {
            AdmissionError::Closed => debug!("Admission rejected: {}", error),
            _ => warn!("Admission rejected: {}", error),
        }
        error
    }
}
