//! Blocking worker pool for recognizer calls.
//!
//! Recognizer calls run on tokio's blocking threads, gated by a semaphore
//! sized to the device capacity. The worker permit travels with the blocking
//! closure, so a call whose caller gave up still occupies its worker until
//! it actually returns.

use std::sync::Arc;
use std::time::{Duration, Instant as StdInstant};

use tokio::sync::{oneshot, Semaphore};
use tokio::time::Instant;
use tracing::debug;

use crate::device::DeviceSlot;
use crate::metrics::{DISCARDED_RECOGNITIONS, RECOGNITION_DURATION};
use crate::recognizer::{RecognitionError, Recognizer, TextRegion, Unit};

/// Result of one recognizer call that finished before the deadline.
#[derive(Debug)]
pub(crate) struct Recognition {
    pub regions: Result<Vec<TextRegion>, RecognitionError>,
    pub elapsed: Duration,
}

/// The deadline passed before the call produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DeadlineElapsed;

pub(crate) struct RecognitionExecutor {
    workers: Arc<Semaphore>,
    size: usize,
}

impl RecognitionExecutor {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            workers: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn busy(&self) -> usize {
        self.size - self.workers.available_permits()
    }

    /// Runs `recognizer` on `unit` using `device`, waiting until `deadline`
    /// at most (including the wait for a free worker).
    ///
    /// On timeout the blocking call keeps running; its result is dropped
    /// and counted as discarded.
    pub async fn run(
        &self,
        recognizer: Arc<dyn Recognizer>,
        unit: Unit,
        device: Arc<DeviceSlot>,
        deadline: Instant,
        task_id: &str,
    ) -> Result<Recognition, DeadlineElapsed> {
        let workers = Arc::clone(&self.workers);
        let owner = task_id.to_string();

        let call = async move {
            let worker = match workers.acquire_owned().await {
                Ok(worker) => worker,
                Err(_) => {
                    return Recognition {
                        regions: Err(RecognitionError::failed("recognition workers closed")),
                        elapsed: Duration::ZERO,
                    }
                }
            };

            let (tx, rx) = oneshot::channel();
            tokio::task::spawn_blocking(move || {
                let started = StdInstant::now();
                let regions = recognizer.recognize(&unit, &device);
                let elapsed = started.elapsed();
                drop(worker);

                let label = device.device_id().to_string();
                let outcome = if regions.is_ok() { "success" } else { "error" };
                RECOGNITION_DURATION
                    .with_label_values(&[&label, outcome])
                    .observe(elapsed.as_secs_f64());

                if tx.send(Recognition { regions, elapsed }).is_err() {
                    DISCARDED_RECOGNITIONS.inc();
                    debug!(
                        "Discarded late recognition for task {} (unit {}, device {}, {:?})",
                        owner,
                        unit.index,
                        device.device_id(),
                        elapsed
                    );
                }
            });

            rx.await.unwrap_or_else(|_| Recognition {
                regions: Err(RecognitionError::WorkerPanicked(
                    "worker exited without a result".to_string(),
                )),
                elapsed: Duration::ZERO,
            })
        };

        tokio::time::timeout_at(deadline, call)
            .await
            .map_err(|_| DeadlineElapsed)
    }
}
