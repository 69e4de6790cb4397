//! Types for the OCR orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::admission::AdmissionStatus;
use crate::device::{DeviceError, DeviceStatus};
use crate::task::TaskError;

/// Errors returned to callers of the orchestrator.
///
/// Job-level failures (admission, loading, recognition, deadline) are not
/// errors here: they are recorded on the task and the task id is returned.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The orchestrator has been shut down.
    #[error("orchestrator is not running")]
    NotRunning,

    /// Device pool could not be built.
    #[error("device pool error: {0}")]
    Device(#[from] DeviceError),

    /// Task store error.
    #[error("task store error: {0}")]
    TaskStore(#[from] TaskError),

    /// The task record was evicted from history before the run finished.
    #[error("task evicted before completion: {0}")]
    TaskEvicted(String),

    /// The background run for a task could not be joined.
    #[error("task run aborted: {0}")]
    RunAborted(String),
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether new submissions are accepted.
    pub running: bool,
    pub admission: AdmissionStatus,
    pub devices: Vec<DeviceStatus>,
    /// Size of the blocking recognition worker pool.
    pub recognition_workers: usize,
    /// Workers currently running a recognizer call (including discarded ones).
    pub busy_workers: usize,
    /// Task records currently held in history.
    pub tracked_tasks: usize,
}
