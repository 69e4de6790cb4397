//! Core task data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recognizer::OcrResult;

/// Lifecycle state of a task.
///
/// `pending -> processing -> completed`, or `failed` from either
/// non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Returns the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Completed and failed tasks never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

/// Stable category of a task failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No admission permit could be obtained in time.
    AdmissionTimeout,
    /// The unit loader rejected or failed to fetch the job.
    LoadError,
    /// A unit failed during recognition.
    RecognitionError,
    /// The request deadline passed before all units finished.
    DeadlineExceeded,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AdmissionTimeout => "admission_timeout",
            ErrorKind::LoadError => "load_error",
            ErrorKind::RecognitionError => "recognition_error",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

/// Failure recorded on a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskFailure {
    pub kind: ErrorKind,
    pub detail: String,
}

impl TaskFailure {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.detail)
    }
}

/// One submitted recognition job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub status: TaskStatus,
    /// Percentage of units processed, 0-100.
    pub progress: f64,
    pub total_units: u32,
    pub processed_units: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Set only once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<OcrResult>,
    /// Set only once failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskFailure>,
}

impl Task {
    pub(crate) fn new(id: String, total_units: u32) -> Self {
        Self {
            id,
            status: TaskStatus::Pending,
            progress: 0.0,
            total_units,
            processed_units: 0,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            result: None,
            error: None,
        }
    }

    /// Seconds from creation until the task ended, or until now if it is
    /// still running.
    pub fn elapsed_secs(&self) -> f64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.created_at).num_milliseconds().max(0) as f64 / 1000.0
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Aggregate counts over the tracked tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskStatistics {
    pub total_tasks: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    /// `completed / (completed + failed) * 100`, or 0 when nothing finished.
    pub success_rate: f64,
}
