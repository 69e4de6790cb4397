//! Task storage trait and types.

use thiserror::Error;

use crate::recognizer::OcrResult;

use super::types::{Task, TaskFailure, TaskStatistics, TaskStatus};

/// Error type for task store operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaskError {
    /// Task not found (never created, or already evicted).
    #[error("task not found: {0}")]
    NotFound(String),

    /// The requested transition is not allowed from the current status.
    #[error("cannot {operation} task {task_id}: current status is {current}")]
    InvalidTransition {
        task_id: String,
        current: TaskStatus,
        operation: String,
    },

    /// A progress update tried to move backwards.
    #[error("progress regression on task {task_id}: {previous} -> {requested}")]
    ProgressRegression {
        task_id: String,
        previous: u32,
        requested: u32,
    },
}

/// Filter for listing tasks.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    /// Only return tasks in this status.
    pub status: Option<TaskStatus>,
    /// Maximum number of results.
    pub limit: usize,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            status: None,
            limit: 100,
        }
    }

    /// Filter by status.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Trait for task storage backends.
///
/// Each task has a single writer (the orchestrator run that owns it);
/// implementations only need to protect their own map structure.
pub trait TaskStore: Send + Sync {
    /// Create a new pending task.
    fn create(&self, total_units: u32) -> Result<Task, TaskError>;

    /// Transition `pending -> processing`.
    fn mark_processing(&self, id: &str) -> Result<Task, TaskError>;

    /// Record how many units have been processed so far.
    fn update_progress(&self, id: &str, processed_units: u32) -> Result<Task, TaskError>;

    /// Transition `processing -> completed` with the aggregated result.
    fn complete(&self, id: &str, result: OcrResult) -> Result<Task, TaskError>;

    /// Transition `pending|processing -> failed`.
    fn fail(&self, id: &str, failure: TaskFailure) -> Result<Task, TaskError>;

    /// Get a task by ID.
    fn get(&self, id: &str) -> Result<Option<Task>, TaskError>;

    /// List tasks matching the filter, most recently created first.
    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskError>;

    /// Counts per status and success rate.
    fn statistics(&self) -> Result<TaskStatistics, TaskError>;

    /// Number of tasks currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
