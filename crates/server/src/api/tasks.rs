//! Task API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use smartocr_core::{
    JobDescriptor, OcrResult, Task, TaskFailure, TaskFilter, TaskStatistics, TaskStatus,
};

use super::handlers::{api_error, orchestrator_error, ApiError};
use crate::state::AppState;

/// Maximum allowed limit for task queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for task queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing tasks
#[derive(Debug, Deserialize)]
pub struct ListTasksParams {
    /// Filter by status
    pub status: Option<String>,
    /// Maximum number of tasks to return
    pub limit: Option<i64>,
}

/// Response for a submitted task
#[derive(Debug, Serialize)]
pub struct SubmitTaskResponse {
    pub task_id: String,
}

/// Snapshot of one task
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub progress: f64,
    pub total_pages: u32,
    pub processed_pages: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<OcrResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskFailure>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            elapsed_secs: task.elapsed_secs(),
            task_id: task.id,
            status: task.status,
            progress: task.progress,
            total_pages: task.total_units,
            processed_pages: task.processed_units,
            created_at: task.created_at,
            started_at: task.started_at,
            ended_at: task.ended_at,
            result: task.result,
            error: task.error,
        }
    }
}

/// Response for listing tasks
#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    pub tasks: Vec<TaskResponse>,
    pub count: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a job without waiting for it to finish
pub async fn submit_task(
    State(state): State<Arc<AppState>>,
    Json(job): Json<JobDescriptor>,
) -> Result<(StatusCode, Json<SubmitTaskResponse>), ApiError> {
    let task_id = state
        .orchestrator()
        .submit(job)
        .await
        .map_err(orchestrator_error)?;

    Ok((StatusCode::ACCEPTED, Json(SubmitTaskResponse { task_id })))
}

/// Get a task by ID
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    match state.orchestrator().get_task(&id) {
        Ok(Some(task)) => Ok(Json(TaskResponse::from(task))),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Task not found: {}", id),
        )),
        Err(e) => Err(orchestrator_error(e)),
    }
}

/// List tasks, most recent first
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTasksParams>,
) -> Result<Json<ListTasksResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let mut filter = TaskFilter::new().with_limit(limit as usize);

    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        let status = status
            .parse::<TaskStatus>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
        filter = filter.with_status(status);
    }

    let tasks: Vec<TaskResponse> = state
        .orchestrator()
        .list_tasks(&filter)
        .map_err(orchestrator_error)?
        .into_iter()
        .map(TaskResponse::from)
        .collect();

    Ok(Json(ListTasksResponse {
        count: tasks.len(),
        tasks,
    }))
}

/// Counts per status and success rate
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TaskStatistics>, ApiError> {
    state
        .orchestrator()
        .get_statistics()
        .map(Json)
        .map_err(orchestrator_error)
}
