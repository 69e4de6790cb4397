//! Synchronous OCR endpoint: submit a job and wait for its result.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use smartocr_core::{ErrorKind, JobDescriptor, TaskStatus, TextRegion};

use super::handlers::{orchestrator_error, ApiError, ErrorResponse};
use crate::state::AppState;

/// Result of a completed OCR request.
#[derive(Debug, Serialize)]
pub struct OcrResponse {
    pub results: Vec<TextRegion>,
    pub text_count: usize,
    /// Recognizer time summed over pages (seconds).
    pub processing_time: f64,
    /// End-to-end request time (milliseconds).
    pub duration_ms: f64,
    pub page_count: usize,
    pub task_id: String,
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::LoadError => StatusCode::BAD_REQUEST,
        ErrorKind::AdmissionTimeout => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::RecognitionError => StatusCode::BAD_GATEWAY,
    }
}

/// Run OCR on an image or a set of page images
pub async fn perform_ocr(
    State(state): State<Arc<AppState>>,
    Json(job): Json<JobDescriptor>,
) -> Result<Json<OcrResponse>, ApiError> {
    let task = state
        .orchestrator()
        .submit_and_wait(job)
        .await
        .map_err(orchestrator_error)?;

    debug!("OCR request finished as task {} ({})", task.id, task.status);

    match (task.status, task.result, task.error) {
        (TaskStatus::Completed, Some(result), _) => Ok(Json(OcrResponse {
            results: result.results,
            text_count: result.text_count,
            processing_time: result.processing_time_secs,
            duration_ms: result.duration_ms,
            page_count: result.page_count,
            task_id: task.id,
        })),
        (_, _, Some(failure)) => Err((
            status_for(failure.kind),
            Json(ErrorResponse {
                error: failure.detail,
                kind: Some(failure.kind),
                task_id: Some(task.id),
            }),
        )),
        (status, _, _) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("task ended in unexpected state {}", status),
                kind: None,
                task_id: Some(task.id),
            }),
        )),
    }
}
