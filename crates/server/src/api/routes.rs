use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware::metrics_middleware, ocr, tasks};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // OCR
        .route("/ocr", post(ocr::perform_ocr))
        // Tasks
        .route("/tasks", post(tasks::submit_task))
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks/statistics", get(tasks::get_statistics))
        .route("/tasks/{id}", get(tasks::get_task))
        // Orchestrator
        .route("/status", get(handlers::get_status))
        .with_state(Arc::clone(&state));

    Router::new()
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
