//! Common test utilities for API integration tests.
//!
//! Builds the full router in-process over a real orchestrator with mock
//! collaborators, so requests never leave the test.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use smartocr_core::config::RecognizerConfig;
use smartocr_core::testing::{MockRecognizer, MockUnitLoader};
use smartocr_core::{
    AdmissionConfig, Config, OcrOrchestrator, OrchestratorConfig, Recognizer, UnitLoader,
};
use smartocr_server::state::AppState;

pub use smartocr_core::testing::fixtures;

/// Response from a test request.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

/// Knobs for one fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub devices: Vec<u32>,
    pub max_concurrent: usize,
    pub max_queue_wait: Duration,
    pub request_deadline: Duration,
    pub recognizer_delay: Duration,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            devices: vec![0, 1],
            max_concurrent: 8,
            max_queue_wait: Duration::from_secs(5),
            request_deadline: Duration::from_secs(10),
            recognizer_delay: Duration::ZERO,
        }
    }
}

/// Test fixture holding the router and the mocks behind it.
pub struct TestFixture {
    pub router: Router,
    pub orchestrator: Arc<OcrOrchestrator>,
    pub recognizer: Arc<MockRecognizer>,
    pub loader: Arc<MockUnitLoader>,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let recognizer = Arc::new(MockRecognizer::new().with_delay(test_config.recognizer_delay));
        let loader = Arc::new(MockUnitLoader::new());

        let mut config = Config::default();
        config.devices.device_ids = test_config.devices.clone();
        config.admission = AdmissionConfig::default()
            .with_max_concurrent(test_config.max_concurrent)
            .with_max_queue_wait(test_config.max_queue_wait);
        config.orchestrator =
            OrchestratorConfig::default().with_request_deadline(test_config.request_deadline);
        config.recognizer = Some(RecognizerConfig {
            url: "http://recognizer.test".to_string(),
            timeout_secs: 5,
        });

        let orchestrator = Arc::new(
            OcrOrchestrator::from_config(
                &config,
                Arc::clone(&loader) as Arc<dyn UnitLoader>,
                Arc::clone(&recognizer) as Arc<dyn Recognizer>,
            )
            .expect("Failed to create orchestrator"),
        );

        let state = Arc::new(AppState::new(config, Arc::clone(&orchestrator)));
        let router = smartocr_server::api::create_router(state);

        Self {
            router,
            orchestrator,
            recognizer,
            loader,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Poll a task until it reaches a terminal status.
    pub async fn wait_for_task(&self, task_id: &str) -> TestResponse {
        let start = std::time::Instant::now();
        loop {
            let response = self.get(&format!("/api/v1/tasks/{}", task_id)).await;
            let status = response.body["status"].as_str().unwrap_or_default();
            if status == "completed" || status == "failed" {
                return response;
            }
            assert!(
                start.elapsed() < Duration::from_secs(10),
                "task {} never finished",
                task_id
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
