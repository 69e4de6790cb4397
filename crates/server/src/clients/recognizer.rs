//! Recognizer that forwards pages to a remote inference service.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::runtime::Handle;

use smartocr_core::config::RecognizerConfig;
use smartocr_core::{DeviceSlot, RecognitionError, Recognizer, TextRegion, Unit};

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    results: Vec<TextRegion>,
}

/// POSTs the raw page bytes to `{url}/recognize?device={device_id}` and
/// parses `{"results": [...]}`.
///
/// `recognize` blocks the calling thread on the runtime handle captured at
/// construction, so it must run on a blocking thread (as the orchestrator
/// does), never directly on an async worker.
pub struct HttpRecognizer {
    client: Client,
    endpoint: String,
    runtime: Handle,
}

impl HttpRecognizer {
    /// Must be called from within a tokio runtime.
    pub fn new(config: &RecognizerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build recognizer HTTP client")?;
        let runtime = Handle::try_current().context("HttpRecognizer requires a tokio runtime")?;

        Ok(Self {
            client,
            endpoint: format!("{}/recognize", config.url.trim_end_matches('/')),
            runtime,
        })
    }

    async fn call(&self, unit: &Unit, device_id: u32) -> Result<Vec<TextRegion>, RecognitionError> {
        let response = self
            .client
            .post(format!("{}?device={}", self.endpoint, device_id))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(unit.data.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    RecognitionError::DeviceUnavailable {
                        device_id,
                        reason: e.to_string(),
                    }
                } else {
                    RecognitionError::failed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(RecognitionError::DeviceUnavailable {
                device_id,
                reason: "recognizer returned HTTP 503".to_string(),
            });
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RecognitionError::failed(format!(
                "recognizer returned HTTP {}: {}",
                status.as_u16(),
                detail.trim()
            )));
        }

        let body: RecognizeResponse =
            response
                .json()
                .await
                .map_err(|e| RecognitionError::InvalidOutput {
                    reason: e.to_string(),
                })?;
        Ok(body.results)
    }
}

impl Recognizer for HttpRecognizer {
    fn name(&self) -> &str {
        "http"
    }

    fn recognize(
        &self,
        unit: &Unit,
        device: &DeviceSlot,
    ) -> Result<Vec<TextRegion>, RecognitionError> {
        self.runtime.block_on(self.call(unit, device.device_id()))
    }
}
