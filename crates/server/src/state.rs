use std::sync::Arc;
use smartocr_core::{Config, OcrOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<OcrOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<OcrOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &OcrOrchestrator {
        self.orchestrator.as_ref()
    }
}
