//! OCR task orchestrator.
//!
//! Drives each submitted job from creation to a terminal state:
//! - **Load**: the unit loader resolves the job into ordered pages
//! - **Admission**: one permit from the bounded pool, with a bounded wait
//! - **Recognition**: pages in order, each on the next round-robin device,
//!   run on a blocking worker pool sized to the devices
//! - **Finalize**: aggregate results or record the first failure
//!
//! A single deadline, measured from submission, bounds the whole run.

mod config;
mod executor;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::OcrOrchestrator;
pub use types::{OrchestratorError, OrchestratorStatus};
