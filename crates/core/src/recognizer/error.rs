//! Error types for the collaborator traits.

use thiserror::Error;

/// Errors produced while turning a job into units.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    /// The job descriptor itself is unusable.
    #[error("invalid job: {0}")]
    InvalidJob(String),

    /// A source could not be fetched.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// A source answered with a non-success status.
    #[error("failed to fetch {url} (HTTP {status})")]
    HttpStatus { url: String, status: u16 },

    /// Inline image data is not valid base64.
    #[error("invalid base64 image data: {0}")]
    Decode(String),

    /// The job resolved to no units.
    #[error("job contains no pages")]
    Empty,
}

/// Errors produced while recognizing a single unit.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecognitionError {
    /// The recognizer ran but could not process the unit.
    #[error("recognition failed: {reason}")]
    Failed { reason: String },

    /// The device backing the slot is not reachable.
    #[error("device {device_id} unavailable: {reason}")]
    DeviceUnavailable { device_id: u32, reason: String },

    /// The recognizer returned something that could not be interpreted.
    #[error("invalid recognizer output: {reason}")]
    InvalidOutput { reason: String },

    /// The worker running the recognizer panicked.
    #[error("recognition worker panicked: {0}")]
    WorkerPanicked(String),
}

impl RecognitionError {
    pub fn failed(reason: impl Into<String>) -> Self {
        RecognitionError::Failed {
            reason: reason.into(),
        }
    }
}
