//! Testing utilities and mock collaborators.
//!
//! Mock implementations of [`UnitLoader`](crate::recognizer::UnitLoader) and
//! [`Recognizer`](crate::recognizer::Recognizer), so the orchestrator can be
//! exercised end to end without fetching images or running a model.
//!
//! # Example
//!
//! ```rust,ignore
//! use smartocr_core::testing::{fixtures, MockRecognizer, MockUnitLoader};
//!
//! let recognizer = Arc::new(MockRecognizer::new().with_delay(Duration::from_millis(20)));
//! recognizer.fail_on_unit(1, RecognitionError::failed("blurry"));
//!
//! let task = orchestrator.submit_and_wait(fixtures::document_job(3)).await?;
//! assert_eq!(recognizer.call_count(), 2);
//! ```

mod mock_loader;
mod mock_recognizer;

pub use mock_loader::MockUnitLoader;
pub use mock_recognizer::{MockRecognizer, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::recognizer::{JobDescriptor, TextPosition, TextRegion};

    /// A text region with a 100x20 box at the origin.
    pub fn text_region(text: &str) -> TextRegion {
        TextRegion {
            text: text.to_string(),
            confidence: 0.98,
            position: TextPosition {
                top_left: [0.0, 0.0],
                top_right: [100.0, 0.0],
                bottom_right: [100.0, 20.0],
                bottom_left: [0.0, 20.0],
            },
            page: None,
        }
    }

    /// A single-image job.
    pub fn image_job() -> JobDescriptor {
        JobDescriptor::image("http://images.test/receipt.png")
    }

    /// A document job with `pages` page images.
    pub fn document_job(pages: usize) -> JobDescriptor {
        JobDescriptor::pages((1..=pages).map(|p| format!("http://images.test/doc/page-{}.png", p)))
    }
}
