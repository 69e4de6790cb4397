//! Collaborator seams for loading and recognizing pages.
//!
//! The core never decodes images or runs a model. A [`UnitLoader`] turns a
//! job descriptor into ordered page units, and a [`Recognizer`] turns one
//! unit into text regions on a given device slot.

mod error;
mod traits;
mod types;

pub use error::{LoadError, RecognitionError};
pub use traits::{Recognizer, UnitLoader};
pub use types::{JobDescriptor, OcrResult, TextPosition, TextRegion, Unit};
