//! HTTP-backed implementations of the core collaborator traits.

mod loader;
mod recognizer;

pub use loader::HttpUnitLoader;
pub use recognizer::HttpRecognizer;
