//! Trait definitions for the external collaborators.

use async_trait::async_trait;

use crate::device::DeviceSlot;

use super::error::{LoadError, RecognitionError};
use super::types::{JobDescriptor, TextRegion, Unit};

/// Resolves a job descriptor into its ordered processing units.
#[async_trait]
pub trait UnitLoader: Send + Sync {
    /// Returns the units of `job` in page order.
    async fn load(&self, job: &JobDescriptor) -> Result<Vec<Unit>, LoadError>;
}

/// Runs recognition for one unit on one device slot.
///
/// Calls are synchronous and may block for a long time. They are always
/// run off the async runtime and are not assumed to be cancellable: once
/// started, a call runs to completion even if its result is no longer
/// wanted.
pub trait Recognizer: Send + Sync {
    /// Returns the name of this recognizer implementation.
    fn name(&self) -> &str;

    /// Recognizes the text regions in `unit` using `device`.
    fn recognize(&self, unit: &Unit, device: &DeviceSlot)
        -> Result<Vec<TextRegion>, RecognitionError>;
}
