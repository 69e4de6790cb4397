//! Mock recognizer for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::device::DeviceSlot;
use crate::recognizer::{RecognitionError, Recognizer, TextRegion, Unit};

use super::fixtures;

/// A recorded recognizer call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Index of the unit within its job.
    pub unit_index: usize,
    /// Page number, for document units.
    pub page: Option<u32>,
    /// Device the call was dispatched to.
    pub device_id: u32,
}

#[derive(Debug, Default)]
struct Behavior {
    failures: HashMap<usize, RecognitionError>,
    panics: HashSet<usize>,
}

/// Mock implementation of the Recognizer trait.
///
/// Provides controllable behavior for testing:
/// - Records every call (unit, page, device)
/// - Fails or panics on chosen unit indexes
/// - Simulates slow inference with a fixed blocking delay
/// - Tracks the peak number of overlapping calls
///
/// Each successful call returns one region with text `unit-{index}`.
#[derive(Debug, Default)]
pub struct MockRecognizer {
    delay: Duration,
    behavior: Mutex<Behavior>,
    calls: Mutex<Vec<RecordedCall>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl MockRecognizer {
    /// Create a new mock recognizer with no delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block every call for `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make calls for unit `index` fail with `error`.
    pub fn fail_on_unit(&self, index: usize, error: RecognitionError) {
        lock(&self.behavior).failures.insert(index, error);
    }

    /// Make calls for unit `index` panic.
    pub fn panic_on_unit(&self, index: usize) {
        lock(&self.behavior).panics.insert(index);
    }

    /// Get all recorded calls, in call order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Highest number of calls that were running at the same time.
    pub fn max_concurrent_calls(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Recognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock"
    }

    fn recognize(
        &self,
        unit: &Unit,
        device: &DeviceSlot,
    ) -> Result<Vec<TextRegion>, RecognitionError> {
        lock(&self.calls).push(RecordedCall {
            unit_index: unit.index,
            page: unit.page,
            device_id: device.device_id(),
        });

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let (failure, panics) = {
            let behavior = lock(&self.behavior);
            (
                behavior.failures.get(&unit.index).cloned(),
                behavior.panics.contains(&unit.index),
            )
        };
        if panics {
            panic!("mock recognizer panic on unit {}", unit.index);
        }
        if let Some(error) = failure {
            return Err(error);
        }

        Ok(vec![fixtures::text_region(&format!("unit-{}", unit.index))])
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
