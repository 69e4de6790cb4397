//! Round-robin device pool implementation.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while building the device pool.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No device ids were configured.
    #[error("device pool requires at least one device id")]
    NoDevices,
}

/// One accelerator execution context.
#[derive(Debug)]
pub struct DeviceSlot {
    index: usize,
    device_id: u32,
    dispatched: AtomicU64,
}

impl DeviceSlot {
    fn new(index: usize, device_id: u32) -> Self {
        Self {
            index,
            device_id,
            dispatched: AtomicU64::new(0),
        }
    }

    /// Stable ordinal of this slot within the pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Configured accelerator id this slot is bound to.
    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    /// Number of units assigned to this slot so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }
}

/// Snapshot of a single slot for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceStatus {
    pub index: usize,
    pub device_id: u32,
    pub dispatched: u64,
}

/// Fixed set of device slots with a shared round-robin cursor.
#[derive(Debug)]
pub struct DevicePool {
    slots: Vec<Arc<DeviceSlot>>,
    next: AtomicUsize,
}

impl DevicePool {
    /// Builds a pool with one slot per configured device id, in order.
    pub fn new(device_ids: &[u32]) -> Result<Self, DeviceError> {
        if device_ids.is_empty() {
            return Err(DeviceError::NoDevices);
        }

        let slots = device_ids
            .iter()
            .enumerate()
            .map(|(index, &device_id)| Arc::new(DeviceSlot::new(index, device_id)))
            .collect::<Vec<_>>();

        info!("Device pool initialized with devices {:?}", device_ids);

        Ok(Self {
            slots,
            next: AtomicUsize::new(0),
        })
    }

    /// Returns the next slot in round-robin order.
    pub fn pick(&self) -> Arc<DeviceSlot> {
        let len = self.slots.len();
        // The closure always returns Some, so both arms carry the previous value.
        let index = match self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % len))
        {
            Ok(i) | Err(i) => i,
        };

        let slot = &self.slots[index];
        slot.dispatched.fetch_add(1, Ordering::Relaxed);
        Arc::clone(slot)
    }

    /// Number of devices in the pool.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; construction rejects an empty device list.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots, in index order.
    pub fn slots(&self) -> &[Arc<DeviceSlot>] {
        &self.slots
    }

    pub fn status(&self) -> Vec<DeviceStatus> {
        self.slots
            .iter()
            .map(|slot| DeviceStatus {
                index: slot.index,
                device_id: slot.device_id,
                dispatched: slot.dispatched(),
            })
            .collect()
    }
}
