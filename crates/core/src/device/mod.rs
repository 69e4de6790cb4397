//! Accelerator device pool.
//!
//! Hands out device slots in round-robin order. The pool only balances
//! assignments; it never reserves a slot or checks whether it is busy.
//! Serializing calls on a physical device is up to the recognizer.

mod pool;

pub use pool::{DeviceError, DevicePool, DeviceSlot, DeviceStatus};
