//! Admission control.
//!
//! A bounded permit pool in front of the device pool. A task holds one
//! permit from admission until it reaches a terminal state. Waiting for a
//! permit is always bounded by a timeout, and the number of concurrent
//! waiters can be capped.

mod config;
mod controller;

pub use config::AdmissionConfig;
pub use controller::{AdmissionController, AdmissionError, AdmissionPermit, AdmissionStatus};
