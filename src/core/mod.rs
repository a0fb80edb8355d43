//! Core functionality for the wearable vitals bridge.
//! This module contains the connectivity layer for health wearables.

pub mod bluetooth;
pub mod vitals;

// Re-export commonly used types
pub use bluetooth::WearableManager;
pub use vitals::VitalsHub;
