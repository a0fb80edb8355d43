//! Bluetooth functionality for the wearable vitals bridge.
//! This module handles all Bluetooth operations including capability
//! detection, scanning, GATT sessions and measurement decoding.

mod bluest_link;
pub mod codec;
mod constants;
mod link;
mod manager;
mod scanner;
mod session;
mod types;

// Re-export types that should be publicly accessible
pub use bluest_link::{BluestBackend, BluestLink};
pub use constants::*; // Re-export all constants
pub use link::{BleBackend, NotificationStream, PeripheralLink};
pub use manager::WearableManager;
pub use scanner::WearableScanner;
pub use session::SessionManager;
pub use types::{
    BloodPressure, DeviceInfo, Measurement, Reading, SensorKind, VitalsSnapshot, WearableEvent,
};
