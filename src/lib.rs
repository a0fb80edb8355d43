//! Wearable vitals bridge library.
//! Connectivity core for a patient-facing health dashboard: it discovers
//! Bluetooth LE wearables, maintains GATT sessions to them, decodes the
//! standardized sensor payloads (heart rate, temperature, blood pressure,
//! battery) and merges everything into a live, observable vitals view that
//! is mirrored into an external device/vitals store.

// Module declarations
pub mod core;
pub mod error;
pub mod storage;

pub use crate::core::bluetooth::{
    BleBackend, DeviceInfo, Measurement, PeripheralLink, Reading, SensorKind, VitalsSnapshot,
    WearableEvent, WearableManager,
};
pub use crate::core::vitals::VitalsHub;
pub use storage::{DeviceRecord, DeviceStore, RegistryBridge, VitalsRecord, VitalsStore};
