//! Defines shared data structures for the Bluetooth module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::bluetooth::constants::{
    UUID_BATTERY_LEVEL, UUID_BATTERY_SERVICE, UUID_BLOOD_PRESSURE_MEASUREMENT,
    UUID_BLOOD_PRESSURE_SERVICE, UUID_HEART_RATE_MEASUREMENT, UUID_HEART_RATE_SERVICE,
    UUID_HEALTH_THERMOMETER_SERVICE, UUID_TEMPERATURE_MEASUREMENT,
};

/// The kinds of sensors a wearable can expose over GATT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    HeartRate,
    Temperature,
    BloodPressure,
    Battery,
}

impl SensorKind {
    /// Streaming sensors we subscribe to during discovery, in probe order
    pub const STREAMING: [SensorKind; 3] = [
        SensorKind::HeartRate,
        SensorKind::Temperature,
        SensorKind::BloodPressure,
    ];

    /// GATT service that hosts this sensor
    pub fn service(&self) -> Uuid {
        match self {
            SensorKind::HeartRate => UUID_HEART_RATE_SERVICE,
            SensorKind::Temperature => UUID_HEALTH_THERMOMETER_SERVICE,
            SensorKind::BloodPressure => UUID_BLOOD_PRESSURE_SERVICE,
            SensorKind::Battery => UUID_BATTERY_SERVICE,
        }
    }

    /// Measurement characteristic for this sensor
    pub fn characteristic(&self) -> Uuid {
        match self {
            SensorKind::HeartRate => UUID_HEART_RATE_MEASUREMENT,
            SensorKind::Temperature => UUID_TEMPERATURE_MEASUREMENT,
            SensorKind::BloodPressure => UUID_BLOOD_PRESSURE_MEASUREMENT,
            SensorKind::Battery => UUID_BATTERY_LEVEL,
        }
    }

    /// User-visible label, also the form stored in the device registry
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::HeartRate => "Heart Rate",
            SensorKind::Temperature => "Temperature",
            SensorKind::BloodPressure => "Blood Pressure",
            SensorKind::Battery => "Battery",
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A blood pressure pair in mmHg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: u16,
    pub diastolic: u16,
}

/// One decoded measurement value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Measurement {
    /// Beats per minute
    HeartRate(u16),
    /// Degrees Celsius
    Temperature(f32),
    BloodPressure(BloodPressure),
    /// Oxygen saturation percentage; produced by pulse-oximeter capable
    /// sources, never by the baseline GATT decoders
    Spo2(u8),
    /// Charge percentage of the peripheral itself
    BatteryLevel(u8),
}

/// A decoded measurement together with when it was observed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub measurement: Measurement,
    pub recorded_at: DateTime<Utc>,
}

impl Reading {
    /// Creates a reading stamped with the current time
    pub fn now(measurement: Measurement) -> Self {
        Self {
            measurement,
            recorded_at: Utc::now(),
        }
    }
}

/// Latest value per measurement kind, merged across every connected
/// peripheral. Last write wins per kind; values are never expired, not even
/// when their source device disconnects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalsSnapshot {
    pub heart_rate: Option<u16>,
    pub temperature: Option<f32>,
    pub blood_pressure: Option<BloodPressure>,
    pub spo2: Option<u8>,
    pub battery_level: Option<u8>,
}

impl VitalsSnapshot {
    /// Whether the snapshot carries anything worth persisting as a vitals
    /// record (battery alone does not qualify)
    pub fn has_vitals(&self) -> bool {
        self.heart_rate.is_some()
            || self.temperature.is_some()
            || self.spo2.is_some()
            || self.blood_pressure.is_some()
    }
}

/// Summarized, user-visible state of a connected peripheral
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Platform-specific unique identifier for the peripheral
    pub id: String,
    /// Advertised name, or "Unknown Device"
    pub name: String,
    /// Manufacturer name read from the device information service, best-effort
    pub brand: Option<String>,
    /// Last known battery percentage, if the battery service is present
    pub battery_level: Option<u8>,
    /// Sensors found during service discovery
    pub sensors: Vec<SensorKind>,
    /// Whether the session to this peripheral is currently open
    pub connected: bool,
}

impl DeviceInfo {
    /// Sensor labels in registry form
    pub fn sensor_labels(&self) -> Vec<String> {
        self.sensors.iter().map(|s| s.label().to_string()).collect()
    }
}

/// Changes observable on the live vitals hub. Every mutation of the device
/// list or the snapshot produces exactly one of these after the mutation is
/// fully applied.
#[derive(Debug, Clone)]
pub enum WearableEvent {
    /// A session was established and the device joined the live list
    DeviceConnected(DeviceInfo),
    /// An existing device's summary changed (battery refresh, sensor set)
    DeviceUpdated(DeviceInfo),
    /// The device was disconnected on request
    DeviceDisconnected { id: String },
    /// The link dropped without a disconnect request; alert-worthy
    ConnectionLost { id: String },
    /// A reading was merged into the snapshot
    VitalsUpdated {
        device_id: String,
        reading: Reading,
        snapshot: VitalsSnapshot,
    },
}
