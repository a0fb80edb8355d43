//! Constants used throughout the wearable connectivity layer.
//! This module contains all the constant values used by the Bluetooth core,
//! such as SIG-assigned UUIDs, thresholds and timing values.

use std::time::Duration;
use uuid::Uuid;

/// Standard Bluetooth Service UUIDs (Bluetooth SIG assigned numbers)
pub const UUID_HEART_RATE_SERVICE: Uuid = Uuid::from_u128(0x0000180d_0000_1000_8000_00805f9b34fb);
pub const UUID_BATTERY_SERVICE: Uuid = Uuid::from_u128(0x0000180f_0000_1000_8000_00805f9b34fb);
pub const UUID_DEVICE_INFORMATION_SERVICE: Uuid =
    Uuid::from_u128(0x0000180a_0000_1000_8000_00805f9b34fb);
pub const UUID_HEALTH_THERMOMETER_SERVICE: Uuid =
    Uuid::from_u128(0x00001809_0000_1000_8000_00805f9b34fb);
pub const UUID_BLOOD_PRESSURE_SERVICE: Uuid =
    Uuid::from_u128(0x00001810_0000_1000_8000_00805f9b34fb);
pub const UUID_PULSE_OXIMETER_SERVICE: Uuid =
    Uuid::from_u128(0x00001822_0000_1000_8000_00805f9b34fb);

/// Standard Bluetooth Characteristic UUIDs
pub const UUID_HEART_RATE_MEASUREMENT: Uuid =
    Uuid::from_u128(0x00002a37_0000_1000_8000_00805f9b34fb);
pub const UUID_BATTERY_LEVEL: Uuid = Uuid::from_u128(0x00002a19_0000_1000_8000_00805f9b34fb);
pub const UUID_TEMPERATURE_MEASUREMENT: Uuid =
    Uuid::from_u128(0x00002a1c_0000_1000_8000_00805f9b34fb);
pub const UUID_BLOOD_PRESSURE_MEASUREMENT: Uuid =
    Uuid::from_u128(0x00002a35_0000_1000_8000_00805f9b34fb);
pub const UUID_MANUFACTURER_NAME: Uuid = Uuid::from_u128(0x00002a29_0000_1000_8000_00805f9b34fb);

/// Services a peripheral must advertise to show up in a scan
pub const SCAN_FILTER_SERVICES: [Uuid; 3] = [
    UUID_HEART_RATE_SERVICE,
    UUID_BATTERY_SERVICE,
    UUID_HEALTH_THERMOMETER_SERVICE,
];

/// Superset of services a session may probe after connecting, whether
/// advertised or not. Discovery in `session.rs` probes the first five; the
/// pulse-oximeter service is declared for hosts that pre-authorize GATT
/// access per service, but no subscription is wired up for it yet.
pub const OPTIONAL_SERVICES: [Uuid; 6] = [
    UUID_HEART_RATE_SERVICE,
    UUID_BATTERY_SERVICE,
    UUID_DEVICE_INFORMATION_SERVICE,
    UUID_HEALTH_THERMOMETER_SERVICE,
    UUID_BLOOD_PRESSURE_SERVICE,
    UUID_PULSE_OXIMETER_SERVICE,
];

/// Minimum signal strength for a discovered device to be offered
pub const MIN_RSSI_THRESHOLD: i16 = -80;

/// How long a scan waits for a matching advertisement before giving up.
/// A scan that resolves with no device is a cancellation, not an error.
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(15);

/// Interval at which a session checks the link for unsolicited loss
pub const LINK_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Minimum spacing between vitals writes to the persistent store
pub const VITALS_WRITE_MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Device type reported to the persistent device registry
pub const DEVICE_TYPE_SMARTWATCH: &str = "smartwatch";

/// AI capability score reported for Bluetooth wearables
pub const DEFAULT_AI_CAPABILITY: u8 = 85;

/// Source tag attached to vitals records produced by this layer
pub const VITALS_SOURCE_BLUETOOTH: &str = "bluetooth";

/// Capacity of the wearable event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;
