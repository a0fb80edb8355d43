//! Live vitals aggregation across connected wearables.
//! The hub owns the merged [`VitalsSnapshot`] and the connected-device list,
//! applies every change atomically under one lock, and broadcasts a
//! [`WearableEvent`] after each applied change.

use std::sync::{Arc, Mutex};

use log::debug;
use tokio::sync::broadcast;

use crate::core::bluetooth::{
    DeviceInfo, EVENT_CHANNEL_CAPACITY, Measurement, Reading, VitalsSnapshot, WearableEvent,
};

/// Reactive store for the latest readings and the connected-device registry.
/// Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct VitalsHub {
    state: Arc<Mutex<HubState>>,
    events: broadcast::Sender<WearableEvent>,
}

#[derive(Default)]
struct HubState {
    snapshot: VitalsSnapshot,
    /// Connection order is preserved for display
    devices: Vec<DeviceInfo>,
}

impl VitalsHub {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(HubState::default())),
            events,
        }
    }

    /// Current merged view: latest value per measurement kind, last write
    /// wins regardless of source device.
    pub fn snapshot(&self) -> VitalsSnapshot {
        self.lock().snapshot.clone()
    }

    /// Currently connected peripherals, in connection order.
    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.lock().devices.clone()
    }

    /// Subscribes to every subsequent change of the snapshot or device list.
    pub fn subscribe(&self) -> broadcast::Receiver<WearableEvent> {
        self.events.subscribe()
    }

    /// Registers a freshly connected device, replacing any stale entry with
    /// the same id.
    pub fn device_connected(&self, info: DeviceInfo) {
        {
            let mut state = self.lock();
            state.devices.retain(|d| d.id != info.id);
            state.devices.push(info.clone());
        }
        self.emit(WearableEvent::DeviceConnected(info));
    }

    /// Drops a device from the live list. Snapshot values it contributed are
    /// deliberately kept; only the device entry goes away. Returns false if
    /// the device was already gone, in which case nothing is emitted.
    pub fn device_removed(&self, id: &str, lost: bool) -> bool {
        let removed = {
            let mut state = self.lock();
            let before = state.devices.len();
            state.devices.retain(|d| d.id != id);
            state.devices.len() != before
        };
        if removed {
            let id = id.to_string();
            self.emit(if lost {
                WearableEvent::ConnectionLost { id }
            } else {
                WearableEvent::DeviceDisconnected { id }
            });
        }
        removed
    }

    /// Merges one decoded reading into the snapshot. Readings from devices
    /// not in the live list are dropped, so late notifications from a torn
    /// down session cannot resurrect its values. Returns whether the reading
    /// was merged.
    pub fn push_reading(&self, device_id: &str, reading: Reading) -> bool {
        let (merged_snapshot, device_update) = {
            let mut state = self.lock();
            if !state.devices.iter().any(|d| d.id == device_id) {
                debug!("Dropping reading from unknown device {}", device_id);
                return false;
            }

            let mut device_update = None;
            match reading.measurement {
                Measurement::HeartRate(bpm) => state.snapshot.heart_rate = Some(bpm),
                Measurement::Temperature(celsius) => state.snapshot.temperature = Some(celsius),
                Measurement::BloodPressure(bp) => state.snapshot.blood_pressure = Some(bp),
                Measurement::Spo2(pct) => state.snapshot.spo2 = Some(pct),
                Measurement::BatteryLevel(pct) => {
                    state.snapshot.battery_level = Some(pct);
                    // battery readings also refresh the owning device summary
                    if let Some(device) = state.devices.iter_mut().find(|d| d.id == device_id) {
                        if device.battery_level != Some(pct) {
                            device.battery_level = Some(pct);
                            device_update = Some(device.clone());
                        }
                    }
                }
            }
            (state.snapshot.clone(), device_update)
        };

        if let Some(info) = device_update {
            self.emit(WearableEvent::DeviceUpdated(info));
        }
        self.emit(WearableEvent::VitalsUpdated {
            device_id: device_id.to_string(),
            reading,
            snapshot: merged_snapshot,
        });
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HubState> {
        // the hub never panics while holding the lock
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: WearableEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for VitalsHub {
    fn default() -> Self {
        Self::new()
    }
}
