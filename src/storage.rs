//! Boundary to the external persistent record store.
//! The store itself (a managed backend scoped to an authenticated user) is
//! not part of this crate; it is consumed through the two traits below. The
//! [`RegistryBridge`] mirrors the in-memory device registry and vitals into
//! it, fire-and-forget: persistence failures are logged and never block or
//! roll back live state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::{
    DEFAULT_AI_CAPABILITY, DEVICE_TYPE_SMARTWATCH, DeviceInfo, VITALS_SOURCE_BLUETOOTH,
    VITALS_WRITE_MIN_INTERVAL, VitalsSnapshot, WearableEvent,
};
use crate::core::vitals::VitalsHub;
use crate::error::StoreError;

/// Row shape of the persistent device registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub name: String,
    pub brand: String,
    pub device_type: String,
    pub bluetooth_id: Option<String>,
    pub is_connected: bool,
    pub battery_level: Option<u8>,
    pub sensors: Vec<String>,
    pub ai_capability: u8,
}

impl DeviceRecord {
    pub fn from_info(info: &DeviceInfo) -> Self {
        Self {
            name: info.name.clone(),
            brand: info
                .brand
                .clone()
                .unwrap_or_else(|| "Bluetooth Device".to_string()),
            device_type: DEVICE_TYPE_SMARTWATCH.to_string(),
            bluetooth_id: Some(info.id.clone()),
            is_connected: info.connected,
            battery_level: info.battery_level,
            sensors: info.sensor_labels(),
            ai_capability: DEFAULT_AI_CAPABILITY,
        }
    }
}

/// Row shape of the append-only vitals history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalsRecord {
    pub heart_rate: Option<u16>,
    pub temperature: Option<f32>,
    pub spo2: Option<u8>,
    pub blood_pressure_systolic: Option<u16>,
    pub blood_pressure_diastolic: Option<u16>,
    pub source: String,
    pub device_id: Option<String>,
}

impl VitalsRecord {
    pub fn from_snapshot(snapshot: &VitalsSnapshot, device_id: Option<String>) -> Self {
        Self {
            heart_rate: snapshot.heart_rate,
            temperature: snapshot.temperature,
            spo2: snapshot.spo2,
            blood_pressure_systolic: snapshot.blood_pressure.map(|bp| bp.systolic),
            blood_pressure_diastolic: snapshot.blood_pressure.map(|bp| bp.diastolic),
            source: VITALS_SOURCE_BLUETOOTH.to_string(),
            device_id,
        }
    }
}

/// Persistent registry of the user's devices.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Creates or updates a device row; returns the store's id for it.
    async fn upsert_device(&self, record: DeviceRecord) -> Result<String, StoreError>;
    async fn remove_device(&self, id: &str) -> Result<(), StoreError>;
}

/// Append-only vitals history. This crate never updates or deletes rows.
#[async_trait]
pub trait VitalsStore: Send + Sync {
    async fn record_vitals(&self, record: VitalsRecord) -> Result<(), StoreError>;
}

/// Background task mirroring hub events into the persistent store.
pub struct RegistryBridge {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RegistryBridge {
    /// Starts mirroring. Device upserts are debounced (an unchanged record
    /// is not rewritten) and vitals writes are rate-limited per device.
    pub fn spawn(
        hub: &VitalsHub,
        devices: Arc<dyn DeviceStore>,
        vitals: Arc<dyn VitalsStore>,
    ) -> Self {
        let events = hub.subscribe();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(Self::run(events, devices, vitals, cancel.clone()));
        Self { cancel, task }
    }

    /// Stops the mirror task. Already-issued writes are not awaited; the
    /// store is best-effort by design.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }

    async fn run(
        mut events: tokio::sync::broadcast::Receiver<WearableEvent>,
        devices: Arc<dyn DeviceStore>,
        vitals: Arc<dyn VitalsStore>,
        cancel: CancellationToken,
    ) {
        // peripheral id -> (store id, last written record)
        let mut written: HashMap<String, (String, DeviceRecord)> = HashMap::new();
        // peripheral id -> last vitals write
        let mut last_vitals: HashMap<String, Instant> = HashMap::new();

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Registry bridge lagged, {} events dropped", missed);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            match event {
                WearableEvent::DeviceConnected(info) | WearableEvent::DeviceUpdated(info) => {
                    let record = DeviceRecord::from_info(&info);
                    if let Some((_, last)) = written.get(&info.id) {
                        if *last == record {
                            debug!("Skipping unchanged device record for {}", info.id);
                            continue;
                        }
                    }
                    match devices.upsert_device(record.clone()).await {
                        Ok(store_id) => {
                            written.insert(info.id.clone(), (store_id, record));
                        }
                        Err(e) => warn!("Failed to persist device {}: {}", info.id, e),
                    }
                }
                WearableEvent::DeviceDisconnected { id } | WearableEvent::ConnectionLost { id } => {
                    last_vitals.remove(&id);
                    if let Some((store_id, _)) = written.remove(&id) {
                        if let Err(e) = devices.remove_device(&store_id).await {
                            warn!("Failed to remove device {} from registry: {}", id, e);
                        }
                    }
                }
                WearableEvent::VitalsUpdated {
                    device_id,
                    snapshot,
                    ..
                } => {
                    if !snapshot.has_vitals() {
                        continue;
                    }
                    if let Some(last) = last_vitals.get(&device_id) {
                        if last.elapsed() < VITALS_WRITE_MIN_INTERVAL {
                            continue;
                        }
                    }
                    let store_id = written.get(&device_id).map(|(id, _)| id.clone());
                    let record = VitalsRecord::from_snapshot(&snapshot, store_id);
                    match vitals.record_vitals(record).await {
                        Ok(()) => {
                            last_vitals.insert(device_id, Instant::now());
                        }
                        Err(e) => warn!("Failed to record vitals: {}", e),
                    }
                }
            }
        }
        info!("Registry bridge stopped");
    }
}
