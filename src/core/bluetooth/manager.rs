//! Facade over the wearable connectivity core.
//! This is the surface the hosting shell (UI, routing, commands) talks to:
//! capability check, scanning, session lifecycle and the live vitals views.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::core::bluetooth::bluest_link::BluestBackend;
use crate::core::bluetooth::link::{BleBackend, PeripheralLink};
use crate::core::bluetooth::scanner::WearableScanner;
use crate::core::bluetooth::session::SessionManager;
use crate::core::bluetooth::types::{DeviceInfo, VitalsSnapshot, WearableEvent};
use crate::core::vitals::VitalsHub;
use crate::error::{ConnectError, ScanError, WearableError};

/// Ties the scanner, session manager and vitals hub together behind one
/// handle. UI code only reads snapshots and issues scan / connect /
/// disconnect commands; all registry mutation happens inside the core.
pub struct WearableManager {
    scanner: WearableScanner,
    sessions: SessionManager,
    hub: VitalsHub,
}

impl WearableManager {
    /// Creates a manager backed by the platform Bluetooth stack.
    pub async fn new() -> Self {
        Self::with_backend(Arc::new(BluestBackend::new().await))
    }

    /// Creates a manager over any backend; tests use an in-memory one.
    pub fn with_backend(backend: Arc<dyn BleBackend>) -> Self {
        let hub = VitalsHub::new();
        Self {
            scanner: WearableScanner::new(backend),
            sessions: SessionManager::new(hub.clone()),
            hub,
        }
    }

    /// Whether the platform can scan for BLE peripherals at all.
    pub fn is_supported(&self) -> bool {
        self.scanner.is_supported()
    }

    /// Scans for a wearable; `Ok(None)` means nothing was selected.
    pub async fn scan(&self) -> Result<Option<Arc<dyn PeripheralLink>>, ScanError> {
        self.scanner.scan().await
    }

    /// Opens a session to a previously scanned peripheral.
    pub async fn connect(
        &self,
        link: Arc<dyn PeripheralLink>,
    ) -> Result<DeviceInfo, ConnectError> {
        self.sessions.connect(link).await
    }

    /// Scan and connect in one step, the way the dashboard's scan button
    /// behaves. `Ok(None)` when the scan was cancelled.
    pub async fn scan_and_connect(&self) -> Result<Option<DeviceInfo>, WearableError> {
        match self.scanner.scan().await? {
            Some(link) => Ok(Some(self.sessions.connect(link).await?)),
            None => Ok(None),
        }
    }

    /// Tears down the session for a peripheral. Idempotent.
    pub async fn disconnect(&self, id: &str) {
        self.sessions.disconnect(id).await
    }

    /// Whether a session is currently open for the given peripheral id.
    pub async fn is_connected(&self, id: &str) -> bool {
        self.sessions.is_connected(id).await
    }

    /// Latest merged readings across all connected devices.
    pub fn snapshot(&self) -> VitalsSnapshot {
        self.hub.snapshot()
    }

    /// Live list of connected devices.
    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.hub.devices()
    }

    /// Subscribes to snapshot and device-list changes.
    pub fn subscribe(&self) -> broadcast::Receiver<WearableEvent> {
        self.hub.subscribe()
    }

    /// The underlying hub, for wiring collaborators like the registry bridge.
    pub fn hub(&self) -> &VitalsHub {
        &self.hub
    }
}
