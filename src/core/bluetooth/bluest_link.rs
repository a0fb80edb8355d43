//! `bluest`-backed implementation of the platform seam.
//! This is the only module that touches the OS Bluetooth stack.

use std::sync::Arc;

use async_trait::async_trait;
use bluest::{Adapter, Characteristic, Device};
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use regex::Regex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::bluetooth::constants::{
    LINK_POLL_INTERVAL, MIN_RSSI_THRESHOLD, SCAN_FILTER_SERVICES, SCAN_TIMEOUT,
};
use crate::core::bluetooth::link::{BleBackend, NotificationStream, PeripheralLink};
use crate::error::{LinkError, ScanError};

impl From<bluest::Error> for LinkError {
    fn from(e: bluest::Error) -> Self {
        LinkError::Transport(e.to_string())
    }
}

/// Platform Bluetooth capability. Construction probes for a default adapter;
/// a host without one is reported as unsupported, not as an error.
pub struct BluestBackend {
    adapter: Option<Adapter>,
}

impl BluestBackend {
    pub async fn new() -> Self {
        let adapter = Adapter::default().await;
        match &adapter {
            Some(_) => info!("Bluetooth adapter is available"),
            None => warn!("No Bluetooth adapter found; wearable features are disabled"),
        }
        Self { adapter }
    }
}

#[async_trait]
impl BleBackend for BluestBackend {
    fn is_supported(&self) -> bool {
        self.adapter.is_some()
    }

    /// Picks the first peripheral advertising one of the supported health
    /// services with adequate signal strength. Already-connected matching
    /// devices are offered before the radio scan starts. Resolving with no
    /// device inside the scan window is a cancellation, not an error.
    async fn request_peripheral(&self) -> Result<Option<Arc<dyn PeripheralLink>>, ScanError> {
        let adapter = self.adapter.as_ref().ok_or(ScanError::Unsupported)?;
        adapter
            .wait_available()
            .await
            .map_err(|e| ScanError::Adapter(e.to_string()))?;

        debug!("Checking for already-connected wearables");
        match adapter
            .connected_devices_with_services(&SCAN_FILTER_SERVICES)
            .await
        {
            Ok(devices) => {
                if let Some(device) = devices.into_iter().next() {
                    info!(
                        "Reusing connected wearable {} (address {})",
                        device.id(),
                        extract_mac_address(&device.id().to_string())
                            .unwrap_or_else(|| "N/A".to_string())
                    );
                    return Ok(Some(Arc::new(BluestLink::new(adapter.clone(), device))));
                }
            }
            Err(e) => debug!("Connected-device lookup failed: {}", e),
        }

        info!("Starting Bluetooth scan for health services");
        let mut scan = adapter
            .scan(&SCAN_FILTER_SERVICES)
            .await
            .map_err(|e| ScanError::Adapter(e.to_string()))?;

        let deadline = tokio::time::sleep(SCAN_TIMEOUT);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    info!("Scan window elapsed with no device selected");
                    return Ok(None);
                }
                next = scan.next() => match next {
                    Some(discovered) => {
                        let device = discovered.device;
                        let rssi = discovered.rssi;
                        debug!("Found device {:?}, RSSI {:?}", device, rssi);

                        // only offer devices with medium or stronger signal
                        if let Some(signal_strength) = rssi {
                            if signal_strength >= MIN_RSSI_THRESHOLD {
                                info!(
                                    "Selected wearable {} (address {}, RSSI {})",
                                    device.id(),
                                    extract_mac_address(&device.id().to_string())
                                        .unwrap_or_else(|| "N/A".to_string()),
                                    signal_strength
                                );
                                return Ok(Some(Arc::new(BluestLink::new(
                                    adapter.clone(),
                                    device,
                                ))));
                            }
                        }
                    }
                    None => {
                        info!("Bluetooth scan stream has ended");
                        return Ok(None);
                    }
                }
            }
        }
    }
}

/// Attribute-protocol link to one peripheral via `bluest`.
pub struct BluestLink {
    adapter: Adapter,
    device: Device,
}

impl BluestLink {
    pub fn new(adapter: Adapter, device: Device) -> Self {
        Self { adapter, device }
    }

    async fn find_characteristic(
        &self,
        service_uuid: Uuid,
        characteristic_uuid: Uuid,
    ) -> Result<Characteristic, LinkError> {
        let services = self.device.services().await?;
        let service = services
            .iter()
            .find(|s| s.uuid() == service_uuid)
            .ok_or(LinkError::ServiceNotFound(service_uuid))?;

        let characteristics = service.characteristics().await?;
        characteristics
            .into_iter()
            .find(|c| c.uuid() == characteristic_uuid)
            .ok_or(LinkError::CharacteristicNotFound(characteristic_uuid))
    }
}

#[async_trait]
impl PeripheralLink for BluestLink {
    fn id(&self) -> String {
        self.device.id().to_string()
    }

    fn name(&self) -> Option<String> {
        self.device.name().ok()
    }

    async fn open(&self) -> Result<(), LinkError> {
        if !self.device.is_connected().await {
            info!("Initiating connection to {}...", self.device.id());
            self.adapter.connect_device(&self.device).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), LinkError> {
        if self.device.is_connected().await {
            info!("Disconnecting from device {}", self.device.id());
            self.adapter.disconnect_device(&self.device).await?;
        } else {
            debug!("Device {} not connected", self.device.id());
        }
        Ok(())
    }

    async fn read(&self, service: Uuid, characteristic: Uuid) -> Result<Vec<u8>, LinkError> {
        let characteristic = self.find_characteristic(service, characteristic).await?;
        Ok(characteristic.read().await?)
    }

    /// Bridges the borrowed `bluest` notification stream into an owned one:
    /// a forwarding task holds the characteristic and pushes payloads into a
    /// channel until the subscriber goes away or the stream errors out.
    async fn subscribe(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<NotificationStream, LinkError> {
        let characteristic = self.find_characteristic(service, characteristic).await?;
        let (tx, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            match characteristic.notify().await {
                Ok(mut notifications) => {
                    while let Some(result) = notifications.next().await {
                        match result {
                            Ok(value) => {
                                if tx.send(value).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("Error in notification stream: {}", e);
                                break;
                            }
                        }
                    }
                }
                Err(e) => error!("Failed to subscribe to notifications: {}", e),
            }
            debug!("Notification stream ended");
        });

        Ok(Box::pin(futures_util::stream::poll_fn(move |cx| {
            rx.poll_recv(cx)
        })))
    }

    async fn lost(&self) {
        loop {
            tokio::time::sleep(LINK_POLL_INTERVAL).await;
            if !self.device.is_connected().await {
                return;
            }
        }
    }
}

/// Best-effort MAC address out of a platform device id; some platforms embed
/// it, macOS ids do not.
fn extract_mac_address(device_id_str: &str) -> Option<String> {
    let re = Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").ok()?;
    re.find_iter(device_id_str)
        .last()
        .map(|m| m.as_str().to_uppercase())
}
