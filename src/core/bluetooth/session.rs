//! GATT session lifecycle for wearable peripherals.
//! Owns the per-device session registry: connecting, per-service discovery,
//! notification pumping into the vitals hub, and teardown on request or on
//! unsolicited link loss.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::codec;
use crate::core::bluetooth::constants::{
    UUID_BATTERY_LEVEL, UUID_BATTERY_SERVICE, UUID_DEVICE_INFORMATION_SERVICE,
    UUID_HEART_RATE_MEASUREMENT, UUID_HEART_RATE_SERVICE, UUID_MANUFACTURER_NAME,
};
use crate::core::bluetooth::link::{NotificationStream, PeripheralLink};
use crate::core::bluetooth::types::{DeviceInfo, Measurement, Reading, SensorKind};
use crate::core::vitals::VitalsHub;
use crate::error::{ConnectError, DecodeError};

/// State held for one open session. Dropping the handle after cancelling its
/// token is the whole teardown; outstanding notification callbacks resolve
/// against a hub that no longer lists the device and are ignored there.
struct SessionHandle {
    link: Arc<dyn PeripheralLink>,
    cancel: CancellationToken,
    info: DeviceInfo,
}

/// Manages sessions for all connected peripherals. At most one session is
/// active per peripheral id.
#[derive(Clone)]
pub struct SessionManager {
    hub: VitalsHub,
    sessions: Arc<Mutex<HashMap<String, SessionHandle>>>,
}

impl SessionManager {
    pub fn new(hub: VitalsHub) -> Self {
        Self {
            hub,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Opens a session to the peripheral and discovers its sensors. Only a
    /// total link failure is an error; each supported service is probed
    /// independently and a missing one just shrinks the device's sensor set.
    /// Connecting to an id that already has a session returns the existing
    /// device summary.
    pub async fn connect(&self, link: Arc<dyn PeripheralLink>) -> Result<DeviceInfo, ConnectError> {
        let id = link.id();
        if let Some(existing) = self.sessions.lock().await.get(&id) {
            info!("Peripheral {} already has an active session", id);
            return Ok(existing.info.clone());
        }

        info!("Connecting to peripheral {}...", id);
        link.open().await?;
        info!("Link to {} established, discovering services...", id);

        let mut sensors = Vec::new();
        let mut subscriptions: Vec<(SensorKind, NotificationStream)> = Vec::new();
        let mut initial_readings = Vec::new();

        let brand = match link
            .read(UUID_DEVICE_INFORMATION_SERVICE, UUID_MANUFACTURER_NAME)
            .await
        {
            Ok(raw) => {
                let name = String::from_utf8_lossy(&raw)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string();
                (!name.is_empty()).then_some(name)
            }
            Err(e) => {
                debug!("Device information not available on {}: {}", id, e);
                None
            }
        };

        let mut battery_level = None;
        match link.read(UUID_BATTERY_SERVICE, UUID_BATTERY_LEVEL).await {
            Ok(raw) => match codec::decode_battery_level(&raw) {
                Ok(pct) => {
                    battery_level = Some(pct);
                    sensors.push(SensorKind::Battery);
                    initial_readings.push(Reading::now(Measurement::BatteryLevel(pct)));
                }
                Err(e) => debug!("Discarding malformed battery value from {}: {}", id, e),
            },
            Err(e) => debug!("Battery service not available on {}: {}", id, e),
        }

        for kind in SensorKind::STREAMING {
            match link.subscribe(kind.service(), kind.characteristic()).await {
                Ok(stream) => {
                    sensors.push(kind);
                    subscriptions.push((kind, stream));
                }
                Err(e) => debug!("{} service not available on {}: {}", kind.label(), id, e),
            }
        }

        // seed the snapshot with the current heart rate before the first
        // notification arrives
        if sensors.contains(&SensorKind::HeartRate) {
            if let Ok(raw) = link
                .read(UUID_HEART_RATE_SERVICE, UUID_HEART_RATE_MEASUREMENT)
                .await
            {
                match codec::decode_heart_rate(&raw) {
                    Ok(bpm) => initial_readings.push(Reading::now(Measurement::HeartRate(bpm))),
                    Err(e) => debug!("Discarding initial heart rate from {}: {}", id, e),
                }
            }
        }

        let info = DeviceInfo {
            id: id.clone(),
            name: link.name().unwrap_or_else(|| "Unknown Device".to_string()),
            brand,
            battery_level,
            sensors,
            connected: true,
        };

        let cancel = CancellationToken::new();
        {
            let mut sessions = self.sessions.lock().await;
            // a racing connect for the same id keeps the first session
            if let Some(existing) = sessions.get(&id) {
                cancel.cancel();
                return Ok(existing.info.clone());
            }
            sessions.insert(
                id.clone(),
                SessionHandle {
                    link: link.clone(),
                    cancel: cancel.clone(),
                    info: info.clone(),
                },
            );
        }

        self.hub.device_connected(info.clone());
        for reading in initial_readings {
            self.hub.push_reading(&id, reading);
        }

        info!(
            "Connected to {} ({}) with {} sensor(s)",
            id,
            info.name,
            info.sensors.len()
        );

        for (kind, stream) in subscriptions {
            tokio::spawn(Self::pump_notifications(
                kind,
                stream,
                id.clone(),
                self.hub.clone(),
                cancel.child_token(),
            ));
        }
        tokio::spawn(Self::watch_link(
            link,
            id,
            self.sessions.clone(),
            self.hub.clone(),
            cancel,
        ));

        Ok(info)
    }

    /// Explicit teardown. Idempotent: a second call for the same id is a
    /// silent no-op, and teardown itself never fails the caller.
    pub async fn disconnect(&self, id: &str) {
        let handle = self.sessions.lock().await.remove(id);
        let Some(handle) = handle else {
            debug!("Disconnect for {} ignored: no active session", id);
            return;
        };

        info!("Disconnecting from {}", id);
        // stops the pumps and the loss watcher before the link goes down,
        // so an orderly close is never reported as a lost connection
        handle.cancel.cancel();
        if let Err(e) = handle.link.close().await {
            warn!("Error closing link to {}: {}", id, e);
        }
        self.hub.device_removed(id, false);
    }

    /// Whether a session is currently open for the given peripheral id.
    pub async fn is_connected(&self, id: &str) -> bool {
        self.sessions.lock().await.contains_key(id)
    }

    /// Forwards notifications for one characteristic into the hub, in
    /// delivery order. Malformed payloads are dropped at event granularity.
    async fn pump_notifications(
        kind: SensorKind,
        mut stream: NotificationStream,
        id: String,
        hub: VitalsHub,
        cancel: CancellationToken,
    ) {
        debug!("Listening for {} notifications from {}", kind.label(), id);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                next = stream.next() => match next {
                    Some(payload) => match Self::decode(kind, &payload) {
                        Ok(measurement) => {
                            hub.push_reading(&id, Reading::now(measurement));
                        }
                        Err(e) => debug!(
                            "Discarding malformed {} payload from {}: {}",
                            kind.label(),
                            id,
                            e
                        ),
                    },
                    None => {
                        debug!("{} notification stream from {} ended", kind.label(), id);
                        break;
                    }
                }
            }
        }
    }

    fn decode(kind: SensorKind, payload: &[u8]) -> Result<Measurement, DecodeError> {
        match kind {
            SensorKind::HeartRate => codec::decode_heart_rate(payload).map(Measurement::HeartRate),
            SensorKind::Temperature => {
                codec::decode_temperature(payload).map(Measurement::Temperature)
            }
            SensorKind::BloodPressure => {
                codec::decode_blood_pressure(payload).map(Measurement::BloodPressure)
            }
            SensorKind::Battery => {
                codec::decode_battery_level(payload).map(Measurement::BatteryLevel)
            }
        }
    }

    /// Watches for unsolicited link loss and performs the same cleanup as an
    /// explicit disconnect, surfaced as the alert-worthy event instead.
    async fn watch_link(
        link: Arc<dyn PeripheralLink>,
        id: String,
        sessions: Arc<Mutex<HashMap<String, SessionHandle>>>,
        hub: VitalsHub,
        cancel: CancellationToken,
    ) {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = link.lost() => {}
        }

        warn!("Lost connection to {}", id);
        let handle = sessions.lock().await.remove(&id);
        if let Some(handle) = handle {
            handle.cancel.cancel();
            hub.device_removed(&id, true);
        }
    }
}
