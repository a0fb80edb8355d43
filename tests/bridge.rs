//! Registry bridge tests: mirroring hub state into the persistent store.

mod support;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use support::{MockDeviceStore, MockVitalsStore, eventually};
use vitals_bridge::core::bluetooth::{DeviceInfo, Measurement, Reading, SensorKind};
use vitals_bridge::core::vitals::VitalsHub;
use vitals_bridge::storage::RegistryBridge;

fn watch_info(id: &str) -> DeviceInfo {
    DeviceInfo {
        id: id.to_string(),
        name: "Pulse S2".to_string(),
        brand: Some("Acme Health".to_string()),
        battery_level: Some(85),
        sensors: vec![SensorKind::Battery, SensorKind::HeartRate],
        connected: true,
    }
}

#[tokio::test]
async fn devices_are_upserted_on_connect_and_removed_on_disconnect() {
    let hub = VitalsHub::new();
    let devices = Arc::new(MockDeviceStore::default());
    let vitals = Arc::new(MockVitalsStore::default());
    let bridge = RegistryBridge::spawn(&hub, devices.clone(), vitals.clone());

    hub.device_connected(watch_info("watch-1"));
    eventually(|| devices.upserts.lock().unwrap().len() == 1).await;

    let record = devices.upserts.lock().unwrap()[0].clone();
    assert_eq!(record.name, "Pulse S2");
    assert_eq!(record.brand, "Acme Health");
    assert_eq!(record.device_type, "smartwatch");
    assert_eq!(record.bluetooth_id.as_deref(), Some("watch-1"));
    assert_eq!(record.battery_level, Some(85));
    assert_eq!(
        record.sensors,
        vec!["Battery".to_string(), "Heart Rate".to_string()]
    );
    assert!(record.is_connected);

    hub.device_removed("watch-1", false);
    eventually(|| devices.removed.lock().unwrap().len() == 1).await;
    assert_eq!(devices.removed.lock().unwrap()[0], "row-watch-1");

    bridge.shutdown().await;
}

#[tokio::test]
async fn lost_connections_also_clean_up_the_registry() {
    let hub = VitalsHub::new();
    let devices = Arc::new(MockDeviceStore::default());
    let vitals = Arc::new(MockVitalsStore::default());
    let bridge = RegistryBridge::spawn(&hub, devices.clone(), vitals.clone());

    hub.device_connected(watch_info("watch-1"));
    eventually(|| devices.upserts.lock().unwrap().len() == 1).await;

    hub.device_removed("watch-1", true);
    eventually(|| devices.removed.lock().unwrap().len() == 1).await;

    bridge.shutdown().await;
}

#[tokio::test]
async fn unchanged_device_records_are_not_rewritten() {
    let hub = VitalsHub::new();
    let devices = Arc::new(MockDeviceStore::default());
    let vitals = Arc::new(MockVitalsStore::default());
    let bridge = RegistryBridge::spawn(&hub, devices.clone(), vitals.clone());

    hub.device_connected(watch_info("watch-1"));
    hub.device_connected(watch_info("watch-1"));
    eventually(|| devices.upserts.lock().unwrap().len() == 1).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(devices.upserts.lock().unwrap().len(), 1);

    bridge.shutdown().await;
}

#[tokio::test]
async fn vitals_readings_are_appended_to_the_history() {
    let hub = VitalsHub::new();
    let devices = Arc::new(MockDeviceStore::default());
    let vitals = Arc::new(MockVitalsStore::default());
    let bridge = RegistryBridge::spawn(&hub, devices.clone(), vitals.clone());

    hub.device_connected(watch_info("watch-1"));
    eventually(|| devices.upserts.lock().unwrap().len() == 1).await;

    hub.push_reading("watch-1", Reading::now(Measurement::HeartRate(70)));
    eventually(|| vitals.records.lock().unwrap().len() == 1).await;

    let record = vitals.records.lock().unwrap()[0].clone();
    assert_eq!(record.heart_rate, Some(70));
    assert_eq!(record.source, "bluetooth");
    assert_eq!(record.device_id.as_deref(), Some("row-watch-1"));

    bridge.shutdown().await;
}

#[tokio::test]
async fn battery_only_updates_do_not_create_vitals_rows() {
    let hub = VitalsHub::new();
    let devices = Arc::new(MockDeviceStore::default());
    let vitals = Arc::new(MockVitalsStore::default());
    let bridge = RegistryBridge::spawn(&hub, devices.clone(), vitals.clone());

    hub.device_connected(watch_info("watch-1"));
    hub.push_reading("watch-1", Reading::now(Measurement::BatteryLevel(60)));

    // the battery change shows up as a device update...
    eventually(|| {
        devices
            .upserts
            .lock()
            .unwrap()
            .last()
            .map(|r| r.battery_level == Some(60))
            .unwrap_or(false)
    })
    .await;
    // ...but never as a vitals record
    assert!(vitals.records.lock().unwrap().is_empty());

    bridge.shutdown().await;
}

#[tokio::test]
async fn store_failures_never_touch_live_state() {
    let hub = VitalsHub::new();
    let devices = Arc::new(MockDeviceStore::default());
    let vitals = Arc::new(MockVitalsStore::default());
    let bridge = RegistryBridge::spawn(&hub, devices.clone(), vitals.clone());

    devices.fail.store(true, Ordering::SeqCst);
    hub.device_connected(watch_info("watch-1"));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // the write failed, the live registry did not roll back
    assert!(devices.upserts.lock().unwrap().is_empty());
    assert_eq!(hub.devices().len(), 1);

    // once the store recovers, the next event lands (no stale debounce entry)
    devices.fail.store(false, Ordering::SeqCst);
    hub.push_reading("watch-1", Reading::now(Measurement::BatteryLevel(50)));
    eventually(|| devices.upserts.lock().unwrap().len() == 1).await;

    bridge.shutdown().await;
}
