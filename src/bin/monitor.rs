//! Headless live monitor for wearable vitals.
//! Scans for a health wearable, connects, and prints readings as they
//! arrive. Intended for bringing up new devices without the dashboard shell.

use anyhow::{Result, bail};
use log::info;

use vitals_bridge::{Measurement, WearableEvent, WearableManager};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("Logging initialized");

    let manager = WearableManager::new().await;
    if !manager.is_supported() {
        bail!("Bluetooth LE is not supported on this platform");
    }

    println!("Scanning for wearable devices...");
    let Some(device) = manager.scan_and_connect().await? else {
        println!("No device found. Make sure your wearable is in pairing mode.");
        return Ok(());
    };

    println!(
        "Connected to {} ({}), sensors: {}",
        device.name,
        device.brand.as_deref().unwrap_or("unknown brand"),
        device
            .sensor_labels()
            .join(", ")
    );

    let mut events = manager.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Disconnecting...");
                manager.disconnect(&device.id).await;
                println!("{}", serde_json::to_string_pretty(&manager.snapshot())?);
                return Ok(());
            }
            event = events.recv() => match event {
                Ok(WearableEvent::VitalsUpdated { reading, .. }) => {
                    match reading.measurement {
                        Measurement::HeartRate(bpm) => println!("Heart rate: {} BPM", bpm),
                        Measurement::Temperature(c) => println!("Temperature: {:.1} °C", c),
                        Measurement::BloodPressure(bp) => {
                            println!("Blood pressure: {}/{} mmHg", bp.systolic, bp.diastolic)
                        }
                        Measurement::Spo2(pct) => println!("SpO2: {}%", pct),
                        Measurement::BatteryLevel(pct) => println!("Battery: {}%", pct),
                    }
                }
                Ok(WearableEvent::ConnectionLost { id }) => {
                    println!("Connection to {} was lost", id);
                    return Ok(());
                }
                Ok(_) => {}
                Err(_) => return Ok(()),
            }
        }
    }
}
