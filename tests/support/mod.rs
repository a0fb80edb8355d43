//! In-memory doubles for the platform seam and the persistent store.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use vitals_bridge::core::bluetooth::{BleBackend, NotificationStream, PeripheralLink};
use vitals_bridge::error::{LinkError, ScanError, StoreError};
use vitals_bridge::storage::{DeviceRecord, DeviceStore, VitalsRecord, VitalsStore};

/// A scripted peripheral: a fixed set of services, canned characteristic
/// values, and channels to inject notifications or drop the link.
pub struct MockLink {
    id: String,
    name: Option<String>,
    services: HashSet<Uuid>,
    reads: Mutex<HashMap<(Uuid, Uuid), Vec<u8>>>,
    senders: Mutex<HashMap<(Uuid, Uuid), mpsc::UnboundedSender<Vec<u8>>>>,
    lost: CancellationToken,
    open: AtomicBool,
    fail_open: AtomicBool,
}

impl MockLink {
    pub fn new(id: &str, name: &str, services: &[Uuid]) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            name: Some(name.to_string()),
            services: services.iter().copied().collect(),
            reads: Mutex::new(HashMap::new()),
            senders: Mutex::new(HashMap::new()),
            lost: CancellationToken::new(),
            open: AtomicBool::new(false),
            fail_open: AtomicBool::new(false),
        })
    }

    pub fn set_read(&self, service: Uuid, characteristic: Uuid, value: Vec<u8>) {
        self.reads
            .lock()
            .unwrap()
            .insert((service, characteristic), value);
    }

    pub fn fail_next_open(&self) {
        self.fail_open.store(true, Ordering::SeqCst);
    }

    /// Injects one notification; false when nothing is subscribed.
    pub fn notify(&self, service: Uuid, characteristic: Uuid, payload: Vec<u8>) -> bool {
        self.senders
            .lock()
            .unwrap()
            .get(&(service, characteristic))
            .map(|tx| tx.send(payload).is_ok())
            .unwrap_or(false)
    }

    /// Simulates unsolicited link loss.
    pub fn drop_link(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.lost.cancel();
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PeripheralLink for MockLink {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    async fn open(&self) -> Result<(), LinkError> {
        if self.fail_open.swap(false, Ordering::SeqCst) {
            return Err(LinkError::Transport("link establishment failed".into()));
        }
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), LinkError> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn read(&self, service: Uuid, characteristic: Uuid) -> Result<Vec<u8>, LinkError> {
        if !self.services.contains(&service) {
            return Err(LinkError::ServiceNotFound(service));
        }
        self.reads
            .lock()
            .unwrap()
            .get(&(service, characteristic))
            .cloned()
            .ok_or(LinkError::CharacteristicNotFound(characteristic))
    }

    async fn subscribe(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<NotificationStream, LinkError> {
        if !self.services.contains(&service) {
            return Err(LinkError::ServiceNotFound(service));
        }
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.senders
            .lock()
            .unwrap()
            .insert((service, characteristic), tx);
        Ok(Box::pin(futures_util::stream::poll_fn(move |cx| {
            rx.poll_recv(cx)
        })))
    }

    async fn lost(&self) {
        self.lost.cancelled().await
    }
}

/// Backend handing out a scripted sequence of scan results.
pub struct MockBackend {
    supported: bool,
    results: Mutex<Vec<Option<Arc<dyn PeripheralLink>>>>,
}

impl MockBackend {
    pub fn new(supported: bool) -> Arc<Self> {
        Arc::new(Self {
            supported,
            results: Mutex::new(Vec::new()),
        })
    }

    pub fn queue(&self, link: Option<Arc<dyn PeripheralLink>>) {
        self.results.lock().unwrap().insert(0, link);
    }
}

#[async_trait]
impl BleBackend for MockBackend {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn request_peripheral(&self) -> Result<Option<Arc<dyn PeripheralLink>>, ScanError> {
        Ok(self.results.lock().unwrap().pop().flatten())
    }
}

/// Recording device store with a failure switch.
#[derive(Default)]
pub struct MockDeviceStore {
    pub upserts: Mutex<Vec<DeviceRecord>>,
    pub removed: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl DeviceStore for MockDeviceStore {
    async fn upsert_device(&self, record: DeviceRecord) -> Result<String, StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write rejected".into()));
        }
        let store_id = format!(
            "row-{}",
            record.bluetooth_id.as_deref().unwrap_or("unknown")
        );
        self.upserts.lock().unwrap().push(record);
        Ok(store_id)
    }

    async fn remove_device(&self, id: &str) -> Result<(), StoreError> {
        self.removed.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

/// Recording vitals store.
#[derive(Default)]
pub struct MockVitalsStore {
    pub records: Mutex<Vec<VitalsRecord>>,
}

#[async_trait]
impl VitalsStore for MockVitalsStore {
    async fn record_vitals(&self, record: VitalsRecord) -> Result<(), StoreError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

/// Polls `condition` until it holds or a second has passed.
pub async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within one second");
}
