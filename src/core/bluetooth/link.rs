//! Platform seam for the Bluetooth core.
//! The session manager and scanner speak to the radio only through these
//! traits; the production implementation wraps `bluest` (see
//! `bluest_link.rs`) and tests substitute an in-memory link.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::Stream;
use uuid::Uuid;

use crate::error::{LinkError, ScanError};

/// Ordered stream of raw notification payloads for one characteristic.
/// The stream ending means the subscription is gone; the link-loss watcher
/// decides whether that warrants session teardown.
pub type NotificationStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// Entry point to the platform's Bluetooth LE capability.
#[async_trait]
pub trait BleBackend: Send + Sync {
    /// Whether the platform can perform BLE scanning at all. Must be
    /// consulted before any scan attempt.
    fn is_supported(&self) -> bool;

    /// Presents the platform's device-selection affordance, filtered by the
    /// supported-service allow-list. Resolves to `None` when no device is
    /// selected, which is not an error.
    async fn request_peripheral(&self) -> Result<Option<Arc<dyn PeripheralLink>>, ScanError>;
}

/// An attribute-protocol link to one peripheral.
#[async_trait]
pub trait PeripheralLink: Send + Sync {
    /// Platform-unique peripheral identifier
    fn id(&self) -> String;

    /// Advertised device name, if the platform knows one
    fn name(&self) -> Option<String>;

    /// Opens the GATT connection. Failure here is the only hard
    /// connection error.
    async fn open(&self) -> Result<(), LinkError>;

    /// Closes the GATT connection. Safe to call on an already-closed link.
    async fn close(&self) -> Result<(), LinkError>;

    /// Reads the current value of one characteristic.
    async fn read(&self, service: Uuid, characteristic: Uuid) -> Result<Vec<u8>, LinkError>;

    /// Subscribes to notifications for one characteristic. Delivery order
    /// follows the underlying link.
    async fn subscribe(
        &self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<NotificationStream, LinkError>;

    /// Resolves once the link is no longer connected. The session manager
    /// cancels its watcher before an orderly close, so only unsolicited
    /// losses are observed through this.
    async fn lost(&self);
}
