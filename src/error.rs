//! Error taxonomy for the wearable connectivity layer.
//! Platform and transport failures are converted into these kinds at the
//! boundary where they occur and never propagate as raw backend errors.

use thiserror::Error;
use uuid::Uuid;

/// Failures of the device scanner.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The platform has no usable Bluetooth LE adapter. Scanning must be
    /// refused up front, not attempted and caught.
    #[error("Bluetooth LE is not supported on this platform")]
    Unsupported,

    /// A scan is already in flight on this adapter.
    #[error("a device scan is already in progress")]
    AlreadyScanning,

    /// The adapter failed mid-scan (radio off, permission denied, ...).
    #[error("Bluetooth scan failed: {0}")]
    Adapter(String),
}

/// Failures of the attribute-protocol link to a single peripheral.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The peripheral does not expose the requested service. Callers treat
    /// this as "sensor absent", never as a connection error.
    #[error("service {0} not available")]
    ServiceNotFound(Uuid),

    /// The service exists but lacks the requested characteristic.
    #[error("characteristic {0} not available")]
    CharacteristicNotFound(Uuid),

    /// The link is no longer open.
    #[error("link to peripheral is closed")]
    Closed,

    /// Any other transport-level failure reported by the platform.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Total failure to establish a session with a peripheral. Individual
/// service discovery failures are swallowed and never produce this.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to connect to peripheral: {0}")]
    Link(#[from] LinkError),
}

/// A measurement payload that cannot be decoded. Dropped at event
/// granularity; never tears down the subscription.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("measurement payload too short: got {got} bytes, need {need}")]
    Truncated { need: usize, got: usize },
}

/// Umbrella error for combined operations like scan-and-connect.
#[derive(Debug, Error)]
pub enum WearableError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Failure of the external persistent store. Reported non-fatally; the
/// in-memory registry is the source of truth and is never rolled back.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistent store rejected the write: {0}")]
    Backend(String),
}
