//! Device scanning for wearable peripherals.
//! Wraps the platform's device-selection affordance behind a capability
//! check and a single-in-flight guard.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use crate::core::bluetooth::link::{BleBackend, PeripheralLink};
use crate::error::ScanError;

pub struct WearableScanner {
    backend: Arc<dyn BleBackend>,
    scanning: AtomicBool,
}

/// Clears the in-flight flag when the scan ends, including when the caller
/// drops the scan future at an await point.
struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl WearableScanner {
    pub fn new(backend: Arc<dyn BleBackend>) -> Self {
        Self {
            backend,
            scanning: AtomicBool::new(false),
        }
    }

    /// Whether the platform can scan for BLE peripherals
    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    /// Scans for a wearable exposing one of the supported health services.
    /// `Ok(None)` means the selection was cancelled or nothing matched,
    /// which leaves the scanner immediately reusable. Only one scan may be
    /// in flight at a time.
    pub async fn scan(&self) -> Result<Option<Arc<dyn PeripheralLink>>, ScanError> {
        if !self.backend.is_supported() {
            warn!("Scan refused: Bluetooth LE is not supported on this platform");
            return Err(ScanError::Unsupported);
        }
        if self.scanning.swap(true, Ordering::SeqCst) {
            warn!("Scan refused: another scan is already in progress");
            return Err(ScanError::AlreadyScanning);
        }

        // resets on every exit path, including the future being dropped
        // mid-scan, so later scans are never blocked
        let _guard = ScanGuard(&self.scanning);

        info!("Device scan started");
        let result = self.backend.request_peripheral().await;

        match &result {
            Ok(Some(link)) => info!(
                "Scan selected peripheral {} ({})",
                link.id(),
                link.name().unwrap_or_else(|| "Unknown Device".to_string())
            ),
            Ok(None) => info!("Scan ended with no device selected"),
            Err(e) => warn!("Scan failed: {}", e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct StubBackend {
        supported: bool,
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl BleBackend for StubBackend {
        fn is_supported(&self) -> bool {
            self.supported
        }

        async fn request_peripheral(&self) -> Result<Option<Arc<dyn PeripheralLink>>, ScanError> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(ScanError::Adapter("radio is off".into()))
            } else {
                Ok(None)
            }
        }
    }

    fn scanner(supported: bool, delay: Duration, fail: bool) -> Arc<WearableScanner> {
        Arc::new(WearableScanner::new(Arc::new(StubBackend {
            supported,
            delay,
            fail,
        })))
    }

    #[tokio::test]
    async fn unsupported_platform_refuses_to_scan() {
        let scanner = scanner(false, Duration::ZERO, false);
        assert!(matches!(scanner.scan().await, Err(ScanError::Unsupported)));
    }

    #[tokio::test]
    async fn cancelled_scan_returns_none_and_stays_usable() {
        let scanner = scanner(true, Duration::ZERO, false);
        assert!(scanner.scan().await.unwrap().is_none());
        // a follow-up scan is not blocked
        assert!(scanner.scan().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_scan_is_rejected() {
        let scanner = scanner(true, Duration::from_millis(50), false);
        let first = tokio::spawn({
            let scanner = scanner.clone();
            async move { scanner.scan().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(
            scanner.scan().await,
            Err(ScanError::AlreadyScanning)
        ));
        assert!(first.await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn dropped_scan_future_releases_the_guard() {
        let scanner = scanner(true, Duration::from_secs(60), false);
        // the caller gives up mid-scan, dropping the future at its await
        assert!(
            tokio::time::timeout(Duration::from_millis(20), scanner.scan())
                .await
                .is_err()
        );
        // a later scan must start over instead of failing fast
        if let Ok(result) = tokio::time::timeout(Duration::from_millis(20), scanner.scan()).await {
            match result {
                Err(ScanError::AlreadyScanning) => {
                    panic!("abandoned scan left the in-flight guard set")
                }
                _ => panic!("scan against a slow backend resolved unexpectedly"),
            }
        }
    }

    #[tokio::test]
    async fn adapter_failure_resets_the_guard() {
        let scanner = scanner(true, Duration::ZERO, true);
        assert!(matches!(scanner.scan().await, Err(ScanError::Adapter(_))));
        assert!(matches!(scanner.scan().await, Err(ScanError::Adapter(_))));
    }
}
