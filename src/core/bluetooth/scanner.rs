//! Device discovery over the `bluest` scan stream.
//!
//! Stands in for the browser's device-chooser prompt: a bounded scan that
//! resolves with the first device matching the requested filter, or with
//! [`PrinterError::Cancelled`] when the deadline passes or the scan is
//! cancelled from outside.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bluest::Adapter;
use futures_util::StreamExt;
use log::{debug, info};
use regex::Regex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::bluetooth::constants::{
    CANDIDATE_SERVICE_UUIDS, KNOWN_PRINTER_NAMES, MIN_RSSI_THRESHOLD, PRINTER_NAME_PREFIXES,
    SCAN_TIMEOUT_SECS,
};
use crate::core::bluetooth::device::BluestDevice;
use crate::core::bluetooth::platform::{DevicePicker, GattDevice};
use crate::core::bluetooth::types::DeviceFilter;
use crate::error::PrinterError;

/// Discovery backend over a system Bluetooth adapter
pub struct BluestPicker {
    adapter: Adapter,
    cancel_token: CancellationToken,
    scan_timeout: Duration,
}

impl BluestPicker {
    /// Acquire the default adapter. Fails with
    /// [`PrinterError::PlatformUnsupported`] when the machine has no
    /// Bluetooth capability, without ever starting a scan.
    pub async fn new() -> Result<Self, PrinterError> {
        let adapter = Adapter::default()
            .await
            .ok_or(PrinterError::PlatformUnsupported)?;
        adapter.wait_available().await?;
        info!("Bluetooth adapter is available");

        Ok(Self {
            adapter,
            cancel_token: CancellationToken::new(),
            scan_timeout: Duration::from_secs(SCAN_TIMEOUT_SECS),
        })
    }

    /// Abort an in-flight `request_device` call
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    async fn scan_for_match(
        &self,
        filter: DeviceFilter,
    ) -> Result<Arc<dyn GattDevice>, PrinterError> {
        // A device we already hold a link to wins without scanning.
        for device in self.adapter.connected_devices().await? {
            let name = device.name().ok();
            if matches_filter(filter, name.as_deref(), &[]) {
                info!(
                    "Reusing already-connected device {} ({})",
                    device.id(),
                    name.as_deref().unwrap_or("unknown")
                );
                return Ok(Arc::new(BluestDevice::new(self.adapter.clone(), device)));
            }
        }

        info!("Starting bluetooth scan ({filter:?})");
        let mut scan_stream = self.adapter.scan(&[]).await?;
        let deadline = tokio::time::Instant::now() + self.scan_timeout;

        loop {
            tokio::select! {
                result = scan_stream.next() => {
                    let Some(discovered) = result else {
                        info!("Bluetooth scan stream has ended");
                        return Err(PrinterError::Cancelled);
                    };

                    let name = discovered.adv_data.local_name.clone()
                        .or_else(|| discovered.device.name().ok());
                    debug!(
                        "Found device - Name: {:?}, RSSI: {:?}, MAC: {:?}",
                        name,
                        discovered.rssi,
                        extract_mac_address(&discovered.device.id().to_string()),
                    );

                    // Only consider devices with medium or stronger signal.
                    let Some(rssi) = discovered.rssi else { continue };
                    if rssi < MIN_RSSI_THRESHOLD {
                        continue;
                    }

                    if matches_filter(filter, name.as_deref(), &discovered.adv_data.services) {
                        info!(
                            "Picked device {} ({})",
                            discovered.device.id(),
                            name.as_deref().unwrap_or("unknown")
                        );
                        return Ok(Arc::new(BluestDevice::new(
                            self.adapter.clone(),
                            discovered.device,
                        )));
                    }
                }
                _ = tokio::time::sleep_until(deadline) => {
                    info!("Scan deadline reached with no matching device");
                    return Err(PrinterError::Cancelled);
                }
                _ = self.cancel_token.cancelled() => {
                    info!("Scan cancelled");
                    return Err(PrinterError::Cancelled);
                }
            }
        }
    }
}

#[async_trait]
impl DevicePicker for BluestPicker {
    async fn request_device(
        &self,
        filter: DeviceFilter,
    ) -> Result<Arc<dyn GattDevice>, PrinterError> {
        self.scan_for_match(filter).await
    }
}

/// Whether an advertisement satisfies the discovery filter.
///
/// Targeted mode accepts an exact known printer name, a vendor name prefix,
/// or an advertised candidate service. Permissive mode accepts anything.
pub fn matches_filter(filter: DeviceFilter, name: Option<&str>, services: &[Uuid]) -> bool {
    match filter {
        DeviceFilter::Permissive => true,
        DeviceFilter::Targeted => {
            if let Some(name) = name {
                if KNOWN_PRINTER_NAMES.contains(&name) {
                    return true;
                }
                if PRINTER_NAME_PREFIXES.iter().any(|p| name.starts_with(p)) {
                    return true;
                }
            }
            services
                .iter()
                .any(|uuid| CANDIDATE_SERVICE_UUIDS.contains(uuid))
        }
    }
}

/// Pull a MAC address out of a platform device id, for log readability
pub fn extract_mac_address(device_id: &str) -> Option<String> {
    let re = Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").ok()?;
    re.find_iter(device_id)
        .last()
        .map(|m| m.as_str().to_uppercase())
}
