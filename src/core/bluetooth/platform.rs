//! Platform boundary for Bluetooth operations.
//!
//! The connection manager only ever talks to the radio through these traits:
//! discover a device, connect its GATT server, enumerate services and
//! characteristics, and write bytes. The shipping implementation wraps
//! `bluest` (see [`scanner`] and [`device`]); tests substitute mocks.
//!
//! [`scanner`]: crate::core::bluetooth::scanner
//! [`device`]: crate::core::bluetooth::device

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::bluetooth::types::DeviceFilter;
use crate::error::PrinterError;

/// Capability flags reported by a characteristic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacteristicProps {
    pub write: bool,
    pub write_without_response: bool,
}

impl CharacteristicProps {
    /// Whether this characteristic can accept outbound data at all
    pub fn writable(&self) -> bool {
        self.write || self.write_without_response
    }
}

/// A writable/readable data point within a GATT service
#[async_trait]
pub trait GattCharacteristic: Send + Sync {
    fn uuid(&self) -> Uuid;

    async fn properties(&self) -> Result<CharacteristicProps, PrinterError>;

    /// Write one payload to the characteristic. The platform gives no
    /// flow-control signal; a resolved write is the only acknowledgement.
    async fn write(&self, data: &[u8]) -> Result<(), PrinterError>;
}

/// A group of related characteristics on the peripheral
#[async_trait]
pub trait GattService: Send + Sync {
    fn uuid(&self) -> Uuid;

    async fn characteristics(&self) -> Result<Vec<Arc<dyn GattCharacteristic>>, PrinterError>;
}

/// A peripheral device handle
#[async_trait]
pub trait GattDevice: Send + Sync {
    /// Platform-specific unique identifier
    fn id(&self) -> String;

    /// Display name, if the platform knows one
    fn name(&self) -> Option<String>;

    async fn is_connected(&self) -> bool;

    async fn connect(&self) -> Result<(), PrinterError>;

    async fn disconnect(&self) -> Result<(), PrinterError>;

    async fn services(&self) -> Result<Vec<Arc<dyn GattService>>, PrinterError>;

    /// Channel that yields one message per unsolicited link drop.
    /// The disconnect supervisor listens on this.
    async fn disconnect_events(&self) -> Result<mpsc::Receiver<()>, PrinterError>;
}

/// Device discovery, the platform's stand-in for a device chooser
#[async_trait]
pub trait DevicePicker: Send + Sync {
    /// Find a device matching `filter`. Suspends until a device is picked,
    /// the scan deadline expires ([`PrinterError::Cancelled`]), or the scan
    /// is cancelled.
    async fn request_device(&self, filter: DeviceFilter)
    -> Result<Arc<dyn GattDevice>, PrinterError>;
}
