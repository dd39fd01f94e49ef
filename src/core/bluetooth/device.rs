//! `bluest`-backed implementations of the platform traits.
//!
//! Thin wrappers around `bluest::Device`/`Service`/`Characteristic` so the
//! rest of the crate never names the backend directly.

use std::sync::Arc;

use async_trait::async_trait;
use bluest::{Adapter, Characteristic, ConnectionEvent, Device, Service};
use futures_util::StreamExt;
use log::{debug, warn};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::bluetooth::platform::{
    CharacteristicProps, GattCharacteristic, GattDevice, GattService,
};
use crate::error::PrinterError;

pub struct BluestDevice {
    adapter: Adapter,
    device: Device,
}

impl BluestDevice {
    pub fn new(adapter: Adapter, device: Device) -> Self {
        Self { adapter, device }
    }
}

#[async_trait]
impl GattDevice for BluestDevice {
    fn id(&self) -> String {
        self.device.id().to_string()
    }

    fn name(&self) -> Option<String> {
        self.device.name().ok()
    }

    async fn is_connected(&self) -> bool {
        self.device.is_connected().await
    }

    async fn connect(&self) -> Result<(), PrinterError> {
        self.adapter.connect_device(&self.device).await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), PrinterError> {
        self.adapter.disconnect_device(&self.device).await?;
        Ok(())
    }

    async fn services(&self) -> Result<Vec<Arc<dyn GattService>>, PrinterError> {
        let services = self.device.services().await?;
        Ok(services
            .into_iter()
            .map(|service| Arc::new(BluestService { service }) as Arc<dyn GattService>)
            .collect())
    }

    async fn disconnect_events(&self) -> Result<mpsc::Receiver<()>, PrinterError> {
        let (tx, rx) = mpsc::channel(4);
        let adapter = self.adapter.clone();
        let device = self.device.clone();

        // The bluest event stream borrows the adapter, so a forwarding task
        // owns both and feeds the channel instead.
        tokio::spawn(async move {
            let mut events = match adapter.device_connection_events(&device).await {
                Ok(events) => events,
                Err(err) => {
                    warn!("Could not subscribe to connection events: {err}");
                    return;
                }
            };
            while let Some(event) = events.next().await {
                if matches!(event, ConnectionEvent::Disconnected) {
                    debug!("Link to {} reported disconnected", device.id());
                    if tx.send(()).await.is_err() {
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}

struct BluestService {
    service: Service,
}

#[async_trait]
impl GattService for BluestService {
    fn uuid(&self) -> Uuid {
        self.service.uuid()
    }

    async fn characteristics(&self) -> Result<Vec<Arc<dyn GattCharacteristic>>, PrinterError> {
        let characteristics = self.service.characteristics().await?;
        Ok(characteristics
            .into_iter()
            .map(|characteristic| {
                Arc::new(BluestCharacteristic { characteristic }) as Arc<dyn GattCharacteristic>
            })
            .collect())
    }
}

struct BluestCharacteristic {
    characteristic: Characteristic,
}

#[async_trait]
impl GattCharacteristic for BluestCharacteristic {
    fn uuid(&self) -> Uuid {
        self.characteristic.uuid()
    }

    async fn properties(&self) -> Result<CharacteristicProps, PrinterError> {
        let props = self.characteristic.properties().await?;
        Ok(CharacteristicProps {
            write: props.write,
            write_without_response: props.write_without_response,
        })
    }

    async fn write(&self, data: &[u8]) -> Result<(), PrinterError> {
        self.characteristic.write(data).await?;
        Ok(())
    }
}
