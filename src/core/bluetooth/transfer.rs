//! Chunked byte transfer to the printer.
//!
//! BLE links carry at most a small MTU per write, so outbound payloads are
//! split into fixed-size chunks written strictly in order with a short pause
//! between them. The pause is the only backpressure available; the platform
//! write call gives no flow-control signal.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::time::sleep;

use crate::core::bluetooth::platform::GattCharacteristic;
use crate::error::PrinterError;

/// Streams payloads to a validated write endpoint
pub struct TransferEngine {
    endpoint: Arc<dyn GattCharacteristic>,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl TransferEngine {
    pub fn new(
        endpoint: Arc<dyn GattCharacteristic>,
        chunk_size: usize,
        chunk_delay: Duration,
    ) -> Self {
        Self {
            endpoint,
            chunk_size,
            chunk_delay,
        }
    }

    /// Write `payload` as `ceil(len / chunk_size)` sequential chunk writes.
    ///
    /// No chunk is dispatched before the previous write has resolved. A
    /// failed chunk aborts the remainder; partial payloads are not retried
    /// or rolled back, the whole job counts as failed.
    pub async fn send(&self, payload: &[u8]) -> Result<(), PrinterError> {
        if payload.is_empty() {
            return Ok(());
        }

        let total = payload.len().div_ceil(self.chunk_size);
        for (index, chunk) in payload.chunks(self.chunk_size).enumerate() {
            self.endpoint.write(chunk).await?;
            debug!("Wrote chunk {}/{} ({} bytes)", index + 1, total, chunk.len());

            if index + 1 < total {
                sleep(self.chunk_delay).await;
            }
        }
        Ok(())
    }
}
