//! Service probing and link validation.
//!
//! A freshly connected printer exposes an unknown mix of GATT services; the
//! prober walks the candidate table looking for a write-capable
//! characteristic, and the tester proves the link usable with a single init
//! write before the connection is reported as established.

use std::sync::Arc;

use log::Level;

use crate::core::bluetooth::commands::PrinterCommand;
use crate::core::bluetooth::constants::{CANDIDATE_SERVICE_UUIDS, KNOWN_WRITE_CHAR_UUIDS};
use crate::core::bluetooth::platform::{GattCharacteristic, GattDevice};
use crate::core::bluetooth::trace::DebugLog;
use crate::error::PrinterError;

/// Locate a write-capable characteristic on the device.
///
/// Candidate services are tried strictly in table order; within a service,
/// characteristics are taken in enumeration order. A characteristic is
/// accepted immediately when its UUID is a known write endpoint, otherwise
/// when its capability flags include write or write-without-response. The
/// first acceptable match wins. Services absent from the device are skipped
/// silently; `None` means the whole table was exhausted.
pub async fn find_write_characteristic(
    device: &dyn GattDevice,
    trace: &DebugLog,
) -> Result<Option<Arc<dyn GattCharacteristic>>, PrinterError> {
    let services = device.services().await?;

    for candidate in CANDIDATE_SERVICE_UUIDS {
        let Some(service) = services.iter().find(|s| s.uuid() == candidate) else {
            continue;
        };

        let characteristics = match service.characteristics().await {
            Ok(characteristics) => characteristics,
            Err(err) => {
                // Service advertised but not openable on this device.
                trace.record(
                    Level::Debug,
                    format!("Skipping unreachable service {candidate}: {err}"),
                );
                continue;
            }
        };

        for characteristic in characteristics {
            let uuid = characteristic.uuid();
            if KNOWN_WRITE_CHAR_UUIDS.contains(&uuid) {
                trace.record(
                    Level::Info,
                    format!("Found known write characteristic {uuid} in service {candidate}"),
                );
                return Ok(Some(characteristic));
            }

            match characteristic.properties().await {
                Ok(props) if props.writable() => {
                    trace.record(
                        Level::Info,
                        format!("Found writable characteristic {uuid} in service {candidate}"),
                    );
                    return Ok(Some(characteristic));
                }
                Ok(_) => {}
                Err(err) => {
                    trace.record(
                        Level::Debug,
                        format!("Could not read properties of {uuid}: {err}"),
                    );
                }
            }
        }
    }

    trace.record(Level::Warn, "No write-capable characteristic on this device");
    Ok(None)
}

/// Smoke-test a candidate characteristic by sending the printer init
/// command. A resolved write is the only acknowledgement the protocol
/// offers; no response channel is read back.
pub async fn test_characteristic(
    characteristic: &dyn GattCharacteristic,
    trace: &DebugLog,
) -> bool {
    match characteristic.write(&PrinterCommand::Init.to_bytes()).await {
        Ok(()) => {
            trace.record(
                Level::Info,
                format!("Init command accepted by {}", characteristic.uuid()),
            );
            true
        }
        Err(err) => {
            trace.record(
                Level::Warn,
                format!("Init command rejected by {}: {err}", characteristic.uuid()),
            );
            false
        }
    }
}
