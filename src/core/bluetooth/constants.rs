//! Constants used throughout the printer link
//! This module contains the candidate UUID tables, name filters, and the
//! timing/retry values the connection manager and transfer engine rely on.
//! The UUID tables are part of the wire contract with real hardware and
//! must be reproduced bit-exact.

use uuid::Uuid;

/// Candidate printer service UUIDs, probed in this exact order.
///
/// Covers the common thermal-printer services, two vendor serial services,
/// the Nordic UART service, the classic serial-port profile, and generic
/// access as a last resort.
pub const CANDIDATE_SERVICE_UUIDS: [Uuid; 6] = [
    // Common thermal printer service
    Uuid::from_u128(0x000018f0_0000_1000_8000_00805f9b34fb),
    // Vendor printer service seen on many ESC/POS BLE modules
    Uuid::from_u128(0xe7810a71_73ae_499d_8c15_faa9aef0c3f2),
    // Vendor serial service (FF00 family)
    Uuid::from_u128(0x0000ff00_0000_1000_8000_00805f9b34fb),
    // Nordic UART service
    Uuid::from_u128(0x6e400001_b5a3_f393_e0a9_e50e24dcca9e),
    // Serial port profile
    Uuid::from_u128(0x00001101_0000_1000_8000_00805f9b34fb),
    // Generic access
    Uuid::from_u128(0x00001800_0000_1000_8000_00805f9b34fb),
];

/// Characteristic UUIDs known to be write endpoints on the printer
/// population above. A characteristic matching one of these is accepted
/// without consulting its capability flags.
pub const KNOWN_WRITE_CHAR_UUIDS: [Uuid; 4] = [
    // Standard thermal printer write characteristic
    Uuid::from_u128(0x00002af1_0000_1000_8000_00805f9b34fb),
    // Vendor write characteristic paired with e7810a71-...
    Uuid::from_u128(0xbef8d6c9_9c21_4c9e_b632_bd58c1009f9f),
    // FF02 write characteristic of the FF00 vendor service
    Uuid::from_u128(0x0000ff02_0000_1000_8000_00805f9b34fb),
    // Nordic UART RX (host-to-device)
    Uuid::from_u128(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e),
];

/// Device names that identify a supported printer outright
pub const KNOWN_PRINTER_NAMES: [&str; 2] = ["BlueTooth Printer", "Thermal Printer"];

/// Vendor name prefixes accepted by the targeted discovery filter
pub const PRINTER_NAME_PREFIXES: [&str; 5] = ["Printer", "POS", "MTP", "RPP", "GOOJPRT"];

/// Payload chunk size in bytes, sized for small-MTU BLE links
pub const CHUNK_SIZE: usize = 20;

/// Pause between consecutive chunk writes in milliseconds
pub const CHUNK_DELAY_MS: u64 = 10;

/// Maximum number of automatic reconnect attempts after an unsolicited drop
pub const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Delay before an automatic reconnect attempt in milliseconds
pub const RECONNECT_DELAY_MS: u64 = 3000;

/// How long a persisted connection record stays eligible for session resume
pub const PERSIST_FRESHNESS_HOURS: i64 = 24;

/// Key under which the last successful connection is persisted
pub const STORAGE_KEY: &str = "printer-link.last-connection";

/// Scan deadline in seconds; an expired scan counts as a cancelled pick
pub const SCAN_TIMEOUT_SECS: u64 = 10;

/// Minimum signal strength considered during discovery
pub const MIN_RSSI_THRESHOLD: i16 = -80;

/// Number of entries retained by the diagnostic trace buffer
pub const TRACE_CAPACITY: usize = 100;
