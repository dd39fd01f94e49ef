//! printer-link library
//! Bluetooth LE connection manager and transport engine for ESC/POS thermal
//! receipt printers: discovery, endpoint probing, link validation, bounded
//! auto-reconnect, and chunked byte transfer over small-MTU links.

// Module declarations
pub mod core;
pub mod error;

pub use crate::core::bluetooth::{
    BluestPicker, ConnectionStatus, ConnectionStore, DeviceFilter, FileConnectionStore,
    ManagerConfig, PersistedConnection, PrinterCommand, PrinterEvent, PrinterManager,
    StateSnapshot,
};
pub use error::PrinterError;
