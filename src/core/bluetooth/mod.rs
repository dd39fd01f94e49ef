//! Bluetooth printer connectivity.
//! This module handles every radio-facing concern: device discovery,
//! GATT probing and validation, the connection state machine with its
//! disconnect supervisor, chunked data transfer, and session persistence.

pub mod commands;
pub mod connection;
pub mod constants;
pub mod device;
pub mod manager;
pub mod platform;
pub mod scanner;
pub mod storage;
pub mod trace;
pub mod transfer;
pub mod types;

pub use commands::{PrinterCommand, encode_sequence};
pub use connection::{find_write_characteristic, test_characteristic};
pub use manager::{ManagerConfig, PrinterManager};
pub use platform::{
    CharacteristicProps, DevicePicker, GattCharacteristic, GattDevice, GattService,
};
pub use scanner::BluestPicker;
pub use storage::{ConnectionStore, FileConnectionStore, PersistedConnection};
pub use trace::{DebugLog, TraceEntry};
pub use transfer::TransferEngine;
pub use types::{ConnectionStatus, DeviceFilter, PrinterEvent, StateSnapshot};
