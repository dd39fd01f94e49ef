//! Core functionality of the printer link

pub mod bluetooth;

pub use self::bluetooth::PrinterManager;
