//! Error taxonomy for the printer link
//! Every fallible operation in the crate reports one of these variants;
//! callers decide whether a failure is fatal, retriable, or a plain no-op.

use thiserror::Error;

/// Errors surfaced by discovery, connection, and transfer operations
#[derive(Debug, Error)]
pub enum PrinterError {
    /// No Bluetooth adapter is available on this machine. Fatal, never retried.
    #[error("bluetooth is not available on this platform")]
    PlatformUnsupported,

    /// Device selection ended without a pick (scan timed out or was
    /// cancelled). Not treated as an error by the state machine.
    #[error("device selection was cancelled")]
    Cancelled,

    /// Every candidate service/characteristic was probed and none of them
    /// accepts writes. Fatal for this connection attempt.
    #[error("no write-capable endpoint found on this device")]
    NoCompatibleEndpoint,

    /// A send/print/drawer operation was attempted without an active link.
    /// Reported immediately, never retried automatically.
    #[error("not connected to a printer")]
    NotConnected,

    /// A GATT operation failed at the platform layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The persisted connection record could not be written or parsed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<bluest::Error> for PrinterError {
    fn from(err: bluest::Error) -> Self {
        PrinterError::Transport(err.to_string())
    }
}
