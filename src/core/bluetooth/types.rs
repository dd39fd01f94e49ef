//! Shared data structures for the Bluetooth module.

use serde::Serialize;

/// Connection status of the printer link.
///
/// Exactly one value at a time; only the [`PrinterManager`] transitions it.
///
/// [`PrinterManager`]: crate::core::bluetooth::PrinterManager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No active link, ready to connect
    Disconnected,
    /// A connect pipeline (discovery, probe, test) is running
    Connecting,
    /// A validated write endpoint is available
    Connected,
    /// The last attempt or transfer failed; cleared on the next transition
    Error,
}

/// Discovery filter mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFilter {
    /// Accept only devices matching the known printer names, vendor name
    /// prefixes, or an advertised candidate service. Used for auto-connect.
    Targeted,
    /// Accept any nearby device. Used for manual/debug discovery when the
    /// targeted filter cannot find hardware.
    Permissive,
}

/// Events published by the connection manager.
///
/// Delivered through [`PrinterManager::subscribe`]; replaces the implicit
/// window-event dispatch a UI layer would otherwise listen on.
///
/// [`PrinterManager::subscribe`]: crate::core::bluetooth::PrinterManager::subscribe
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PrinterEvent {
    /// The connection status changed
    StatusChanged { status: ConnectionStatus },
    /// A printer link was established and validated
    Connected { name: Option<String> },
    /// The link went away (explicit or unsolicited)
    Disconnected,
    /// An automatic reconnect attempt was scheduled
    ReconnectScheduled { attempt: u32 },
    /// The reconnect budget ran out; manual reconnection required
    ReconnectExhausted,
    /// A user-facing failure message
    Error { message: String },
}

/// Serializable view of the connection state for a UI layer
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    /// Current connection status
    pub status: ConnectionStatus,
    /// Display name of the connected or last-known printer
    pub printer_name: Option<String>,
    /// Automatic reconnect attempts consumed since the last success
    pub reconnect_attempts: u32,
}
