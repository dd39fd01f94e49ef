//! Printer connection manager.
//!
//! Owns the single piece of mutable connection state and drives the
//! `disconnected → connecting → connected` lifecycle: discovery, GATT
//! connect, endpoint probing, link validation, session persistence, the
//! disconnect supervisor with its bounded reconnect budget, and the outbound
//! transfer entry points. Everything else reads state through snapshots or
//! subscribes to events; nothing mutates it from outside.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use log::Level;
use tokio::sync::{Mutex, broadcast};
use tokio::time::sleep;

use crate::core::bluetooth::commands::PrinterCommand;
use crate::core::bluetooth::connection::{find_write_characteristic, test_characteristic};
use crate::core::bluetooth::constants::{
    CHUNK_DELAY_MS, CHUNK_SIZE, MAX_RECONNECT_ATTEMPTS, PERSIST_FRESHNESS_HOURS,
    RECONNECT_DELAY_MS, STORAGE_KEY, TRACE_CAPACITY,
};
use crate::core::bluetooth::platform::{DevicePicker, GattCharacteristic, GattDevice};
use crate::core::bluetooth::storage::{ConnectionStore, PersistedConnection};
use crate::core::bluetooth::trace::{DebugLog, TraceEntry};
use crate::core::bluetooth::transfer::TransferEngine;
use crate::core::bluetooth::types::{
    ConnectionStatus, DeviceFilter, PrinterEvent, StateSnapshot,
};
use crate::error::PrinterError;

/// Tunable knobs of the connection manager
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub chunk_size: usize,
    pub chunk_delay: Duration,
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
    pub freshness_window: TimeDelta,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            freshness_window: TimeDelta::hours(PERSIST_FRESHNESS_HOURS),
        }
    }
}

/// The one mutable record of the link. `write_endpoint` is only ever set
/// after the tester has passed on the same GATT session, and the device
/// handle never outlives its own disconnect event.
struct LinkState {
    status: ConnectionStatus,
    device: Option<Arc<dyn GattDevice>>,
    write_endpoint: Option<Arc<dyn GattCharacteristic>>,
    printer_name: Option<String>,
    reconnect_attempts: u32,
    /// Reentrancy guard: a connect request arriving while another is in
    /// flight is dropped, not queued.
    in_flight: bool,
}

impl LinkState {
    fn new() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            device: None,
            write_endpoint: None,
            printer_name: None,
            reconnect_attempts: 0,
            in_flight: false,
        }
    }
}

struct EstablishedLink {
    device: Arc<dyn GattDevice>,
    endpoint: Arc<dyn GattCharacteristic>,
    name: Option<String>,
}

/// Manages the printer connection lifecycle
#[derive(Clone)]
pub struct PrinterManager {
    picker: Arc<dyn DevicePicker>,
    store: Arc<dyn ConnectionStore>,
    state: Arc<Mutex<LinkState>>,
    events: broadcast::Sender<PrinterEvent>,
    trace: Arc<DebugLog>,
    config: Arc<ManagerConfig>,
}

impl PrinterManager {
    pub fn new(picker: Arc<dyn DevicePicker>, store: Arc<dyn ConnectionStore>) -> Self {
        Self::with_config(picker, store, ManagerConfig::default())
    }

    pub fn with_config(
        picker: Arc<dyn DevicePicker>,
        store: Arc<dyn ConnectionStore>,
        config: ManagerConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            picker,
            store,
            state: Arc::new(Mutex::new(LinkState::new())),
            events,
            trace: Arc::new(DebugLog::new(TRACE_CAPACITY)),
            config: Arc::new(config),
        }
    }

    /// Subscribe to connection events
    pub fn subscribe(&self) -> broadcast::Receiver<PrinterEvent> {
        self.events.subscribe()
    }

    /// Current connection status
    pub async fn status(&self) -> ConnectionStatus {
        self.state.lock().await.status
    }

    /// Serializable view of the connection state
    pub async fn snapshot(&self) -> StateSnapshot {
        let state = self.state.lock().await;
        StateSnapshot {
            status: state.status,
            printer_name: state.printer_name.clone(),
            reconnect_attempts: state.reconnect_attempts,
        }
    }

    /// Recent diagnostic trace entries, oldest first
    pub fn trace_entries(&self) -> Vec<TraceEntry> {
        self.trace.entries()
    }

    /// Connect with permissive discovery (any nearby device). Used for
    /// manual and debug connections; never retried automatically.
    pub async fn connect_manual(&self) -> Result<(), PrinterError> {
        self.connect(DeviceFilter::Permissive).await
    }

    /// Connect with targeted discovery (known printers only). Used at
    /// startup and by the disconnect supervisor.
    pub async fn connect_auto(&self) -> Result<(), PrinterError> {
        self.connect(DeviceFilter::Targeted).await
    }

    /// Attempt to resume the previous session. Connects only when a
    /// persisted record exists and is fresher than the configured window;
    /// returns whether a link was established.
    pub async fn try_resume_session(&self) -> Result<bool, PrinterError> {
        let Some(record) = PersistedConnection::load(self.store.as_ref(), STORAGE_KEY) else {
            self.trace
                .record(Level::Info, "No persisted printer, skipping session resume");
            return Ok(false);
        };

        if !record.is_fresh(self.config.freshness_window) {
            self.trace.record(
                Level::Info,
                format!("Persisted record for {} is stale, skipping session resume", record.name),
            );
            return Ok(false);
        }

        self.trace.record(
            Level::Info,
            format!("Resuming session with {} ({})", record.name, record.id),
        );
        self.connect_auto().await?;
        Ok(self.status().await == ConnectionStatus::Connected)
    }

    /// Tear down the link and forget the persisted session. Idempotent;
    /// calling while already disconnected is a no-op.
    pub async fn disconnect(&self) {
        let device = {
            let mut state = self.state.lock().await;
            state.write_endpoint = None;
            state.printer_name = None;
            state.reconnect_attempts = 0;
            state.status = ConnectionStatus::Disconnected;
            state.device.take()
        };

        self.store.clear(STORAGE_KEY);

        if let Some(device) = device {
            if device.is_connected().await {
                if let Err(err) = device.disconnect().await {
                    self.trace
                        .record(Level::Warn, format!("Platform disconnect failed: {err}"));
                }
            }
            self.trace.record(Level::Info, "Disconnected from printer");
            self.emit(PrinterEvent::StatusChanged {
                status: ConnectionStatus::Disconnected,
            });
            self.emit(PrinterEvent::Disconnected);
        }
    }

    /// Stream a raw payload to the printer in paced chunks.
    ///
    /// Fails fast with [`PrinterError::NotConnected`] when no validated
    /// link is up; a mid-transfer failure marks the connection errored and
    /// the whole job counts as failed.
    pub async fn send(&self, payload: &[u8]) -> Result<(), PrinterError> {
        let endpoint = {
            let state = self.state.lock().await;
            if state.status != ConnectionStatus::Connected {
                return Err(PrinterError::NotConnected);
            }
            state
                .write_endpoint
                .clone()
                .ok_or(PrinterError::NotConnected)?
        };

        let engine = TransferEngine::new(endpoint, self.config.chunk_size, self.config.chunk_delay);
        match engine.send(payload).await {
            Ok(()) => {
                self.trace
                    .record(Level::Info, format!("Sent {} bytes to printer", payload.len()));
                Ok(())
            }
            Err(err) => {
                {
                    let mut state = self.state.lock().await;
                    state.device = None;
                    state.write_endpoint = None;
                    state.status = ConnectionStatus::Error;
                }
                self.trace
                    .record(Level::Error, format!("Transfer failed: {err}"));
                self.emit(PrinterEvent::StatusChanged {
                    status: ConnectionStatus::Error,
                });
                self.emit(PrinterEvent::Error {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Print receipt text (UTF-8 passthrough to `send`)
    pub async fn print_receipt(&self, text: &str) -> Result<(), PrinterError> {
        self.send(text.as_bytes()).await
    }

    /// Fire the cash-drawer kick sequence
    pub async fn open_cash_drawer(&self) -> Result<(), PrinterError> {
        self.send(&PrinterCommand::DrawerKick.to_bytes()).await
    }

    /// Send a sequence of printer commands as one payload
    pub async fn send_commands(&self, commands: &[PrinterCommand]) -> Result<(), PrinterError> {
        let payload = crate::core::bluetooth::commands::encode_sequence(commands);
        self.send(&payload).await
    }

    async fn connect(&self, filter: DeviceFilter) -> Result<(), PrinterError> {
        {
            let mut state = self.state.lock().await;
            if state.in_flight {
                self.trace.record(
                    Level::Warn,
                    "Connect request dropped: another attempt is in flight",
                );
                return Ok(());
            }
            if state.status == ConnectionStatus::Connected {
                self.trace.record(Level::Info, "Already connected");
                return Ok(());
            }
            state.in_flight = true;
            state.status = ConnectionStatus::Connecting;
        }
        self.emit(PrinterEvent::StatusChanged {
            status: ConnectionStatus::Connecting,
        });

        let outcome = self.run_pipeline(filter).await;

        match outcome {
            Ok(link) => {
                {
                    let mut state = self.state.lock().await;
                    state.in_flight = false;
                    state.device = Some(link.device.clone());
                    state.write_endpoint = Some(link.endpoint.clone());
                    state.printer_name = link.name.clone();
                    state.reconnect_attempts = 0;
                    state.status = ConnectionStatus::Connected;
                }

                self.persist_session(&link);
                self.spawn_supervisor(link.device.clone());

                self.trace.record(
                    Level::Info,
                    format!(
                        "Connected to {}",
                        link.name.as_deref().unwrap_or("unnamed printer")
                    ),
                );
                self.emit(PrinterEvent::StatusChanged {
                    status: ConnectionStatus::Connected,
                });
                self.emit(PrinterEvent::Connected { name: link.name });
                Ok(())
            }
            Err(PrinterError::Cancelled) => {
                {
                    let mut state = self.state.lock().await;
                    state.in_flight = false;
                    state.device = None;
                    state.write_endpoint = None;
                    state.status = ConnectionStatus::Disconnected;
                }
                self.trace
                    .record(Level::Info, "Device selection cancelled, nothing to do");
                self.emit(PrinterEvent::StatusChanged {
                    status: ConnectionStatus::Disconnected,
                });
                Ok(())
            }
            Err(err) => {
                {
                    let mut state = self.state.lock().await;
                    state.in_flight = false;
                    state.device = None;
                    state.write_endpoint = None;
                    state.status = ConnectionStatus::Error;
                }
                self.trace
                    .record(Level::Error, format!("Connection attempt failed: {err}"));
                self.emit(PrinterEvent::StatusChanged {
                    status: ConnectionStatus::Error,
                });
                self.emit(PrinterEvent::Error {
                    message: err.to_string(),
                });

                {
                    let mut state = self.state.lock().await;
                    state.status = ConnectionStatus::Disconnected;
                }
                self.emit(PrinterEvent::StatusChanged {
                    status: ConnectionStatus::Disconnected,
                });
                Err(err)
            }
        }
    }

    /// Discovery → GATT connect → probe → test
    async fn run_pipeline(&self, filter: DeviceFilter) -> Result<EstablishedLink, PrinterError> {
        self.trace
            .record(Level::Info, format!("Requesting device ({filter:?})"));
        let device = self.picker.request_device(filter).await?;
        let name = device.name();

        {
            let mut state = self.state.lock().await;
            state.device = Some(device.clone());
            state.printer_name = name.clone();
        }

        if !device.is_connected().await {
            self.trace.record(
                Level::Info,
                format!("Connecting GATT server of {}", device.id()),
            );
            device.connect().await?;
        }

        let endpoint = find_write_characteristic(device.as_ref(), &self.trace)
            .await?
            .ok_or(PrinterError::NoCompatibleEndpoint)?;

        if !test_characteristic(endpoint.as_ref(), &self.trace).await {
            return Err(PrinterError::Transport(
                "init command write failed on candidate endpoint".into(),
            ));
        }

        Ok(EstablishedLink {
            device,
            endpoint,
            name,
        })
    }

    fn persist_session(&self, link: &EstablishedLink) {
        let record =
            PersistedConnection::new(link.device.id(), link.name.clone().unwrap_or_default());
        if let Err(err) = record.save(self.store.as_ref(), STORAGE_KEY) {
            self.trace.record(
                Level::Warn,
                format!("Could not persist connection record: {err}"),
            );
        }
    }

    /// Watch for unsolicited link drops on the active device
    fn spawn_supervisor(&self, device: Arc<dyn GattDevice>) {
        let manager = self.clone();
        tokio::spawn(async move {
            match device.disconnect_events().await {
                Ok(mut events) => {
                    if events.recv().await.is_some() {
                        manager.on_link_dropped().await;
                    }
                }
                Err(err) => {
                    manager.trace.record(
                        Level::Warn,
                        format!("Disconnect supervision unavailable: {err}"),
                    );
                }
            }
        });
    }

    async fn on_link_dropped(&self) {
        {
            let mut state = self.state.lock().await;
            // An explicit disconnect or a failed attempt already cleaned up.
            if state.status != ConnectionStatus::Connected {
                return;
            }
            state.device = None;
            state.write_endpoint = None;
            state.status = ConnectionStatus::Disconnected;
        }
        self.trace
            .record(Level::Warn, "Printer link dropped unexpectedly");
        self.emit(PrinterEvent::StatusChanged {
            status: ConnectionStatus::Disconnected,
        });
        self.emit(PrinterEvent::Disconnected);

        self.spawn_reconnect_loop();
    }

    /// Bounded automatic reconnection after an unsolicited drop.
    ///
    /// Each round waits the configured delay, re-checks that the state has
    /// not been changed meanwhile (explicit disconnect, manual connect in
    /// flight), and then tries a targeted reconnect. Stops on success or
    /// when the attempt budget is spent, resetting the counter either way.
    fn spawn_reconnect_loop(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            loop {
                let attempt = {
                    let mut state = manager.state.lock().await;
                    if state.reconnect_attempts >= manager.config.max_reconnect_attempts {
                        state.reconnect_attempts = 0;
                        drop(state);
                        manager
                            .trace
                            .record(Level::Warn, "Reconnect budget exhausted, giving up");
                        manager.emit(PrinterEvent::ReconnectExhausted);
                        return;
                    }
                    state.reconnect_attempts += 1;
                    state.reconnect_attempts
                };
                manager.trace.record(
                    Level::Info,
                    format!(
                        "Scheduling reconnect attempt {attempt}/{}",
                        manager.config.max_reconnect_attempts
                    ),
                );
                manager.emit(PrinterEvent::ReconnectScheduled { attempt });

                sleep(manager.config.reconnect_delay).await;

                {
                    let state = manager.state.lock().await;
                    // The user may have disconnected or started a manual
                    // connect while the timer ran; their action wins.
                    if state.status != ConnectionStatus::Disconnected
                        || state.in_flight
                        || state.reconnect_attempts != attempt
                    {
                        manager.trace.record(
                            Level::Info,
                            "State changed while reconnect was pending, aborting",
                        );
                        return;
                    }
                }

                let _ = manager.connect_auto().await;
                if manager.status().await == ConnectionStatus::Connected {
                    return;
                }
            }
        });
    }

    fn emit(&self, event: PrinterEvent) {
        // Send only fails when nobody is subscribed; that is fine.
        let _ = self.events.send(event);
    }
}
