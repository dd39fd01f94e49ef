//! Shared mock Bluetooth platform for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use printer_link::core::bluetooth::constants::{CANDIDATE_SERVICE_UUIDS, KNOWN_WRITE_CHAR_UUIDS};
use printer_link::core::bluetooth::platform::{
    CharacteristicProps, DevicePicker, GattCharacteristic, GattDevice, GattService,
};
use printer_link::core::bluetooth::storage::ConnectionStore;
use printer_link::core::bluetooth::types::DeviceFilter;
use printer_link::error::PrinterError;
use tokio::sync::mpsc;
use uuid::Uuid;

pub struct MockCharacteristic {
    uuid: Uuid,
    props: CharacteristicProps,
    /// Every attempted write, successful or not, in order
    writes: Mutex<Vec<Vec<u8>>>,
    /// Write index (0-based, counted after `clear_writes`) from which
    /// writes fail
    fail_from: Mutex<Option<usize>>,
}

impl MockCharacteristic {
    pub fn writable(uuid: Uuid) -> Arc<Self> {
        Arc::new(Self {
            uuid,
            props: CharacteristicProps {
                write: true,
                write_without_response: false,
            },
            writes: Mutex::new(Vec::new()),
            fail_from: Mutex::new(None),
        })
    }

    pub fn with_props(uuid: Uuid, props: CharacteristicProps) -> Arc<Self> {
        Arc::new(Self {
            uuid,
            props,
            writes: Mutex::new(Vec::new()),
            fail_from: Mutex::new(None),
        })
    }

    /// Make the nth write (0-based) and every later one fail
    pub fn fail_writes_from(&self, index: usize) {
        *self.fail_from.lock().unwrap() = Some(index);
    }

    pub fn clear_writes(&self) {
        self.writes.lock().unwrap().clear();
        *self.fail_from.lock().unwrap() = None;
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl GattCharacteristic for MockCharacteristic {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn properties(&self) -> Result<CharacteristicProps, PrinterError> {
        Ok(self.props)
    }

    async fn write(&self, data: &[u8]) -> Result<(), PrinterError> {
        let mut writes = self.writes.lock().unwrap();
        let index = writes.len();
        writes.push(data.to_vec());

        if let Some(fail_from) = *self.fail_from.lock().unwrap() {
            if index >= fail_from {
                return Err(PrinterError::Transport("mock write failure".into()));
            }
        }
        Ok(())
    }
}

pub struct MockService {
    uuid: Uuid,
    characteristics: Vec<Arc<MockCharacteristic>>,
    unreachable: bool,
}

impl MockService {
    pub fn new(uuid: Uuid, characteristics: Vec<Arc<MockCharacteristic>>) -> Arc<Self> {
        Arc::new(Self {
            uuid,
            characteristics,
            unreachable: false,
        })
    }

    /// A service that advertises but cannot be opened
    pub fn unreachable(uuid: Uuid) -> Arc<Self> {
        Arc::new(Self {
            uuid,
            characteristics: Vec::new(),
            unreachable: true,
        })
    }
}

#[async_trait]
impl GattService for MockService {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn characteristics(&self) -> Result<Vec<Arc<dyn GattCharacteristic>>, PrinterError> {
        if self.unreachable {
            return Err(PrinterError::Transport("service not reachable".into()));
        }
        Ok(self
            .characteristics
            .iter()
            .map(|c| c.clone() as Arc<dyn GattCharacteristic>)
            .collect())
    }
}

pub struct MockDevice {
    id: String,
    name: Option<String>,
    services: Vec<Arc<MockService>>,
    connected: AtomicBool,
    connect_fails: AtomicBool,
    drop_senders: Mutex<Vec<mpsc::Sender<()>>>,
}

impl MockDevice {
    pub fn new(id: &str, name: Option<&str>, services: Vec<Arc<MockService>>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            name: name.map(String::from),
            services,
            connected: AtomicBool::new(false),
            connect_fails: AtomicBool::new(false),
            drop_senders: Mutex::new(Vec::new()),
        })
    }

    /// Standard happy-path printer: first candidate service exposing the
    /// first known write characteristic
    pub fn printer(id: &str, name: &str) -> (Arc<Self>, Arc<MockCharacteristic>) {
        let characteristic = MockCharacteristic::writable(KNOWN_WRITE_CHAR_UUIDS[0]);
        let service = MockService::new(CANDIDATE_SERVICE_UUIDS[0], vec![characteristic.clone()]);
        (Self::new(id, Some(name), vec![service]), characteristic)
    }

    pub fn set_connect_fails(&self, fails: bool) {
        self.connect_fails.store(fails, Ordering::SeqCst);
    }

    /// Simulate an unsolicited link drop (printer powered off)
    pub async fn drop_link(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let senders = self.drop_senders.lock().unwrap().clone();
        for sender in senders {
            let _ = sender.send(()).await;
        }
    }
}

#[async_trait]
impl GattDevice for MockDevice {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), PrinterError> {
        if self.connect_fails.load(Ordering::SeqCst) {
            return Err(PrinterError::Transport("mock connect failure".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), PrinterError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn services(&self) -> Result<Vec<Arc<dyn GattService>>, PrinterError> {
        Ok(self
            .services
            .iter()
            .map(|s| s.clone() as Arc<dyn GattService>)
            .collect())
    }

    async fn disconnect_events(&self) -> Result<mpsc::Receiver<()>, PrinterError> {
        let (tx, rx) = mpsc::channel(4);
        self.drop_senders.lock().unwrap().push(tx);
        Ok(rx)
    }
}

/// Picker handing out a queued sequence of devices; an empty queue behaves
/// like a dismissed chooser
pub struct MockPicker {
    queue: Mutex<VecDeque<Result<Arc<MockDevice>, PrinterError>>>,
    calls: Mutex<Vec<DeviceFilter>>,
    delay: Option<Duration>,
}

impl MockPicker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    /// Picker that suspends before resolving, to exercise reentrancy
    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            delay: Some(delay),
        })
    }

    pub fn enqueue(&self, device: Arc<MockDevice>) {
        self.queue.lock().unwrap().push_back(Ok(device));
    }

    pub fn enqueue_err(&self, err: PrinterError) {
        self.queue.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<DeviceFilter> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DevicePicker for MockPicker {
    async fn request_device(
        &self,
        filter: DeviceFilter,
    ) -> Result<Arc<dyn GattDevice>, PrinterError> {
        self.calls.lock().unwrap().push(filter);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.queue.lock().unwrap().pop_front() {
            Some(Ok(device)) => Ok(device as Arc<dyn GattDevice>),
            Some(Err(err)) => Err(err),
            None => Err(PrinterError::Cancelled),
        }
    }
}

/// In-memory stand-in for the external key/value store
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
        })
    }
}

impl ConnectionStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PrinterError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}
