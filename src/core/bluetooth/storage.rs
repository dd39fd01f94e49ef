//! Session persistence for the last successfully connected printer.
//!
//! The store itself is an external collaborator; the manager only calls
//! `load`/`save`/`clear` with a fixed key. The record gates whether a
//! session resume is attempted at startup.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, TimeDelta, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::PrinterError;

/// Key/value store holding the persisted connection record
pub trait ConnectionStore: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str) -> Result<(), PrinterError>;
    fn clear(&self, key: &str);
}

/// Metadata of the last successful connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedConnection {
    /// Platform device identifier
    pub id: String,
    /// Display name at the time of connection
    pub name: String,
    /// When the connection was last established
    pub timestamp: DateTime<Utc>,
}

impl PersistedConnection {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            timestamp: Utc::now(),
        }
    }

    /// Whether the record is recent enough to justify an automatic
    /// reconnect at startup
    pub fn is_fresh(&self, window: TimeDelta) -> bool {
        let age = Utc::now() - self.timestamp;
        age >= TimeDelta::zero() && age < window
    }

    /// Load and parse the record under `key`. An unreadable or malformed
    /// record counts as absent.
    pub fn load(store: &dyn ConnectionStore, key: &str) -> Option<Self> {
        let raw = store.load(key)?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("Discarding malformed persisted connection record: {err}");
                None
            }
        }
    }

    /// Serialize and write the record under `key`
    pub fn save(&self, store: &dyn ConnectionStore, key: &str) -> Result<(), PrinterError> {
        let raw = serde_json::to_string(self).map_err(|e| PrinterError::Storage(e.to_string()))?;
        store.save(key, &raw)
    }
}

/// File-backed store: one JSON file per key inside a base directory
pub struct FileConnectionStore {
    base_dir: PathBuf,
}

impl FileConnectionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are dotted identifiers; keep them filesystem-safe anyway.
        let file_name: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{file_name}.json"))
    }
}

impl ConnectionStore for FileConnectionStore {
    fn load(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PrinterError> {
        fs::create_dir_all(&self.base_dir).map_err(|e| PrinterError::Storage(e.to_string()))?;
        fs::write(self.path_for(key), value).map_err(|e| PrinterError::Storage(e.to_string()))
    }

    fn clear(&self, key: &str) {
        let path = self.path_for(key);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to clear persisted record at {path:?}: {err}");
            }
        }
    }
}
