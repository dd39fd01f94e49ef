//! Bounded diagnostic trace of connection activity.
//!
//! Every discovery/probe/test/transfer event is mirrored here so a UI or a
//! bug report can show the recent history without trawling process logs.
//! Diagnostic only; nothing consults it for control flow.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::Local;
use log::Level;
use serde::Serialize;

/// One human-readable trace entry
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    pub level: String,
    pub message: String,
    pub timestamp: String,
}

/// Ring buffer retaining the last N trace entries
pub struct DebugLog {
    entries: Mutex<VecDeque<TraceEntry>>,
    capacity: usize,
}

impl DebugLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Record an entry and mirror it to the `log` facade
    pub fn record(&self, level: Level, message: impl Into<String>) {
        let message = message.into();
        log::log!(level, "{}", message);

        let entry = TraceEntry {
            level: level.to_string(),
            message,
            timestamp: Local::now().to_rfc3339(),
        };
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Snapshot of the retained entries, oldest first
    pub fn entries(&self) -> Vec<TraceEntry> {
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.iter().cloned().collect()
    }
}
