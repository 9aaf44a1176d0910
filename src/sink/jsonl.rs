//! Append-only JSON Lines event log.
//!
//! Each processed event becomes one line: a versioned record with the time
//! it was logged and the full validated event.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::PerceptionEvent;
use crate::error::{FlowError, Result};
use crate::sink::traits::EventSink;

/// Schema version for event log records.
///
/// Increment when the record schema changes in a breaking way.
pub const EVENT_LOG_SCHEMA_VERSION: u8 = 1;

/// One line of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogRecord {
    /// Schema version for forward compatibility.
    pub v: u8,
    /// When the record was written (not the event timestamp).
    pub logged_at: DateTime<Utc>,
    /// The event as processed.
    pub event: PerceptionEvent,
}

impl EventLogRecord {
    pub fn new(event: PerceptionEvent) -> Self {
        Self {
            v: EVENT_LOG_SCHEMA_VERSION,
            logged_at: Utc::now(),
            event,
        }
    }
}

/// JSONL file sink.
#[derive(Debug, Clone)]
pub struct JsonlEventLog {
    path: PathBuf,
}

impl JsonlEventLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record to the log.
    pub fn append(&self, record: &EventLogRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| FlowError::storage(parent, e))?;
            }
        }

        let json = serde_json::to_string(record)
            .map_err(|e| FlowError::serde(format!("Failed to serialize event record: {}", e)))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| FlowError::storage(&self.path, e))?;

        writeln!(file, "{}", json).map_err(|e| FlowError::storage(&self.path, e))?;

        Ok(())
    }

    /// Read every record in the log.
    ///
    /// A missing file reads as empty. Malformed lines are skipped with a
    /// warning.
    pub fn read_all(&self) -> Result<Vec<EventLogRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path).map_err(|e| FlowError::storage(&self.path, e))?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| FlowError::storage(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<EventLogRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    "Skipping malformed event log line {} in {}: {}",
                    index + 1,
                    self.path.display(),
                    e
                ),
            }
        }

        Ok(records)
    }
}

impl EventSink for JsonlEventLog {
    fn record(&self, event: &PerceptionEvent) -> Result<()> {
        self.append(&EventLogRecord::new(event.clone()))
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}
