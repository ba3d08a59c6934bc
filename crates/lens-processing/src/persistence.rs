//! Upload log sinks.
//!
//! Every successful upload yields an [`UploadRecord`]. The pipeline hands it
//! to an [`UploadSink`]; a sink failure never fails the upload itself.

use crate::types::UploadRecord;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while persisting an upload record.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to write upload log: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize upload record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Destination for upload metadata.
pub trait UploadSink: Send + Sync {
    fn record(&self, record: &UploadRecord) -> Result<(), SinkError>;
}

/// Appends one JSON object per line to a file.
///
/// Appends from different threads are serialized so lines never interleave.
#[derive(Debug)]
pub struct JsonLinesUploadLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesUploadLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record in the log. A missing file yields no records.
    pub fn read_all(&self) -> Result<Vec<UploadRecord>, SinkError> {
        let _guard = self.lock.lock();
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(SinkError::from))
            .collect()
    }
}

impl UploadSink for JsonLinesUploadLog {
    fn record(&self, record: &UploadRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.lock.lock();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryUploadLog {
    records: Mutex<Vec<UploadRecord>>,
}

impl MemoryUploadLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records so far, oldest first.
    pub fn records(&self) -> Vec<UploadRecord> {
        self.records.lock().clone()
    }
}

impl UploadSink for MemoryUploadLog {
    fn record(&self, record: &UploadRecord) -> Result<(), SinkError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

static_assertions::assert_impl_all!(JsonLinesUploadLog: Send, Sync);
static_assertions::assert_impl_all!(MemoryUploadLog: Send, Sync);
