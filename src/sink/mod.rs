//! Where records go once parsed.
//!
//! The ingestion loop writes every record to exactly one [`RecordSink`] and
//! never reads it back during a run.

mod csv;

pub use csv::{read_log, CsvSink, OpenMode};

use std::fmt::Debug;

use pingstats_types::Record;

use crate::error::SinkError;

/// A destination for records.
///
/// Errors are fatal to the run: a sink that cannot write must say so rather
/// than drop data.
pub trait RecordSink: Send + Debug {
    /// Persist one record.
    fn write(&mut self, record: &Record) -> Result<(), SinkError>;

    /// Push buffered records to the destination.
    fn flush(&mut self) -> Result<(), SinkError>;

    /// Human-readable destination, for logs and the status bar.
    fn describe(&self) -> String;
}

/// A sink that keeps records in memory.
///
/// Useful for embedding and for tests; has no I/O and never fails.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<Record>,
    pub flushes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for MemorySink {
    fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.flushes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
