//! Append-only CSV log.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use pingstats_types::{row, Record};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::RecordSink;
use crate::error::{SinkError, SinkOp};

/// What to do with an existing log file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenMode {
    /// Keep existing rows and add after them.
    #[default]
    Append,
    /// Start the file over. Only ever done at open.
    Fresh,
}

/// Writes one CSV row per record.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl CsvSink {
    /// Open (creating if needed) the log at `path`.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            OpenMode::Append => options.append(true),
            OpenMode::Fresh => options.write(true).truncate(true),
        };

        let file = options
            .open(&path)
            .map_err(|e| SinkError::new(SinkOp::Open, &path, e))?;
        debug!(path = %path.display(), ?mode, "opened log");

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written through this handle.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl RecordSink for CsvSink {
    fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        writeln!(self.writer, "{}", row::encode(record))
            .map_err(|e| SinkError::new(SinkOp::Write, &self.path, e))?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer
            .flush()
            .map_err(|e| SinkError::new(SinkOp::Flush, &self.path, e))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Read a log back into records.
///
/// Blank lines are ignored. Rows that do not decode are skipped with a
/// warning so one damaged line does not hide the rest of the file.
pub fn read_log(path: impl AsRef<Path>) -> Result<Vec<Record>, SinkError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SinkError::new(SinkOp::Open, path, e))?;

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| SinkError::new(SinkOp::Read, path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match row::decode(&line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(path = %path.display(), line = index + 1, error = %e, "skipping row"),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pingstats_types::Timestamp;
    use tempfile::TempDir;

    fn record(seq: u64) -> Record {
        let at = Timestamp::from_millis(1_700_000_000_000 + seq * 1000);
        if seq % 3 == 0 {
            Record::failure(at, "example.com", seq)
        } else {
            Record::success(at, "example.com", seq, seq as f64 * 1.25)
                .with_size(Some(64))
                .with_ttl(Some(55))
        }
    }

    #[test]
    fn written_rows_read_back_equal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");

        let mut sink = CsvSink::open(&path, OpenMode::Fresh).unwrap();
        let records: Vec<Record> = (1..=10).map(record).collect();
        for r in &records {
            sink.write(r).unwrap();
        }
        sink.flush().unwrap();
        assert_eq!(sink.written(), 10);

        assert_eq!(read_log(&path).unwrap(), records);
    }

    #[test]
    fn append_keeps_existing_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");

        {
            let mut sink = CsvSink::open(&path, OpenMode::Append).unwrap();
            sink.write(&record(1)).unwrap();
            sink.flush().unwrap();
        }
        {
            let mut sink = CsvSink::open(&path, OpenMode::Append).unwrap();
            sink.write(&record(2)).unwrap();
            sink.flush().unwrap();
        }

        let seqs: Vec<u64> = read_log(&path).unwrap().iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn fresh_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(&path, "old,junk\n").unwrap();

        let mut sink = CsvSink::open(&path, OpenMode::Fresh).unwrap();
        sink.write(&record(5)).unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(!content.contains("junk"));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        let good = row::encode(&record(1));
        std::fs::write(&path, format!("{good}\n\nnot,a,row\n{good}\n")).unwrap();

        assert_eq!(read_log(&path).unwrap().len(), 2);
    }

    #[test]
    fn unwritable_destination_reports_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("log.csv");

        let err = CsvSink::open(&path, OpenMode::Append).unwrap_err();
        assert_eq!(err.op, SinkOp::Open);
        assert_eq!(err.path, path);
    }

    #[test]
    fn missing_log_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_log(dir.path().join("nope.csv")).is_err());
    }

    #[test]
    fn describe_is_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        let sink = CsvSink::open(&path, OpenMode::Append).unwrap();
        assert_eq!(sink.describe(), path.display().to_string());
        assert_eq!(sink.path(), path.as_path());
    }
}
