//! Error types for the probe pipeline.
//!
//! Configuration problems are caught before a probe is launched. Resource
//! problems (the probe cannot start, the log cannot be written) end the run.
//! Unparseable probe output is never an error; the parser drops it.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can end a run.
#[derive(Debug, Error)]
pub enum PingStatsError {
    /// Invalid configuration; the run never started.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The probe binary could not be spawned.
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The persistence sink failed.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A configuration value that cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No target address was given.
    #[error("a target address is required")]
    MissingAddress,

    /// Window length must be at least one.
    #[error("window length must be at least 1, got {0}")]
    InvalidWindowLength(i64),

    /// The log file name contains a character the destination cannot hold.
    #[error("illegal log file name {0:?}")]
    IllegalName(String),

    /// A duration string could not be parsed.
    #[error("invalid duration {0:?}")]
    InvalidDuration(String),

    /// The configuration file or environment could not be loaded.
    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

/// Which sink operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOp {
    Open,
    Write,
    Flush,
    Read,
}

impl fmt::Display for SinkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SinkOp::Open => "open",
            SinkOp::Write => "write",
            SinkOp::Flush => "flush",
            SinkOp::Read => "read",
        })
    }
}

/// A failure reading or writing a record log.
#[derive(Debug, Error)]
#[error("failed to {op} {}: {source}", path.display())]
pub struct SinkError {
    pub op: SinkOp,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl SinkError {
    pub fn new(op: SinkOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Result alias for the crate.
pub type Result<T, E = PingStatsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_error_names_operation_and_path() {
        let err = SinkError::new(
            SinkOp::Write,
            "/var/log/ping.csv",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(err.to_string(), "failed to write /var/log/ping.csv: disk full");
    }

    #[test]
    fn config_error_converts() {
        let err: PingStatsError = ConfigError::InvalidWindowLength(0).into();
        assert!(matches!(err, PingStatsError::Config(ConfigError::InvalidWindowLength(0))));
        assert_eq!(
            err.to_string(),
            "configuration error: window length must be at least 1, got 0"
        );
    }

    #[test]
    fn launch_error_names_program() {
        let err = PingStatsError::Launch {
            program: "ping".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().starts_with("failed to launch ping"));
    }
}
