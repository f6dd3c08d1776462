//! Layered settings.
//!
//! Values are resolved in order, later layers winning:
//!
//! 1. built-in defaults
//! 2. an optional configuration file (any format the `config` crate reads)
//! 3. `PINGSTATS_*` environment variables, e.g. `PINGSTATS_WINDOW_LENGTH=100`
//!    or `PINGSTATS_PROBE__PROGRAM=/usr/bin/ping`
//! 4. command-line flags, applied by the binary
//!
//! ```toml
//! address = "1.1.1.1"
//! window_length = 120
//! name = "office-uplink"
//!
//! [probe]
//! grace_ms = 1000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::duration::parse_duration;
use crate::data::{Thresholds, DEFAULT_WINDOW_LENGTH};
use crate::error::ConfigError;
use crate::ingest::IngestConfig;
use crate::parse::Dialect;
use crate::probe::{split_args, ProbeCommand};
use crate::sink::OpenMode;

/// Log file name used when none is given.
pub const DEFAULT_LOG_NAME: &str = "PingStatsLog.csv";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PINGSTATS";

/// Everything a run can be configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Target host or IP.
    pub address: Option<String>,
    /// Extra probe arguments as one string, split like a shell would.
    pub custom_args: Option<String>,
    /// Directory for the log file.
    pub path: Option<PathBuf>,
    /// Log file name, without the `.csv` extension.
    pub name: Option<String>,
    /// Write records to the log file.
    pub persist: bool,
    pub open_mode: OpenMode,
    /// Records kept for the live chart.
    pub window_length: usize,
    /// Live chart refresh interval in milliseconds.
    pub refresh_ms: u64,
    /// Output format of the probe; the host's own when unset.
    pub dialect: Option<Dialect>,
    pub probe: ProbeCommand,
    /// Stop after this long, e.g. "30s" or "5m".
    pub duration: Option<String>,
    /// Latency that marks the link as degraded, e.g. "100ms".
    pub latency_warn: String,
    /// Latency that marks the link as critical.
    pub latency_crit: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address: None,
            custom_args: None,
            path: None,
            name: None,
            persist: true,
            open_mode: OpenMode::Append,
            window_length: DEFAULT_WINDOW_LENGTH,
            refresh_ms: 500,
            dialect: None,
            probe: ProbeCommand::default(),
            duration: None,
            latency_warn: "100ms".to_string(),
            latency_crit: "500ms".to_string(),
        }
    }
}

impl Settings {
    /// Load defaults, then `file` if given, then the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(file, None)
    }

    /// Like [`Settings::load`], with the environment replaced by `env`.
    pub fn load_with_env(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Where the log file goes.
    pub fn destination(&self) -> Result<LogDestination, ConfigError> {
        LogDestination::resolve(self.path.as_deref(), self.name.as_deref())
    }

    /// The optional run limit.
    pub fn run_limit(&self) -> Result<Option<Duration>, ConfigError> {
        self.duration.as_deref().map(parse_duration).transpose()
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms.max(1))
    }

    /// Latency and loss limits for the health indicator.
    pub fn thresholds(&self) -> Result<Thresholds, ConfigError> {
        Ok(Thresholds {
            latency_warning: parse_duration(&self.latency_warn)?,
            latency_critical: parse_duration(&self.latency_crit)?,
            ..Thresholds::default()
        })
    }

    /// Validate and build the ingestion configuration.
    pub fn ingest_config(&self) -> Result<IngestConfig, ConfigError> {
        let address = self
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or(ConfigError::MissingAddress)?;
        if self.window_length == 0 {
            return Err(ConfigError::InvalidWindowLength(0));
        }

        Ok(IngestConfig {
            address: address.to_string(),
            extra_probe_args: self
                .custom_args
                .as_deref()
                .map(split_args)
                .unwrap_or_default(),
            window_length: self.window_length,
            persist: self.persist,
            destination: self.destination()?,
            open_mode: self.open_mode,
            dialect: self.dialect.unwrap_or_default(),
            probe: self.probe.clone(),
            run_limit: self.run_limit()?,
        })
    }
}

/// Resolved log file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDestination {
    pub dir: PathBuf,
    pub file_name: String,
}

impl LogDestination {
    /// Build from an optional directory and an optional name.
    ///
    /// A given name gets `.csv` appended unless it already ends in it.
    /// Names containing `*`, NUL or a path separator are rejected.
    pub fn resolve(dir: Option<&Path>, name: Option<&str>) -> Result<Self, ConfigError> {
        let file_name = match name {
            None => DEFAULT_LOG_NAME.to_string(),
            Some(name) => {
                if name.is_empty() || name.contains(['*', '\0', '/', '\\']) {
                    return Err(ConfigError::IllegalName(name.to_string()));
                }
                if name.ends_with(".csv") {
                    name.to_string()
                } else {
                    format!("{name}.csv")
                }
            }
        };

        Ok(Self {
            dir: dir.map(Path::to_path_buf).unwrap_or_default(),
            file_name,
        })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

impl Default for LogDestination {
    fn default() -> Self {
        Self {
            dir: PathBuf::new(),
            file_name: DEFAULT_LOG_NAME.to_string(),
        }
    }
}
