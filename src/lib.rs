// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # pingstats
//!
//! Runs the system `ping` against one host, turns every line it prints into
//! a typed [`Record`], keeps the most recent ones for a live chart and
//! appends all of them to a CSV log.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Ingestor                              │
//! │  ┌────────────┐    ┌──────────┐    ┌────────┐    ┌────────────┐  │
//! │  │   probe    │───▶│  parse   │───▶│ Record │─┬─▶│    sink    │  │
//! │  │(supervisor)│line│(dialect) │    └────────┘ │  │ (CSV log)  │  │
//! │  └────────────┘    └──────────┘               │  └────────────┘  │
//! │                                               │  ┌────────────┐  │
//! │                                               └─▶│    data    │  │
//! │                                                  │  (window)  │  │
//! │                                                  └─────┬──────┘  │
//! └────────────────────────────────────────────────────────┼─────────┘
//!                                                           ▼
//!                                                  app / ui (chart)
//! ```
//!
//! - **[`probe`]**: Launches `ping`, merges its stdout and stderr into one
//!   line stream, and stops it politely then forcibly
//! - **[`parse`]**: Classifies lines per output [`Dialect`] and assigns
//!   sequence numbers
//! - **[`data`]**: The bounded [`SlidingWindow`], run statistics and health
//! - **[`sink`]**: The append-only CSV log and the [`RecordSink`] trait
//! - **[`ingest`]**: The [`Ingestor`] state machine tying the above together
//! - **[`config`]**: Layered [`Settings`] (file, environment, flags)
//! - **[`app`]**, **[`ui`]**, **[`events`]**: The terminal chart
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Log to PingStatsLog.csv in the current directory
//! pingstats -a 1.1.1.1
//!
//! # Live chart of the last 100 replies, nothing written to disk
//! pingstats -a 1.1.1.1 -s -l 100 --no-file
//!
//! # Chart an earlier log
//! pingstats --plot-file PingStatsLog.csv
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use pingstats::{stop_channel, IngestConfig, Ingestor};
//!
//! # tokio_test::block_on(async {
//! let mut ingestor = Ingestor::new(IngestConfig::new("127.0.0.1"))?;
//! let window = ingestor.window();
//! let (stop, stop_rx) = stop_channel();
//!
//! let run = tokio::spawn(async move { ingestor.run(stop_rx).await });
//! // ... draw window.snapshot() as it fills ...
//! stop.stop();
//! let summary = run.await??;
//! println!("{} replies", summary.stats.received);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod ingest;
pub mod parse;
pub mod probe;
pub mod sink;
pub mod ui;

pub use app::App;
pub use config::{LogDestination, Settings};
pub use data::{HealthStatus, RunStats, SharedWindow, SlidingWindow, Thresholds, WindowSnapshot};
pub use error::{ConfigError, PingStatsError, SinkError};
pub use ingest::{stop_channel, IngestConfig, IngestState, Ingestor, RunExit, RunSummary, StopHandle};
pub use parse::{Dialect, Parser};
pub use pingstats_types::{Record, Timestamp};
pub use probe::{ProbeCommand, ProbeSupervisor};
pub use sink::{CsvSink, OpenMode, RecordSink};
