//! The ingestion loop: probe lines in, records out.
//!
//! An [`Ingestor`] owns one probe, one parser, one sink and the shared
//! window. It moves through four states:
//!
//! ```text
//!  Idle ──start()──▶ Running ──(stream ends | stop())──▶ Draining ──▶ Stopped
//! ```
//!
//! It can be driven two ways. A UI loop calls [`Ingestor::pump`] on a timer
//! and never blocks; a background task calls [`Ingestor::run`], which waits
//! on the probe and a stop signal together. Either way [`Ingestor::stop`]
//! finishes the run and returns the [`RunSummary`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use pingstats_types::Record;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::LogDestination;
use crate::data::{RunStats, SharedWindow, DEFAULT_WINDOW_LENGTH};
use crate::error::{ConfigError, PingStatsError, Result};
use crate::parse::{Dialect, Parser};
use crate::probe::{LinePoll, ProbeCommand, ProbeSupervisor};
use crate::sink::{CsvSink, OpenMode, RecordSink};

/// How long `stop` keeps reading output already in flight.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

/// Everything one run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub address: String,
    /// Forwarded verbatim to the probe, before the address.
    pub extra_probe_args: Vec<String>,
    pub window_length: usize,
    pub persist: bool,
    pub destination: LogDestination,
    pub open_mode: OpenMode,
    pub dialect: Dialect,
    pub probe: ProbeCommand,
    /// Stop on our own after this long.
    pub run_limit: Option<Duration>,
}

impl IngestConfig {
    /// A non-persisting run against `address` with default settings.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            extra_probe_args: Vec::new(),
            window_length: DEFAULT_WINDOW_LENGTH,
            persist: false,
            destination: LogDestination::default(),
            open_mode: OpenMode::Append,
            dialect: Dialect::for_host(),
            probe: ProbeCommand::default(),
            run_limit: None,
        }
    }

    pub fn with_window_length(mut self, window_length: usize) -> Self {
        self.window_length = window_length;
        self
    }

    pub fn with_probe(mut self, probe: ProbeCommand) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Persist every record to `destination`.
    pub fn persist_to(mut self, destination: LogDestination, open_mode: OpenMode) -> Self {
        self.persist = true;
        self.destination = destination;
        self.open_mode = open_mode;
        self
    }

    pub fn with_run_limit(mut self, limit: Duration) -> Self {
        self.run_limit = Some(limit);
        self
    }
}

/// Lifecycle of an [`Ingestor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IngestState {
    /// Configured, probe not launched.
    Idle,
    /// Probe running, records flowing.
    Running,
    /// Shutting down; no new probe output is awaited.
    Draining,
    /// Finished. Terminal.
    Stopped,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunExit {
    /// The probe closed its output on its own.
    ProbeExited,
    /// Stopped on request.
    Stopped,
    /// The configured run limit elapsed.
    TimeLimit,
    /// The sink failed.
    SinkFailed,
}

/// Final counts of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub lines_read: u64,
    pub records_observed: u64,
    pub records_written: u64,
    pub exit: RunExit,
    pub stats: RunStats,
}

/// Requests a running [`Ingestor::run`] to stop.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Ask the loop to stop. Safe to call any number of times.
    pub fn stop(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a stop handle and the receiver [`Ingestor::run`] listens on.
pub fn stop_channel() -> (StopHandle, watch::Receiver<bool>) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, rx)
}

enum Event {
    Line(Option<String>),
    Stop,
    TimeLimit,
    SignalClosed,
}

/// Orchestrates one probe run.
#[derive(Debug)]
pub struct Ingestor {
    config: IngestConfig,
    state: IngestState,
    parser: Parser,
    window: SharedWindow,
    sink: Option<Box<dyn RecordSink>>,
    probe: Option<ProbeSupervisor>,
    stats: RunStats,
    lines_read: u64,
    records_observed: u64,
    records_written: u64,
    started_at: Option<Instant>,
    exit: Option<RunExit>,
    tap: Option<mpsc::Sender<Record>>,
}

impl Ingestor {
    /// Validate `config` and open its sink. Nothing is launched yet.
    pub fn new(config: IngestConfig) -> Result<Self> {
        validate(&config)?;
        let sink: Option<Box<dyn RecordSink>> = if config.persist {
            let sink = CsvSink::open(config.destination.path(), config.open_mode)?;
            info!(path = %sink.path().display(), "logging records");
            Some(Box::new(sink))
        } else {
            None
        };
        Self::build(config, sink)
    }

    /// Like [`Ingestor::new`] but writing to `sink` instead of the
    /// configured destination.
    pub fn with_sink(config: IngestConfig, sink: Box<dyn RecordSink>) -> Result<Self> {
        Self::build(config, Some(sink))
    }

    fn build(config: IngestConfig, sink: Option<Box<dyn RecordSink>>) -> Result<Self> {
        validate(&config)?;
        let window = SharedWindow::new(config.window_length)?;
        let parser = Parser::new(config.dialect, config.address.trim());

        Ok(Self {
            config,
            state: IngestState::Idle,
            parser,
            window,
            sink,
            probe: None,
            stats: RunStats::new(),
            lines_read: 0,
            records_observed: 0,
            records_written: 0,
            started_at: None,
            exit: None,
            tap: None,
        })
    }

    /// Launch the probe.
    ///
    /// Must be called from within a Tokio runtime. Does nothing unless the
    /// ingestor is idle.
    pub fn start(&mut self) -> Result<()> {
        if self.state != IngestState::Idle {
            warn!(state = ?self.state, "start ignored");
            return Ok(());
        }

        let probe = ProbeSupervisor::start(
            &self.config.probe,
            self.parser.address(),
            &self.config.extra_probe_args,
        )?;
        info!(
            address = %self.parser.address(),
            dialect = self.parser.dialect_name(),
            window = self.config.window_length,
            "ingestion started"
        );

        self.probe = Some(probe);
        self.started_at = Some(Instant::now());
        self.state = IngestState::Running;
        Ok(())
    }

    /// Process every line already buffered, without waiting.
    ///
    /// Returns the number of new records. When the probe's output has ended
    /// the ingestor moves to [`IngestState::Draining`]; call
    /// [`Ingestor::stop`] to reap the probe and finish.
    pub fn pump(&mut self) -> Result<usize> {
        if self.state != IngestState::Running {
            return Ok(0);
        }
        let before = self.records_observed;

        loop {
            let Some(probe) = self.probe.as_mut() else {
                break;
            };
            match probe.try_next_line() {
                LinePoll::Line(line) => {
                    if let Err(e) = self.handle_line(&line) {
                        return Err(self.fail(e));
                    }
                }
                LinePoll::Pending => break,
                LinePoll::Closed => {
                    info!("probe output ended");
                    self.exit.get_or_insert(RunExit::ProbeExited);
                    self.state = IngestState::Draining;
                    break;
                }
            }
        }

        let added = (self.records_observed - before) as usize;
        if added > 0 {
            if let Err(e) = self.flush() {
                return Err(self.fail(e));
            }
        }
        Ok(added)
    }

    /// Ingest until the probe exits, `stop_rx` turns true or the run
    /// limit elapses, then stop.
    ///
    /// Starts the probe first if needed. A sink failure stops the probe and
    /// is returned as the error.
    pub async fn run(&mut self, mut stop_rx: watch::Receiver<bool>) -> Result<RunSummary> {
        if self.state == IngestState::Idle {
            self.start()?;
        }

        let deadline = self
            .config
            .run_limit
            .map(|limit| tokio::time::Instant::now() + limit);
        let mut listening = true;
        if *stop_rx.borrow_and_update() {
            self.exit.get_or_insert(RunExit::Stopped);
            return self.stop().await;
        }

        while self.state == IngestState::Running {
            let Some(probe) = self.probe.as_mut() else {
                break;
            };

            let event = tokio::select! {
                line = probe.next_line() => Event::Line(line),
                changed = stop_rx.changed(), if listening => match changed {
                    Ok(()) if *stop_rx.borrow_and_update() => Event::Stop,
                    Ok(()) => continue,
                    Err(_) => Event::SignalClosed,
                },
                _ = sleep_until(deadline) => Event::TimeLimit,
            };

            match event {
                Event::Line(Some(line)) => {
                    let observed = self.records_observed;
                    let handled = self.handle_line(&line).and_then(|()| {
                        if self.records_observed > observed {
                            self.flush()
                        } else {
                            Ok(())
                        }
                    });
                    if let Err(e) = handled {
                        let e = self.fail(e);
                        self.finish_after_failure().await;
                        return Err(e);
                    }
                }
                Event::Line(None) => {
                    info!("probe output ended");
                    self.exit.get_or_insert(RunExit::ProbeExited);
                    break;
                }
                Event::Stop => {
                    info!("stop requested");
                    self.exit.get_or_insert(RunExit::Stopped);
                    break;
                }
                Event::TimeLimit => {
                    info!("run limit reached");
                    self.exit.get_or_insert(RunExit::TimeLimit);
                    break;
                }
                Event::SignalClosed => {
                    debug!("stop handle dropped, running until the probe exits");
                    listening = false;
                }
            }
        }

        self.stop().await
    }

    /// Stop the probe, drain what it already wrote, flush the sink.
    ///
    /// Idempotent: later calls return the same summary.
    pub async fn stop(&mut self) -> Result<RunSummary> {
        match self.state {
            IngestState::Stopped => return Ok(self.summary()),
            IngestState::Idle => {
                self.exit.get_or_insert(RunExit::Stopped);
                self.state = IngestState::Stopped;
                self.flush()?;
                return Ok(self.summary());
            }
            IngestState::Running | IngestState::Draining => {}
        }

        self.state = IngestState::Draining;
        self.exit.get_or_insert(RunExit::Stopped);

        if let Some(probe) = self.probe.as_mut() {
            if let Err(e) = probe.stop().await {
                warn!(error = %e, "failed to stop probe cleanly");
            }
        }

        let drained = if self.exit == Some(RunExit::SinkFailed) {
            Ok(())
        } else {
            self.drain().await
        };
        let flushed = self.flush();
        self.state = IngestState::Stopped;

        let summary = self.summary();
        info!(
            lines = summary.lines_read,
            records = summary.records_observed,
            written = summary.records_written,
            exit = ?summary.exit,
            "ingestion stopped"
        );

        drained?;
        flushed?;
        Ok(summary)
    }

    /// Receive a copy of every record from now on.
    ///
    /// Delivery is best-effort: when the receiver falls `capacity` records
    /// behind, new records are dropped for it. The window and sink are
    /// unaffected.
    pub fn tap(&mut self, capacity: usize) -> mpsc::Receiver<Record> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.tap = Some(tx);
        rx
    }

    /// True once the configured run limit has elapsed.
    pub fn limit_reached(&self) -> bool {
        match (self.config.run_limit, self.started_at) {
            (Some(limit), Some(started)) => started.elapsed() >= limit,
            _ => false,
        }
    }

    /// Mark the run as ending because of its limit. For polling callers.
    pub fn expire(&mut self) {
        self.exit.get_or_insert(RunExit::TimeLimit);
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    /// The window readers should draw from.
    pub fn window(&self) -> SharedWindow {
        self.window.clone()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn address(&self) -> &str {
        self.parser.address()
    }

    /// Where records are persisted, if anywhere.
    pub fn sink_description(&self) -> Option<String> {
        self.sink.as_ref().map(|s| s.describe())
    }

    pub fn probe_id(&self) -> Option<u32> {
        self.probe.as_ref().and_then(ProbeSupervisor::id)
    }

    /// Time since the probe was launched.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }

    /// Counts so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            lines_read: self.lines_read,
            records_observed: self.records_observed,
            records_written: self.records_written,
            exit: self.exit.unwrap_or(RunExit::Stopped),
            stats: self.stats.clone(),
        }
    }

    fn handle_line(&mut self, line: &str) -> Result<()> {
        self.lines_read += 1;
        let Some(record) = self.parser.parse(line) else {
            return Ok(());
        };
        self.records_observed += 1;
        self.stats.record(&record);

        if let Some(sink) = self.sink.as_mut() {
            sink.write(&record)?;
            self.records_written += 1;
        }

        if let Some(tap) = &self.tap {
            match tap.try_send(record.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => debug!("tap full, record not forwarded"),
                Err(mpsc::error::TrySendError::Closed(_)) => self.tap = None,
            }
        }

        self.window.append(record);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(sink) = self.sink.as_mut() {
            sink.flush()?;
        }
        Ok(())
    }

    fn fail(&mut self, e: PingStatsError) -> PingStatsError {
        error!(error = %e, "ingestion failed");
        self.exit = Some(RunExit::SinkFailed);
        self.state = IngestState::Draining;
        e
    }

    async fn finish_after_failure(&mut self) {
        if let Err(e) = self.stop().await {
            debug!(error = %e, "error while stopping after failure");
        }
    }

    async fn drain(&mut self) -> Result<()> {
        let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
        loop {
            let Some(probe) = self.probe.as_mut() else {
                return Ok(());
            };
            match tokio::time::timeout_at(deadline, probe.next_line()).await {
                Ok(Some(line)) => self.handle_line(&line)?,
                Ok(None) => return Ok(()),
                Err(_) => {
                    debug!("output still open after stop, not waiting further");
                    return Ok(());
                }
            }
        }
    }
}

/// Reject a config that cannot run, before anything touches the disk.
fn validate(config: &IngestConfig) -> Result<()> {
    if config.address.trim().is_empty() {
        return Err(ConfigError::MissingAddress.into());
    }
    if config.window_length == 0 {
        return Err(ConfigError::InvalidWindowLength(0).into());
    }
    Ok(())
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::{SinkError, SinkOp};
    use crate::sink::MemorySink;

    fn script(body: &str) -> ProbeCommand {
        ProbeCommand::new("/bin/sh")
            .with_args(["-c", body, "probe"])
            .with_grace(Duration::from_millis(200))
    }

    fn replies(n: usize) -> String {
        (0..n)
            .map(|i| format!("echo '64 bytes from 127.0.0.1: icmp_seq={i} ttl=64 time=1.{i} ms'"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn config(body: &str) -> IngestConfig {
        IngestConfig::new("127.0.0.1")
            .with_dialect(Dialect::Posix)
            .with_probe(script(body))
    }

    #[derive(Debug)]
    struct BrokenSink;

    impl RecordSink for BrokenSink {
        fn write(&mut self, _: &Record) -> std::result::Result<(), SinkError> {
            Err(SinkError::new(
                SinkOp::Write,
                "/dev/full",
                std::io::Error::new(std::io::ErrorKind::Other, "no space left on device"),
            ))
        }

        fn flush(&mut self) -> std::result::Result<(), SinkError> {
            Ok(())
        }

        fn describe(&self) -> String {
            "broken".into()
        }
    }

    #[test]
    fn empty_address_is_rejected() {
        let err = Ingestor::new(IngestConfig::new(" ")).unwrap_err();
        assert!(matches!(err, PingStatsError::Config(ConfigError::MissingAddress)));
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = Ingestor::new(IngestConfig::new("h").with_window_length(0)).unwrap_err();
        assert!(matches!(
            err,
            PingStatsError::Config(ConfigError::InvalidWindowLength(0))
        ));
    }

    #[test]
    fn invalid_config_leaves_existing_log_alone() {
        let dir = tempfile::tempdir().unwrap();
        let destination = LogDestination::resolve(Some(dir.path()), Some("keep")).unwrap();
        let path = destination.path();
        std::fs::write(&path, "1.000,h,1,true,64,1.0\n").unwrap();
        let before = std::fs::metadata(&path).unwrap().len();

        let cfg = IngestConfig::new("").persist_to(destination.clone(), OpenMode::Fresh);
        assert!(matches!(
            Ingestor::new(cfg),
            Err(PingStatsError::Config(ConfigError::MissingAddress))
        ));
        let cfg = IngestConfig::new("h")
            .with_window_length(0)
            .persist_to(destination, OpenMode::Fresh);
        assert!(matches!(
            Ingestor::new(cfg),
            Err(PingStatsError::Config(ConfigError::InvalidWindowLength(0)))
        ));

        assert_eq!(std::fs::metadata(&path).unwrap().len(), before);
    }

    #[test]
    fn new_is_idle() {
        let ingestor = Ingestor::new(IngestConfig::new("h")).unwrap();
        assert_eq!(ingestor.state(), IngestState::Idle);
        assert_eq!(ingestor.sink_description(), None);
        assert!(ingestor.window().is_empty());
    }

    #[tokio::test]
    async fn stop_before_start_is_clean() {
        let mut ingestor = Ingestor::new(IngestConfig::new("h")).unwrap();
        let summary = ingestor.stop().await.unwrap();
        assert_eq!(summary.exit, RunExit::Stopped);
        assert_eq!(ingestor.state(), IngestState::Stopped);
        // Once stopped, start does nothing.
        ingestor.start().unwrap();
        assert_eq!(ingestor.state(), IngestState::Stopped);
    }

    #[tokio::test]
    async fn launch_failure_never_runs() {
        let cfg = IngestConfig::new("h").with_probe(ProbeCommand::new("/nonexistent/probe"));
        let mut ingestor = Ingestor::new(cfg).unwrap();
        assert!(matches!(ingestor.start(), Err(PingStatsError::Launch { .. })));
        assert_eq!(ingestor.state(), IngestState::Idle);
    }

    #[tokio::test]
    async fn run_until_probe_exits() {
        let body = format!("echo 'PING 127.0.0.1 (127.0.0.1): 56 data bytes'; {}", replies(3));
        let mut ingestor = Ingestor::with_sink(config(&body), Box::new(MemorySink::new())).unwrap();
        let (_stop, rx) = stop_channel();

        let summary = ingestor.run(rx).await.unwrap();
        assert_eq!(summary.exit, RunExit::ProbeExited);
        assert_eq!(summary.lines_read, 4);
        assert_eq!(summary.records_observed, 3);
        assert_eq!(summary.records_written, 3);
        assert_eq!(summary.stats.received, 3);
        assert_eq!(ingestor.state(), IngestState::Stopped);
        assert_eq!(ingestor.window().len(), 3);
    }

    #[tokio::test]
    async fn run_stops_on_signal() {
        let mut ingestor = Ingestor::new(config("exec sleep 30")).unwrap();
        let (stop, rx) = stop_channel();

        let task = tokio::spawn(async move { ingestor.run(rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.stop();
        stop.stop();

        let summary = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("run did not stop in time")
            .unwrap()
            .unwrap();
        assert_eq!(summary.exit, RunExit::Stopped);
    }

    #[tokio::test]
    async fn run_honours_time_limit() {
        let cfg = config("exec sleep 30").with_run_limit(Duration::from_millis(100));
        let mut ingestor = Ingestor::new(cfg).unwrap();
        let (_stop, rx) = stop_channel();

        let summary = tokio::time::timeout(Duration::from_secs(5), ingestor.run(rx))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.exit, RunExit::TimeLimit);
    }

    #[tokio::test]
    async fn sink_failure_is_fatal_and_stops_probe() {
        let body = format!("{}; exec sleep 30", replies(1));
        let mut ingestor = Ingestor::with_sink(config(&body), Box::new(BrokenSink)).unwrap();
        let (_stop, rx) = stop_channel();

        let err = tokio::time::timeout(Duration::from_secs(5), ingestor.run(rx))
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, PingStatsError::Sink(ref e) if e.op == SinkOp::Write));
        assert_eq!(ingestor.state(), IngestState::Stopped);
        assert_eq!(ingestor.summary().exit, RunExit::SinkFailed);
    }

    #[tokio::test]
    async fn pump_drives_the_same_pipeline() {
        let mut ingestor = Ingestor::new(config(&replies(4)).with_window_length(2)).unwrap();
        ingestor.start().unwrap();
        assert_eq!(ingestor.state(), IngestState::Running);

        let mut total = 0;
        for _ in 0..100 {
            total += ingestor.pump().unwrap();
            if ingestor.state() == IngestState::Draining {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(ingestor.state(), IngestState::Draining);
        assert_eq!(total, 4);

        let summary = ingestor.stop().await.unwrap();
        assert_eq!(summary.exit, RunExit::ProbeExited);
        assert_eq!(ingestor.window().len(), 2);
        assert_eq!(ingestor.pump().unwrap(), 0);
    }

    #[tokio::test]
    async fn tap_sees_every_record() {
        let mut ingestor = Ingestor::new(config(&replies(3))).unwrap();
        let mut tap = ingestor.tap(16);
        let (_stop, rx) = stop_channel();
        ingestor.run(rx).await.unwrap();

        let mut seqs = Vec::new();
        while let Ok(record) = tap.try_recv() {
            seqs.push(record.sequence);
        }
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn run_flushes_each_record() {
        let dir = tempfile::tempdir().unwrap();
        let destination = LogDestination::resolve(Some(dir.path()), Some("live")).unwrap();
        let path = destination.path();
        let body = format!("{}; exec sleep 30", replies(3));
        let cfg = config(&body).persist_to(destination, OpenMode::Fresh);
        let mut ingestor = Ingestor::new(cfg).unwrap();
        let mut tap = ingestor.tap(16);
        let (stop, rx) = stop_channel();
        let task = tokio::spawn(async move { ingestor.run(rx).await });

        for _ in 0..3 {
            tokio::time::timeout(Duration::from_secs(5), tap.recv())
                .await
                .unwrap()
                .unwrap();
        }
        let mut on_disk = 0;
        for _ in 0..50 {
            on_disk = crate::sink::read_log(&path).unwrap().len();
            if on_disk == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(on_disk, 3, "rows still buffered while the probe runs");

        stop.stop();
        let summary = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(summary.records_written, 3);
    }

    #[tokio::test]
    async fn stop_reads_output_never_pumped() {
        let body = format!("{}; exec sleep 30", replies(3));
        let mut ingestor = Ingestor::new(config(&body)).unwrap();
        ingestor.start().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let summary = tokio::time::timeout(Duration::from_secs(5), ingestor.stop())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.records_observed, 3);
        assert_eq!(ingestor.window().len(), 3);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mut ingestor = Ingestor::new(config("exec sleep 30")).unwrap();
        ingestor.start().unwrap();
        let first = ingestor.stop().await.unwrap();
        let second = ingestor.stop().await.unwrap();
        assert_eq!(first, second);
    }
}
