//! Application state for the terminal view.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use pingstats_types::Record;
use tracing::{info, warn};

use crate::data::{HealthStatus, RunStats, SharedWindow, SlidingWindow, Thresholds, WindowSnapshot};
use crate::error::PingStatsError;
use crate::ingest::{IngestState, Ingestor, RunSummary};
use crate::sink::read_log;
use crate::ui::Theme;

/// Rows kept for the recent-replies table.
pub const RECENT_ROWS: usize = 64;

const STATUS_TTL: Duration = Duration::from_secs(3);

/// Where the records on screen come from.
#[derive(Debug)]
pub enum Feed {
    /// A probe running now.
    Live(Ingestor),
    /// A log written by an earlier run.
    Log(PathBuf),
}

/// Main application state.
#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub show_help: bool,
    /// Freeze the chart. Ingestion carries on underneath.
    pub paused: bool,
    feed: Feed,
    window: SharedWindow,
    /// What the chart draws.
    pub snapshot: WindowSnapshot,
    /// Newest first.
    pub recent: Vec<Record>,
    pub stats: RunStats,
    pub thresholds: Thresholds,
    pub theme: Theme,
    /// Set once the live run has been stopped.
    pub summary: Option<RunSummary>,
    /// Last fatal error, for the status bar.
    pub error: Option<String>,
    failure: Option<PingStatsError>,
    pub last_update: Option<Instant>,
    status_message: Option<(String, Instant)>,
}

impl App {
    /// Watch a live run. The ingestor should already be started.
    pub fn live(ingestor: Ingestor, thresholds: Thresholds) -> Self {
        let window = ingestor.window();
        Self::build(Feed::Live(ingestor), window, RunStats::new(), thresholds)
    }

    /// View a log file. Every row in the file is charted.
    pub fn from_log(path: impl AsRef<Path>, thresholds: Thresholds) -> Result<Self, PingStatsError> {
        let path = path.as_ref();
        let records = read_log(path)?;
        info!(path = %path.display(), rows = records.len(), "loaded log");

        let stats = RunStats::from_records(&records);
        let mut window = SlidingWindow::new(records.len().max(1))?;
        for record in records {
            window.append(record);
        }

        let mut app = Self::build(
            Feed::Log(path.to_path_buf()),
            window.into(),
            stats,
            thresholds,
        );
        app.update_view();
        Ok(app)
    }

    fn build(feed: Feed, window: SharedWindow, stats: RunStats, thresholds: Thresholds) -> Self {
        Self {
            running: true,
            show_help: false,
            paused: false,
            feed,
            window,
            snapshot: WindowSnapshot::default(),
            recent: Vec::new(),
            stats,
            thresholds,
            theme: Theme::dark(),
            summary: None,
            error: None,
            failure: None,
            last_update: None,
            status_message: None,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn is_live(&self) -> bool {
        matches!(self.feed, Feed::Live(_))
    }

    /// Short description of the feed for the header.
    pub fn source_description(&self) -> String {
        match &self.feed {
            Feed::Live(ingestor) => match ingestor.sink_description() {
                Some(sink) => format!("{} → {}", ingestor.address(), sink),
                None => ingestor.address().to_string(),
            },
            Feed::Log(path) => path.display().to_string(),
        }
    }

    /// Time since the probe started, for live runs.
    pub fn elapsed(&self) -> Option<Duration> {
        match &self.feed {
            Feed::Live(ingestor) => ingestor.elapsed(),
            Feed::Log(_) => None,
        }
    }

    pub fn health(&self) -> HealthStatus {
        self.stats.health(&self.thresholds)
    }

    /// Pull new records in and, unless paused, refresh what is drawn.
    ///
    /// Returns the number of new records.
    pub fn refresh(&mut self) -> usize {
        let mut added = 0;
        if let Feed::Live(ingestor) = &mut self.feed {
            match ingestor.pump() {
                Ok(n) => added = n,
                Err(e) => {
                    self.error = Some(e.to_string());
                    self.failure = Some(e);
                }
            }
            if ingestor.state() == IngestState::Running && ingestor.limit_reached() {
                ingestor.expire();
            }
            self.stats = ingestor.stats().clone();
        }
        if !self.paused {
            self.update_view();
        }
        added
    }

    /// True when the live run has ended on its own and needs reaping.
    pub fn needs_finish(&self) -> bool {
        match &self.feed {
            Feed::Live(ingestor) if self.summary.is_none() => {
                ingestor.state() == IngestState::Draining
                    || (ingestor.state() == IngestState::Running && ingestor.limit_reached())
            }
            _ => false,
        }
    }

    /// Stop the live run, if any. Safe to call repeatedly.
    pub async fn finish(&mut self) -> Option<RunSummary> {
        let Feed::Live(ingestor) = &mut self.feed else {
            return None;
        };
        if self.summary.is_none() {
            match ingestor.stop().await {
                Ok(summary) => {
                    self.status_message =
                        Some((format!("Run ended: {:?}", summary.exit), Instant::now()));
                    self.summary = Some(summary);
                }
                Err(e) => {
                    warn!(error = %e, "run ended with an error");
                    self.error = Some(e.to_string());
                    self.failure = Some(e);
                    self.summary = Some(ingestor.summary());
                }
            }
            self.stats = ingestor.stats().clone();
            self.update_view();
        }
        self.summary.clone()
    }

    /// The fatal error of the run, if there was one.
    pub fn take_failure(&mut self) -> Option<PingStatsError> {
        self.failure.take()
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        if self.paused {
            self.set_status_message("Paused".to_string());
        } else {
            self.update_view();
            self.set_status_message("Resumed".to_string());
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// The status message, while it is still fresh.
    pub fn status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, at)) if at.elapsed() < STATUS_TTL => Some(msg),
            _ => None,
        }
    }

    fn update_view(&mut self) {
        self.snapshot = self.window.snapshot();
        self.recent = self
            .window
            .with(|w| w.records().rev().take(RECENT_ROWS).cloned().collect());
        self.last_update = Some(Instant::now());
    }
}
