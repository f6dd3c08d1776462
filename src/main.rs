use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pingstats::data::duration::format_latency;
use pingstats::ui::{self, Theme};
use pingstats::{
    events, stop_channel, App, Dialect, IngestConfig, Ingestor, OpenMode, Record, RunSummary,
    Settings, StopHandle,
};

#[derive(Parser, Debug)]
#[command(name = "pingstats", version)]
#[command(about = "Ping a host, log every reply to CSV and chart the latency")]
struct Args {
    /// Host name or IP address to ping
    #[arg(short, long)]
    address: Option<String>,

    /// Extra arguments for ping, e.g. "-i 0.2 -s 120"
    #[arg(short, long, allow_hyphen_values = true)]
    custom_args: Option<String>,

    /// Directory for the log file
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Log file name; ".csv" is appended [default: PingStatsLog.csv]
    #[arg(short, long)]
    name: Option<String>,

    /// Do not write a log file
    #[arg(long)]
    no_file: bool,

    /// Truncate the log file instead of appending to it
    #[arg(long)]
    fresh: bool,

    /// Show a live chart instead of printing replies
    #[arg(short = 's', long)]
    show_live_plot: bool,

    /// Live chart refresh interval in milliseconds [default: 500]
    #[arg(long)]
    refresh_ms: Option<u64>,

    /// Number of replies kept on the chart [default: 250]
    #[arg(short = 'l', long)]
    table_length: Option<usize>,

    /// Chart a previously written log file and exit
    #[arg(long, conflicts_with_all = ["address", "show_live_plot", "duration"])]
    plot_file: Option<PathBuf>,

    /// Stop after this long (e.g. "30s", "5m")
    #[arg(short = 't', long)]
    duration: Option<String>,

    /// Output format of ping [default: this host's]
    #[arg(long, value_parser = ["posix", "windows"])]
    dialect: Option<String>,

    /// Latency warning threshold (e.g. "100ms")
    #[arg(long)]
    latency_warn: Option<String>,

    /// Latency critical threshold (e.g. "500ms")
    #[arg(long)]
    latency_crit: Option<String>,

    /// Print records and the summary as JSON
    #[arg(long, conflicts_with = "show_live_plot")]
    json: bool,

    /// Configuration file (TOML, YAML, JSON...)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write diagnostics here while the chart is shown
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Layer the flags that were given over `settings`.
    fn apply(&self, settings: &mut Settings) {
        if let Some(address) = &self.address {
            settings.address = Some(address.clone());
        }
        if let Some(args) = &self.custom_args {
            settings.custom_args = Some(args.clone());
        }
        if let Some(path) = &self.path {
            settings.path = Some(path.clone());
        }
        if let Some(name) = &self.name {
            settings.name = Some(name.clone());
        }
        if self.no_file {
            settings.persist = false;
        }
        if self.fresh {
            settings.open_mode = OpenMode::Fresh;
        }
        if let Some(ms) = self.refresh_ms {
            settings.refresh_ms = ms;
        }
        if let Some(len) = self.table_length {
            settings.window_length = len;
        }
        if let Some(duration) = &self.duration {
            settings.duration = Some(duration.clone());
        }
        match self.dialect.as_deref() {
            Some("posix") => settings.dialect = Some(Dialect::Posix),
            Some("windows") => settings.dialect = Some(Dialect::Windows),
            _ => {}
        }
        if let Some(warn) = &self.latency_warn {
            settings.latency_warn = warn.clone();
        }
        if let Some(crit) = &self.latency_crit {
            settings.latency_crit = crit.clone();
        }
    }

    fn interactive(&self) -> bool {
        self.show_live_plot || self.plot_file.is_some()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.interactive(), args.log_file.as_deref())?;

    let mut settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;
    args.apply(&mut settings);
    let thresholds = settings.thresholds().context("invalid latency threshold")?;

    if let Some(path) = &args.plot_file {
        let app = App::from_log(path, thresholds)
            .with_context(|| format!("failed to read {}", path.display()))?
            .with_theme(Theme::auto_detect());
        return run_tui(app, None, settings.refresh_interval());
    }

    let config = settings.ingest_config().context("invalid configuration")?;
    let rt = Runtime::new()?;

    if args.show_live_plot {
        let _guard = rt.enter();
        let mut ingestor = Ingestor::new(config)?;
        ingestor.start()?;
        let app = App::live(ingestor, thresholds).with_theme(Theme::auto_detect());
        run_tui(app, Some(&rt), settings.refresh_interval())
    } else {
        rt.block_on(run_headless(config, args.json))
    }
}

fn init_tracing(interactive: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    // Otherwise the chart owns the terminal and diagnostics are discarded.
    Ok(())
}

/// Print every record until ping exits, the run limit passes or we are
/// interrupted.
async fn run_headless(config: IngestConfig, json: bool) -> Result<()> {
    let mut ingestor = Ingestor::new(config)?;
    let log = ingestor.sink_description();
    let address = ingestor.address().to_string();
    let mut records = ingestor.tap(256);
    let (stop, stop_rx) = stop_channel();

    tokio::spawn(stop_on_signal(stop));
    // The tap closes when the task drops the ingestor.
    let run = tokio::spawn(async move { ingestor.run(stop_rx).await });

    while let Some(record) = records.recv().await {
        if json {
            println!("{}", serde_json::to_string(&record)?);
        } else {
            println!("{}", describe(&record));
        }
    }

    let summary = run.await.context("ingestion task failed")??;
    if json {
        let report = serde_json::json!({
            "address": address,
            "exit": summary.exit,
            "lines_read": summary.lines_read,
            "records_observed": summary.records_observed,
            "records_written": summary.records_written,
            "log": log,
            "stats": summary.stats.to_json(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&address, log.as_deref(), &summary);
    }
    Ok(())
}

async fn stop_on_signal(stop: StopHandle) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    let _ = tokio::signal::ctrl_c().await;

    info!("interrupted");
    stop.stop();
}

fn describe(record: &Record) -> String {
    let ttl = record.ttl.map(|t| format!(" ttl={t}")).unwrap_or_default();
    match record.latency_ms() {
        Some(ms) => format!(
            "{} seq={}{} time={}",
            record.address,
            record.sequence,
            ttl,
            format_latency(ms)
        ),
        None => format!("{} seq={} lost", record.address, record.sequence),
    }
}

fn print_summary(address: &str, log: Option<&str>, summary: &RunSummary) {
    let stats = &summary.stats;
    println!();
    println!("--- {address} pingstats ---");
    println!(
        "{} sent, {} received, {:.1}% lost",
        stats.sent,
        stats.received,
        stats.loss_pct()
    );
    if let (Some(min), Some(avg), Some(max)) = (stats.min_ms, stats.avg_ms(), stats.max_ms) {
        println!("rtt min/avg/max = {min:.3}/{avg:.3}/{max:.3} ms");
    }
    if let Some(log) = log {
        println!("{} rows written to {log}", summary.records_written);
    }
}

/// Run the chart until the user quits.
///
/// With a runtime the feed is live: a run that ends on its own is reaped in
/// place and left on screen, and quitting stops it.
fn run_tui(app: App, rt: Option<&Runtime>, refresh_interval: Duration) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = app;
    let result = run_app(&mut terminal, &mut app, rt, refresh_interval);
    let summary = rt.and_then(|rt| rt.block_on(app.finish()));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    if let Some(summary) = summary {
        print_summary(&app.source_description(), None, &summary);
    }
    match app.take_failure() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rt: Option<&Runtime>,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();
    app.refresh();

    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5u16.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let rows = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(8),    // Chart and table
                Constraint::Length(1), // Status bar
            ])
            .split(area);
            let columns =
                Layout::horizontal([Constraint::Min(40), Constraint::Length(24)]).split(rows[1]);

            ui::common::render_header(frame, app, rows[0]);
            ui::chart::render(frame, app, columns[0]);
            ui::table::render(frame, app, columns[1]);
            ui::common::render_status_bar(frame, app, rows[2]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(Event::Key(key)) = events::poll_event(Duration::from_millis(100))? {
            events::handle_key_event(app, key);
        }

        if last_refresh.elapsed() >= refresh_interval {
            app.refresh();
            last_refresh = Instant::now();
        }

        if let Some(rt) = rt {
            if app.needs_finish() {
                rt.block_on(app.finish());
            }
        }
    }

    Ok(())
}
