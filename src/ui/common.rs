//! Header, status bar and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::duration::{format_duration, format_latency};

/// Render the header bar: health, target, counts and latency figures.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;
    let health = app.health();
    let dim = Style::default().add_modifier(Modifier::DIM);
    let latency = |ms: Option<f64>| ms.map(format_latency).unwrap_or_else(|| "-".to_string());

    let mut spans = vec![
        Span::styled(" ● ", app.theme.status_style(health)),
        Span::styled("PINGSTATS ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(app.source_description()),
        Span::raw(" │ "),
        Span::styled(format!("{}", stats.received), Style::default().fg(app.theme.healthy)),
        Span::raw(format!("/{} ok ", stats.sent)),
        if stats.failed > 0 {
            Span::styled(
                format!("{} lost ({:.1}%)", stats.failed, stats.loss_pct()),
                app.theme.status_style(health),
            )
        } else {
            Span::styled("0 lost", dim)
        },
        Span::raw(" │ "),
        Span::raw(format!(
            "last {} min {} avg {} max {}",
            latency(stats.last_ms),
            latency(stats.min_ms),
            latency(stats.avg_ms()),
            latency(stats.max_ms),
        )),
    ];

    if let Some(elapsed) = app.elapsed() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(format_duration(elapsed), dim));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the status bar at the bottom.
///
/// Temporary messages win over errors, errors over the usual hints.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.status_message() {
        let paragraph =
            Paragraph::new(format!(" {msg} ")).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(err) = &app.error {
        let paragraph = Paragraph::new(format!(" Error: {err} | q:quit"))
            .style(Style::default().fg(app.theme.critical));
        frame.render_widget(paragraph, area);
        return;
    }

    let state = if app.paused {
        "PAUSED"
    } else if app.summary.is_some() {
        "ENDED"
    } else if app.is_live() {
        "LIVE"
    } else {
        "LOG"
    };
    let updated = app
        .last_update
        .map(|t| format!("Updated {:.1}s ago", t.elapsed().as_secs_f64()))
        .unwrap_or_else(|| "Waiting for replies...".to_string());

    let status = format!(
        " {state} | {} points | {updated} | p:pause ?:help q:quit",
        app.snapshot.len()
    );
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay as a centered modal.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from("  p / Space   Pause or resume the chart"),
        Line::from("  ?           Toggle this help"),
        Line::from("  q / Esc     Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(" Chart", bold)]),
        Line::from("  Line        Round trip per reply"),
        Line::from("  Dots        Lost replies, on the x axis"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let width = 44u16.min(area.width.saturating_sub(4));
    let height = 13u16.min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let help_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(Paragraph::new(help_text).block(block), help_area);
}
