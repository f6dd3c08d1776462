//! The most recent replies, newest at the top.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use pingstats_types::Record;

use crate::app::App;
use crate::data::duration::format_latency;

/// Text for the round-trip column.
pub fn round_trip_cell(record: &Record) -> String {
    match record.latency_ms() {
        Some(ms) => format_latency(ms),
        None => "lost".to_string(),
    }
}

/// Render the recent replies table.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["seq", "ttl", "rtt"]).style(app.theme.header);

    let visible = area.height.saturating_sub(3) as usize;
    let rows: Vec<Row> = app
        .recent
        .iter()
        .take(visible)
        .map(|record| {
            let style = app.theme.status_style(app.thresholds.classify(record));
            Row::new(vec![
                Cell::from(record.sequence.to_string()),
                Cell::from(record.ttl.map(|t| t.to_string()).unwrap_or_default()),
                Cell::from(round_trip_cell(record)).style(style),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(4),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border))
            .title(" Recent "),
    );

    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pingstats_types::Timestamp;

    #[test]
    fn lost_replies_say_so() {
        let at = Timestamp::from_millis(0);
        assert_eq!(round_trip_cell(&Record::failure(at, "h", 1)), "lost");
        assert_eq!(round_trip_cell(&Record::success(at, "h", 2, 12.34)), "12.3ms");
    }
}
