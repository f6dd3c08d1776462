//! Latency over time.
//!
//! Successful replies form one line. Lost replies sit at the plot-gap value,
//! far below the visible range, so the line visibly drops out where they
//! occur; a second dataset marks each of them along the x axis.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::WindowSnapshot;

/// Axis bounds for the visible part of a snapshot.
///
/// The y range covers measured latencies only, from zero up.
pub fn bounds(snapshot: &WindowSnapshot) -> ([f64; 2], [f64; 2]) {
    let x = snapshot.x_bounds();
    let hi = snapshot
        .y
        .iter()
        .copied()
        .filter(|y| *y >= 0.0)
        .fold(0.0_f64, f64::max);
    let y_max = if hi > 0.0 { hi * 1.1 } else { 1.0 };
    (x, [0.0, y_max])
}

/// Points for lost replies, pinned to the bottom of the chart.
pub fn lost_points(snapshot: &WindowSnapshot) -> Vec<(f64, f64)> {
    snapshot
        .points()
        .into_iter()
        .filter(|(_, y)| *y < 0.0)
        .map(|(x, _)| (x, 0.0))
        .collect()
}

/// Render the latency chart.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
        .title(" Round trip (ms) ");

    if app.snapshot.is_empty() {
        frame.render_widget(Paragraph::new("No replies yet").block(block), area);
        return;
    }

    let points = app.snapshot.points();
    let lost = lost_points(&app.snapshot);
    let ([x_min, x_max], [y_min, y_max]) = bounds(&app.snapshot);

    let mut datasets = vec![Dataset::default()
        .name("rtt")
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(app.theme.series))
        .graph_type(GraphType::Line)
        .data(&points)];
    if !lost.is_empty() {
        datasets.push(
            Dataset::default()
                .name("lost")
                .marker(symbols::Marker::Dot)
                .style(Style::default().fg(app.theme.lost).add_modifier(Modifier::BOLD))
                .graph_type(GraphType::Scatter)
                .data(&lost),
        );
    }

    let x_labels = vec![
        Span::raw(format!("{x_min:.0}s")),
        Span::raw(format!("{:.0}s", (x_min + x_max) / 2.0)),
        Span::raw(format!("{x_max:.0}s")),
    ];
    let y_labels = vec![
        Span::raw(format!("{y_min:.0}")),
        Span::raw(format!("{:.1}", (y_min + y_max) / 2.0)),
        Span::raw(format!("{y_max:.1}")),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("elapsed")
                .style(Style::default().fg(app.theme.border))
                .bounds([x_min, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("ms")
                .style(Style::default().fg(app.theme.border))
                .bounds([y_min, y_max])
                .labels(y_labels),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pingstats_types::PLOT_GAP_MS;

    fn snapshot(y: &[f64]) -> WindowSnapshot {
        WindowSnapshot {
            x: (0..y.len()).map(|i| i as f64).collect(),
            y: y.to_vec(),
        }
    }

    #[test]
    fn y_range_ignores_gaps() {
        let s = snapshot(&[10.0, PLOT_GAP_MS, 20.0]);
        let (x, y) = bounds(&s);
        assert_eq!(x, [0.0, 2.0]);
        assert_eq!(y[0], 0.0);
        assert!((y[1] - 22.0).abs() < 1e-9);
    }

    #[test]
    fn all_lost_still_has_a_range() {
        let s = snapshot(&[PLOT_GAP_MS, PLOT_GAP_MS]);
        assert_eq!(bounds(&s).1, [0.0, 1.0]);
        assert_eq!(lost_points(&s), vec![(0.0, 0.0), (1.0, 0.0)]);
    }

    #[test]
    fn no_lost_points_when_all_replied() {
        assert!(lost_points(&snapshot(&[1.0, 2.0])).is_empty());
    }
}
