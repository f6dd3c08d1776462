//! Colours for the live view.
//!
//! Picks a light or dark palette from the terminal background.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::HealthStatus;

/// Colour and style theme for the TUI.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent for titles and the help border.
    pub highlight: Color,
    pub healthy: Color,
    pub warning: Color,
    pub critical: Color,
    /// The latency line.
    pub series: Color,
    /// Markers for lost replies.
    pub lost: Color,
    /// Axis labels and borders.
    pub border: Color,
    /// Table header row.
    pub header: Style,
    pub border_type: BorderType,
}

impl Theme {
    /// Palette for dark backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            healthy: Color::Green,
            warning: Color::Yellow,
            critical: Color::Red,
            series: Color::Cyan,
            lost: Color::LightRed,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Palette for light backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            healthy: Color::Green,
            warning: Color::Yellow,
            critical: Color::Red,
            series: Color::Blue,
            lost: Color::Red,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Choose by background luminance, falling back to dark.
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn status_style(&self, status: HealthStatus) -> Style {
        match status {
            HealthStatus::Healthy => Style::default().fg(self.healthy),
            HealthStatus::Warning => Style::default().fg(self.warning),
            HealthStatus::Critical => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_is_bold() {
        let theme = Theme::dark();
        let style = theme.status_style(HealthStatus::Critical);
        assert_eq!(style.fg, Some(Color::Red));
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(theme.status_style(HealthStatus::Healthy).fg, Some(Color::Green));
    }
}
