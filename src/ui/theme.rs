//! Color theme for the dashboard.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

/// Color and style theme for the dashboard.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Title of the header box.
    pub title: Style,
    /// Section headings ("CPU Metrics", ...).
    pub section: Style,
    /// Metric names.
    pub label: Style,
    /// Metric values.
    pub value: Style,
    /// Values that were missing from the sample.
    pub placeholder: Style,
    /// The "Press Ctrl+C to exit" hint.
    pub hint: Style,
    /// Color for borders and separators.
    pub border: Color,
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            title: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            section: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::Green),
            value: Style::default().fg(Color::White),
            placeholder: Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
            hint: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            border: Color::Gray,
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            title: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            section: Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::Green),
            value: Style::default().fg(Color::Black),
            placeholder: Style::default().fg(Color::Gray),
            hint: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            border: Color::DarkGray,
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for a metric value, dimmed when the metric was absent.
    pub fn value_style(&self, present: bool) -> Style {
        if present {
            self.value
        } else {
            self.placeholder
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_style_differs() {
        for theme in [Theme::dark(), Theme::light()] {
            assert_eq!(theme.value_style(true), theme.value);
            assert_ne!(theme.value_style(false), theme.value_style(true));
        }
    }
}
