//! The single dashboard view.
//!
//! ```text
//! ╭──────── System Performance Monitor ────────╮
//! │System: Apple M2 (cores: 4E+4P+10GPU)       │
//! │Press Ctrl+C to exit                        │
//! ╰────────────────────────────────────────────╯
//! CPU Metrics
//! E-CORES Usage                 │ 45.67% @ 1020 MHz
//! P-CORES Usage                 │ 8.90% @ 3204 MHz
//!
//! GPU Metrics
//! ...
//! ```

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::units::PLACEHOLDER;
use crate::data::Section;

pub const TITLE: &str = "System Performance Monitor";
pub const EXIT_HINT: &str = "Press Ctrl+C to exit";

/// Width the metric name is padded to.
pub const LABEL_WIDTH: usize = 30;

const HEADER_HEIGHT: u16 = 4;

/// Render the whole screen for the current app state.
pub fn render(frame: &mut Frame, app: &App) {
    let [header, body] = Layout::vertical([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
        .areas(frame.area());

    render_header(frame, app, header);

    match &app.frame {
        Some(data) => render_sections(frame, app, &data.sections(), body),
        None => render_waiting(frame, app, body),
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let system = app
        .system
        .as_ref()
        .map_or_else(|| "detecting...".to_string(), |s| s.to_string());

    let lines = vec![
        Line::from(vec![Span::styled("System: ", theme.label), Span::raw(system)]),
        Line::from(Span::styled(EXIT_HINT, theme.hint)),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(format!(" {} ", TITLE), theme.title))
        .title_alignment(Alignment::Center);

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_sections(frame: &mut Frame, app: &App, sections: &[Section], area: Rect) {
    let theme = &app.theme;
    let separator = Style::default().fg(theme.border);
    let mut lines = Vec::new();

    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(section.title, theme.section)));

        for row in &section.rows {
            let value = row.value.as_deref();
            lines.push(Line::from(vec![
                Span::styled(format!("{:<width$}", row.label, width = LABEL_WIDTH), theme.label),
                Span::styled("│ ", separator),
                Span::styled(
                    value.unwrap_or(PLACEHOLDER).to_string(),
                    theme.value_style(value.is_some()),
                ),
            ]));
        }
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_waiting(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        format!("Waiting for telemetry from {}...", app.source_description()),
        app.theme.placeholder,
    ))];
    if let Some(err) = app.source_error() {
        lines.push(Line::from(Span::styled(err.to_string(), app.theme.hint)));
    }
    frame.render_widget(Paragraph::new(lines), area);
}
