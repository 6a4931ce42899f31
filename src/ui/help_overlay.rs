//! Key binding reference drawn over the dashboard

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::centered;

/// Sections of (keys, action) pairs, in display order
const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("←/→, Tab", "Switch panel"),
            ("1-4", "Jump to panel"),
            ("↑/k, ↓/j", "Move selection"),
        ],
    ),
    (
        "Data",
        &[
            ("r / R", "Refetch this panel / all panels"),
            ("c / C", "Clear this panel's cache / all"),
        ],
    ),
    (
        "Markers",
        &[
            ("…", "Loading"),
            ("⚠", "Data may be outdated"),
            ("✗", "Failed to load"),
        ],
    ),
    ("Other", &[("?", "Toggle this help"), ("q, Esc", "Quit")]),
];

const KEY_COLUMN: usize = 12;

fn help_lines() -> Vec<Line<'static>> {
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let key_style = Style::default().fg(Color::Yellow);

    let mut lines = vec![Line::from(Span::styled(
        "Keyboard Shortcuts",
        heading.fg(Color::Cyan),
    ))];
    for (title, bindings) in SECTIONS {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(*title, heading)));
        lines.extend(bindings.iter().map(|(keys, action)| {
            Line::from(vec![
                Span::styled(format!("  {:<width$}", keys, width = KEY_COLUMN), key_style),
                Span::raw(*action),
            ])
        }));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Esc or ? closes",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

/// Draws the overlay centered on `frame`, clearing what is beneath it
pub fn render(frame: &mut Frame) {
    let lines = help_lines();
    let width = lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 4;
    let height = lines.len() as u16 + 2;
    let area: Rect = centered(frame.area(), width, height);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
