//! Top-level screen layout
//!
//! Renders the tab bar, the body of the selected panel, and a status bar that
//! flags loading, errors, and data that may be outdated.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::{help_overlay, panels};
use crate::app::{App, Panel, PanelStatus};
use hostpilot::cache::LoadPhase;

/// Renders the whole screen
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_tabs(frame, app, chunks[0]);
    render_body(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    if app.show_help {
        help_overlay::render(frame);
    }
}

/// Marker next to a tab title reflecting its load state
fn phase_marker(status: &PanelStatus) -> &'static str {
    match status.phase {
        LoadPhase::Loading => " …",
        LoadPhase::Error => " ✗",
        LoadPhase::Ready if status.is_stale => " ⚠",
        LoadPhase::Ready => "",
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Panel::ALL
        .iter()
        .enumerate()
        .map(|(i, panel)| {
            let status = app.panel_status(*panel);
            Line::from(format!("{} {}{}", i + 1, panel.title(), phase_marker(&status)))
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" HostPilot ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .select(app.panel.index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_body(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ({}) ", app.panel.title(), app.panel.key()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match app.panel {
        Panel::Dashboard => panels::render_stats(frame, inner, &app.stats.snapshot()),
        Panel::Properties => {
            panels::render_properties(frame, inner, &app.properties.snapshot(), app.selected_index)
        }
        Panel::Bookings => {
            panels::render_bookings(frame, inner, &app.bookings.snapshot(), app.selected_index)
        }
        Panel::Tasks => panels::render_tasks(frame, inner, &app.tasks.snapshot(), app.selected_index),
    }
}

/// Builds the status bar spans for the current panel
pub fn status_spans(app: &App) -> Vec<Span<'static>> {
    let status = app.panel_status(app.panel);
    let mut spans = Vec::new();

    match status.phase {
        LoadPhase::Loading => spans.push(Span::styled(
            "Loading…",
            Style::default().fg(Color::Cyan),
        )),
        LoadPhase::Ready => spans.push(Span::styled("Ready", Style::default().fg(Color::Green))),
        LoadPhase::Error => spans.push(Span::styled("Error", Style::default().fg(Color::Red))),
    }

    if status.phase == LoadPhase::Ready && status.is_stale {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "⚠ Data may be outdated",
            Style::default().fg(Color::Yellow),
        ));
    }

    if let Some(error) = status.error {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(error, Style::default().fg(Color::Red)));
    }

    if let Some(message) = &app.status_message {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(message.clone(), Style::default().fg(Color::Magenta)));
    }

    if let Some(last) = app.last_refresh {
        spans.push(Span::styled(
            format!("  Refreshed {}", last.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    spans.push(Span::styled(
        "  ? help",
        Style::default().fg(Color::DarkGray),
    ));
    spans
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    frame.render_widget(Paragraph::new(Line::from(status_spans(app))), area);
}
