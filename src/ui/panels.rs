//! Panel bodies
//!
//! Each panel renders from a `ResourceState` snapshot: a loading or error
//! placeholder when there is nothing to show, otherwise the data itself.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use hostpilot::cache::{LoadPhase, ResourceState};
use hostpilot::models::{Booking, DashboardStats, Property, Task};

/// Placeholder lines when a panel has no data yet
fn placeholder<T>(state: &ResourceState<T>, noun: &str) -> Vec<Line<'static>> {
    match (&state.phase, &state.error) {
        (LoadPhase::Error, Some(error)) => vec![
            Line::from(Span::styled(
                format!("Could not load {}", noun),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(error.to_string()),
            Line::from(Span::styled(
                "Press r to retry",
                Style::default().fg(Color::DarkGray),
            )),
        ],
        _ => vec![Line::from(Span::styled(
            format!("Loading {}…", noun),
            Style::default().fg(Color::Cyan),
        ))],
    }
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<20}", label), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
    ])
}

/// Renders the portfolio summary
pub fn render_stats(frame: &mut Frame, area: Rect, state: &ResourceState<DashboardStats>) {
    let lines = match &state.data {
        None => placeholder(state, "dashboard stats"),
        Some(stats) => vec![
            Line::from(""),
            stat_line("Properties", stats.total_properties.to_string()),
            stat_line("Active bookings", stats.active_bookings.to_string()),
            stat_line("Pending tasks", stats.pending_tasks.to_string()),
            stat_line("Monthly revenue", format!("{:.2}", stats.monthly_revenue)),
            stat_line("Occupancy", format!("{:.1}%", stats.occupancy_rate)),
        ],
    };
    frame.render_widget(Paragraph::new(lines), area);
}

/// Style for a list row, highlighting the selection
fn row_style(index: usize, selected: usize) -> Style {
    if index == selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

/// Color for a free-form status string
fn status_color(status: Option<&str>) -> Color {
    match status.map(str::to_lowercase).as_deref() {
        Some("active" | "confirmed" | "completed" | "done") => Color::Green,
        Some("pending" | "in-progress" | "in_progress") => Color::Yellow,
        Some("cancelled" | "inactive" | "overdue") => Color::Red,
        _ => Color::Gray,
    }
}

fn list_lines<T, F>(items: &[T], selected: usize, empty: &str, format_row: F) -> Vec<Line<'static>>
where
    F: Fn(&T) -> (String, Option<String>),
{
    if items.is_empty() {
        return vec![Line::from(Span::styled(
            empty.to_string(),
            Style::default().fg(Color::DarkGray),
        ))];
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let (text, status) = format_row(item);
            let status_text = status.clone().unwrap_or_else(|| "-".to_string());
            Line::from(vec![
                Span::styled(text, row_style(i, selected)),
                Span::raw("  "),
                Span::styled(
                    status_text,
                    Style::default().fg(status_color(status.as_deref())),
                ),
            ])
        })
        .collect()
}

/// Renders the property list
pub fn render_properties(
    frame: &mut Frame,
    area: Rect,
    state: &ResourceState<Vec<Property>>,
    selected: usize,
) {
    let lines = match &state.data {
        None => placeholder(state, "properties"),
        Some(properties) => list_lines(properties, selected, "No properties yet", |p| {
            let bedrooms = p.bedrooms.map(|b| format!("{} bd", b)).unwrap_or_default();
            (
                format!(
                    "#{:<5} {:<28} {:<6} {}",
                    p.id,
                    p.name,
                    bedrooms,
                    p.address.as_deref().unwrap_or("")
                ),
                p.status.clone(),
            )
        }),
    };
    frame.render_widget(Paragraph::new(lines), area);
}

/// Renders the booking list
pub fn render_bookings(
    frame: &mut Frame,
    area: Rect,
    state: &ResourceState<Vec<Booking>>,
    selected: usize,
) {
    let lines = match &state.data {
        None => placeholder(state, "bookings"),
        Some(bookings) => list_lines(bookings, selected, "No bookings yet", |b| {
            let stay = match (&b.check_in, &b.check_out) {
                (Some(check_in), Some(check_out)) => format!("{} → {}", check_in, check_out),
                (Some(check_in), None) => format!("from {}", check_in),
                _ => "dates pending".to_string(),
            };
            let amount = b
                .total_amount
                .map(|a| format!("{:.2}", a))
                .unwrap_or_default();
            (
                format!("#{:<5} {:<24} {:<26} {:>10}", b.id, b.guest_name, stay, amount),
                b.status.clone(),
            )
        }),
    };
    frame.render_widget(Paragraph::new(lines), area);
}

/// Renders the task list
pub fn render_tasks(frame: &mut Frame, area: Rect, state: &ResourceState<Vec<Task>>, selected: usize) {
    let lines = match &state.data {
        None => placeholder(state, "tasks"),
        Some(tasks) => list_lines(tasks, selected, "No open tasks", |t| {
            (
                format!(
                    "#{:<5} {:<36} {:<8} {}",
                    t.id,
                    t.title,
                    t.priority.as_deref().unwrap_or("-"),
                    t.due_date.as_deref().unwrap_or("")
                ),
                t.status.clone(),
            )
        }),
    };
    frame.render_widget(Paragraph::new(lines), area);
}
