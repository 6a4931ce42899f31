//! UI rendering module for the HostPilot dashboard
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

use ratatui::layout::{Constraint, Flex, Layout, Rect};

pub mod dashboard;
pub mod help_overlay;
pub mod panels;

pub use dashboard::render;

/// A `width` x `height` rect centered in `area`, clamped to fit
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}
