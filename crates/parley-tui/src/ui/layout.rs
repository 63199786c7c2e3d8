//! Layout helpers for the parley TUI.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Width of the conversation list pane.
pub const LIST_PANE_WIDTH: u16 = 32;

/// Create a centered rect with fixed dimensions.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Create the main layout with status bar at bottom.
pub fn main_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Split the content area into the conversation list and thread panes.
pub fn pane_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(LIST_PANE_WIDTH), Constraint::Min(20)])
        .split(area);
    (chunks[0], chunks[1])
}
