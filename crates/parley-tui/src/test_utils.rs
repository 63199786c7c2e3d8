//! Test utilities for parley-tui render and navigation tests.
//!
//! Provides helpers for creating app fixtures and rendering the messenger
//! screen into a string for assertions.

use crate::app::App;
use crate::screens::{messenger::MessengerScreen, Screen as ScreenTrait};
use chrono::TimeZone;
use parley_engine::{Conversation, Message};
use ratatui::{backend::TestBackend, layout::Position, Terminal};

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Build a two-party conversation fixture.
pub fn test_conversation(id: &str, a: &str, b: &str) -> Conversation {
    Conversation {
        conversation_id: id.into(),
        participants: vec![a.into(), b.into()],
        last_message: Message {
            id: "m0".into(),
            from: b.into(),
            to: a.into(),
            content: "hi".into(),
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 1, 1, 9, 15, 0).unwrap(),
        },
    }
}

/// Create a test app for "alice" with two conversations loaded.
pub fn app_with_conversations() -> App {
    let mut app = App::new("alice");
    app.take_effects();
    app.apply_conversations(Ok(vec![
        test_conversation("a", "alice", "bob"),
        test_conversation("b", "alice", "carol"),
    ]));
    app
}

/// Render the messenger screen (and help overlay, if shown) to a string.
pub fn render_app_to_string(app: &App) -> String {
    let backend = TestBackend::new(TEST_WIDTH, TEST_HEIGHT);
    let mut terminal = Terminal::new(backend).expect("Failed to create test terminal");
    terminal
        .draw(|frame| {
            let area = frame.area();
            let buf = frame.buffer_mut();
            MessengerScreen.render(app, area, buf);
            if app.show_help {
                crate::screens::render_help_overlay(area, buf);
            }
        })
        .expect("Failed to draw");

    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            match buffer.cell(Position::new(x, y)) {
                Some(cell) => out.push_str(cell.symbol()),
                None => out.push(' '),
            }
        }
        out.push('\n');
    }
    out
}
