//! Reusable widgets for the parley TUI.

pub mod text_input;

pub use text_input::{TextInput, TextInputState};
