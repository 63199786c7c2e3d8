//! parley-tui: Terminal UI for the parley messaging client
//!
//! This crate provides the TUI layer for parley:
//! - A two-pane messenger screen (conversation list + thread)
//! - A composer with optimistic sends
//! - New-conversation and list-filter prompts
//!
//! Network calls run as spawned tasks; their results are folded back into
//! the app state on the event loop, so all state mutation stays
//! single-threaded.

mod app;
mod event;
mod screens;
#[cfg(test)]
pub mod test_utils;
mod ui;

use screens::Screen as ScreenTrait;

pub use app::{App, Effect, Focus, Mode};
pub use event::{Action, Event, EventHandler};
pub use parley_engine;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parley_engine::{
    ApiError, Conversation, ConversationApi, HttpConversationApi, Message, PendingSend,
    ThreadRequest, User,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use tokio::task::JoinHandle;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the TUI application.
///
/// This is the main entry point for the TUI. It sets up the terminal,
/// runs the event loop, and restores the terminal on exit.
pub async fn run_tui(base_url: &str, user: &str) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpConversationApi::new(base_url)?;

    // Setup terminal with RAII guard for cleanup
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app; the initial conversation list fetch is queued here
    let mut app = App::new(user);

    // Create event handler (4 Hz tick rate = 250ms)
    let mut events = EventHandler::new(250);

    // Main loop
    let result = run_loop(&mut terminal, &mut app, &mut events, &api).await;

    // Restore cursor before guard drops
    terminal.show_cursor()?;

    result
}

/// In-flight network tasks, swept each loop pass.
#[derive(Default)]
struct NetTasks {
    list: Vec<JoinHandle<Result<Vec<Conversation>, ApiError>>>,
    thread: Vec<JoinHandle<(ThreadRequest, Result<Vec<Message>, ApiError>)>>,
    send: Vec<JoinHandle<(PendingSend, Result<(), ApiError>)>>,
    create: Vec<JoinHandle<Result<Conversation, ApiError>>>,
    contact: Vec<JoinHandle<Result<User, ApiError>>>,
}

impl NetTasks {
    fn abort_all(self) {
        for handle in self.list {
            handle.abort();
        }
        for handle in self.thread {
            handle.abort();
        }
        for handle in self.send {
            handle.abort();
        }
        for handle in self.create {
            handle.abort();
        }
        for handle in self.contact {
            handle.abort();
        }
    }
}

/// Remove and return the completed handles of a task list.
async fn drain_finished<T>(handles: &mut Vec<JoinHandle<T>>) -> Vec<T> {
    let mut finished = Vec::new();
    for i in (0..handles.len()).rev() {
        if handles[i].is_finished() {
            if let Ok(value) = handles.remove(i).await {
                finished.push(value);
            }
        }
    }
    finished
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    api: &HttpConversationApi,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut tasks = NetTasks::default();

    loop {
        // Draw
        terminal.draw(|frame| {
            let area = frame.area();
            let buf = frame.buffer_mut();

            screens::messenger::MessengerScreen.render(app, area, buf);

            // Render help overlay if visible
            if app.show_help {
                screens::render_help_overlay(area, buf);
            }
        })?;

        // Fold completed network tasks back into app state
        for result in drain_finished(&mut tasks.list).await {
            app.apply_conversations(result);
        }
        for (request, result) in drain_finished(&mut tasks.thread).await {
            app.apply_thread(&request, result);
        }
        for (pending, result) in drain_finished(&mut tasks.send).await {
            app.apply_send(&pending, result);
        }
        for result in drain_finished(&mut tasks.create).await {
            app.apply_create(result);
        }
        for result in drain_finished(&mut tasks.contact).await {
            app.apply_contact(result);
        }

        // Spawn newly requested network work
        for effect in app.take_effects() {
            spawn_effect(effect, api, &mut tasks);
        }

        // Handle events
        if let Some(event) = events.next().await {
            match event {
                Event::Key(key) => {
                    // Text inputs get the key first
                    if !handle_text_key(app, key) {
                        let action = event::key_to_action(key);
                        app.handle_action(action);
                    }
                }
                Event::Mouse(mouse) => {
                    use crossterm::event::MouseEventKind;
                    match mouse.kind {
                        MouseEventKind::ScrollUp => {
                            app.handle_action(Action::Up);
                        }
                        MouseEventKind::ScrollDown => {
                            app.handle_action(Action::Down);
                        }
                        _ => {}
                    }
                }
                Event::Tick => {
                    app.tick();
                }
                Event::Resize(_, _) => {
                    // Terminal will handle resize automatically
                }
            }
        }

        if app.should_quit {
            tasks.abort_all();
            break;
        }
    }

    Ok(())
}

/// Spawn the network task for a requested effect.
fn spawn_effect(effect: Effect, api: &HttpConversationApi, tasks: &mut NetTasks) {
    match effect {
        Effect::LoadConversations(request) => {
            let api = api.clone();
            tasks
                .list
                .push(tokio::spawn(async move {
                    api.list_conversations(&request.user).await
                }));
        }
        Effect::LoadThread(request) => {
            let api = api.clone();
            tasks.thread.push(tokio::spawn(async move {
                let result = api.list_messages(&request.conversation_id).await;
                (request, result)
            }));
        }
        Effect::SendMessage(pending) => {
            let api = api.clone();
            tasks.send.push(tokio::spawn(async move {
                let result = api
                    .send_message(&pending.conversation_id, &pending.message)
                    .await;
                (pending, result)
            }));
        }
        Effect::CreateConversation(request) => {
            let api = api.clone();
            tasks
                .create
                .push(tokio::spawn(async move {
                    api.create_conversation(request.participants).await
                }));
        }
        Effect::LoadContact(name) => {
            let api = api.clone();
            tasks
                .contact
                .push(tokio::spawn(async move { api.get_user(&name).await }));
        }
    }
}

/// Route a key to the focused text input.
/// Returns true if the key was handled (should not be processed as action).
fn handle_text_key(app: &mut App, key: crossterm::event::KeyEvent) -> bool {
    use crossterm::event::{KeyCode, KeyModifiers};

    // Let the action handler deal with Ctrl+C and friends
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }

    let input = match app.mode {
        Mode::NewContact => &mut app.contact_input,
        Mode::Search => &mut app.search_input,
        // The composer stays editable while a send is in flight; only the
        // send itself is blocked until the previous one resolves.
        Mode::Normal if app.focus == Focus::Composer => &mut app.composer_input,
        _ => return false,
    };

    match key.code {
        KeyCode::Char(c) => {
            input.insert(c);
            true
        }
        KeyCode::Backspace => {
            input.backspace();
            true
        }
        KeyCode::Delete => {
            input.delete();
            true
        }
        KeyCode::Left => {
            input.move_left();
            true
        }
        KeyCode::Right => {
            input.move_right();
            true
        }
        KeyCode::Home => {
            input.move_home();
            true
        }
        KeyCode::End => {
            input.move_end();
            true
        }
        // Enter, Esc and Tab fall through to the action handler
        _ => false,
    }
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
