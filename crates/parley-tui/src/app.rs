//! Application state and update logic for the parley TUI.

use crate::event::Action;
use crate::ui::widgets::TextInputState;
use chrono::Utc;
use parley_engine::{
    ApiError, Conversation, CreateRequest, ListRequest, Message, PendingSend, SyncState,
    ThreadRequest, User,
};

/// Which pane owns keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Conversation list pane.
    #[default]
    List,
    /// Message composer.
    Composer,
}

/// Modal input layered over the two panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    /// Prompting for a contact name to start a conversation with.
    NewContact,
    /// Editing the conversation list filter.
    Search,
}

/// Network work requested by app transitions, drained by the event loop.
#[derive(Debug)]
pub enum Effect {
    /// Fetch the conversation list.
    LoadConversations(ListRequest),
    /// Fetch a conversation's messages.
    LoadThread(ThreadRequest),
    /// Create a conversation.
    CreateConversation(CreateRequest),
    /// Post a message.
    SendMessage(PendingSend),
    /// Fetch contact details for the thread header.
    LoadContact(String),
}

/// Application state.
#[derive(Debug)]
pub struct App {
    /// Whether the app should quit.
    pub should_quit: bool,

    /// Whether the help overlay is visible.
    pub show_help: bool,

    /// Synchronization state shared with the engine.
    pub sync: SyncState,

    /// Which pane owns keyboard input.
    pub focus: Focus,

    /// Active modal, if any.
    pub mode: Mode,

    /// Highlighted row in the (filtered) conversation list.
    pub list_index: usize,

    /// Composer input state.
    pub composer_input: TextInputState,

    /// New-conversation contact name input.
    pub contact_input: TextInputState,

    /// Conversation list filter input.
    pub search_input: TextInputState,

    /// Contact details for the selected conversation, once fetched.
    pub contact: Option<User>,

    /// Whether a conversation list fetch is in flight.
    pub loading_conversations: bool,

    /// Number of thread fetches in flight (superseded ones included).
    thread_fetches: usize,

    /// Whether a send is in flight. Blocks further sends until resolved.
    pub send_in_flight: bool,

    /// Whether a create is in flight.
    pub create_in_flight: bool,

    /// Tick counter for animations.
    pub tick: usize,

    /// Notification message (displayed temporarily, cleared after some ticks).
    pub notification: Option<String>,

    /// Ticks remaining until notification is cleared.
    notification_ttl: usize,

    /// Requested network work, drained by the event loop.
    effects: Vec<Effect>,
}

impl App {
    /// Create a new app instance for the given user.
    ///
    /// If the user identifier is non-empty the initial conversation list
    /// fetch is requested immediately.
    pub fn new(user: impl Into<String>) -> Self {
        let sync = SyncState::new(user);
        let mut app = Self {
            should_quit: false,
            show_help: false,
            sync,
            focus: Focus::default(),
            mode: Mode::default(),
            list_index: 0,
            composer_input: TextInputState::new(),
            contact_input: TextInputState::new(),
            search_input: TextInputState::new(),
            contact: None,
            loading_conversations: false,
            thread_fetches: 0,
            send_in_flight: false,
            create_in_flight: false,
            tick: 0,
            notification: None,
            notification_ttl: 0,
            effects: Vec::new(),
        };
        app.refresh_conversations();
        app
    }

    /// Drain the network work requested since the last call.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Whether a thread fetch is in flight.
    pub fn loading_thread(&self) -> bool {
        self.thread_fetches > 0
    }

    /// Conversations matching the current search filter.
    pub fn filtered_conversations(&self) -> Vec<&Conversation> {
        let filter = self.search_input.content().trim().to_lowercase();
        self.sync
            .conversations()
            .iter()
            .filter(|c| {
                if filter.is_empty() {
                    return true;
                }
                c.contact(self.sync.user())
                    .is_some_and(|name| name.to_lowercase().contains(&filter))
            })
            .collect()
    }

    /// The other participant of the selected conversation, if derivable.
    pub fn selected_contact_name(&self) -> Option<&str> {
        self.sync.selected()?.contact(self.sync.user())
    }

    /// Handle an action.
    pub fn handle_action(&mut self, action: Action) {
        // Global actions
        match action {
            Action::Quit => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.should_quit = true;
                }
                return;
            }
            Action::Help => {
                self.show_help = !self.show_help;
                return;
            }
            _ => {}
        }

        // If help is showing, any key closes it
        if self.show_help {
            self.show_help = false;
            return;
        }

        match self.mode {
            Mode::NewContact => self.handle_new_contact_action(action),
            Mode::Search => self.handle_search_action(action),
            Mode::Normal => match self.focus {
                Focus::List => self.handle_list_action(action),
                Focus::Composer => self.handle_composer_action(action),
            },
        }
    }

    fn handle_list_action(&mut self, action: Action) {
        match action {
            Action::Up => {
                if self.list_index > 0 {
                    self.list_index -= 1;
                }
            }
            Action::Down => {
                let len = self.filtered_conversations().len();
                if self.list_index + 1 < len {
                    self.list_index += 1;
                }
            }
            Action::Select => self.select_highlighted(),
            Action::NewConversation => {
                self.mode = Mode::NewContact;
            }
            Action::Refresh => self.refresh_conversations(),
            Action::Search => {
                self.mode = Mode::Search;
            }
            Action::FocusNext => {
                self.focus = Focus::Composer;
            }
            _ => {}
        }
    }

    fn handle_composer_action(&mut self, action: Action) {
        match action {
            Action::Select => self.send_message(),
            Action::FocusNext | Action::Back => {
                self.focus = Focus::List;
            }
            _ => {}
        }
    }

    fn handle_new_contact_action(&mut self, action: Action) {
        match action {
            Action::Select => self.submit_new_contact(),
            Action::Back => {
                self.contact_input.clear();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    fn handle_search_action(&mut self, action: Action) {
        match action {
            // Enter keeps the filter, Esc clears it
            Action::Select => {
                self.mode = Mode::Normal;
                self.clamp_list_index();
            }
            Action::Back => {
                self.search_input.clear();
                self.mode = Mode::Normal;
                self.clamp_list_index();
            }
            _ => {}
        }
    }

    // === Triggers ===

    /// Request a wholesale conversation list refresh.
    pub fn refresh_conversations(&mut self) {
        match self.sync.begin_conversations_load() {
            Some(request) => {
                self.loading_conversations = true;
                self.effects.push(Effect::LoadConversations(request));
            }
            None => {
                self.set_notification("No user name configured; list not loaded".to_string());
            }
        }
    }

    /// Select the highlighted conversation and request its thread.
    fn select_highlighted(&mut self) {
        let Some(id) = self
            .filtered_conversations()
            .get(self.list_index)
            .map(|c| c.conversation_id.clone())
        else {
            return;
        };

        if let Some(request) = self.sync.begin_select(&id) {
            self.thread_fetches += 1;
            self.effects.push(Effect::LoadThread(request));

            // Presence for the thread header; cosmetic, so failures just
            // leave it blank.
            self.contact = None;
            let contact_name = self.selected_contact_name().map(str::to_string);
            if let Some(name) = contact_name {
                self.effects.push(Effect::LoadContact(name));
            }

            self.focus = Focus::Composer;
        }
    }

    /// Send the composer content to the selected conversation.
    fn send_message(&mut self) {
        if self.send_in_flight {
            return;
        }
        self.sync.set_composer(self.composer_input.content());
        if let Some(pending) = self.sync.begin_send(Utc::now()) {
            self.send_in_flight = true;
            self.effects.push(Effect::SendMessage(pending));
        }
    }

    /// Submit the new-conversation prompt.
    fn submit_new_contact(&mut self) {
        if self.create_in_flight {
            return;
        }
        let name = self.contact_input.content().trim().to_string();
        if let Some(request) = self.sync.begin_create(&name) {
            self.create_in_flight = true;
            self.effects.push(Effect::CreateConversation(request));
            self.contact_input.clear();
            self.mode = Mode::Normal;
        }
        // Blank input: stay in the prompt, Esc cancels.
    }

    // === Response handlers ===

    /// Fold a conversation list response in.
    pub fn apply_conversations(&mut self, result: Result<Vec<Conversation>, ApiError>) {
        self.loading_conversations = false;
        if !self.sync.apply_conversations(result) {
            self.set_notification("Couldn't refresh conversations".to_string());
        }
        self.clamp_list_index();
    }

    /// Fold a thread fetch response in.
    pub fn apply_thread(&mut self, request: &ThreadRequest, result: Result<Vec<Message>, ApiError>) {
        self.thread_fetches = self.thread_fetches.saturating_sub(1);
        self.sync.apply_thread(request, result);
    }

    /// Fold a send outcome in.
    pub fn apply_send(&mut self, pending: &PendingSend, result: Result<(), ApiError>) {
        self.send_in_flight = false;
        if self.sync.apply_send(pending, result) {
            self.composer_input.clear();
        } else {
            self.set_notification("Send failed; message kept in composer".to_string());
        }
    }

    /// Fold a create response in.
    pub fn apply_create(&mut self, result: Result<Conversation, ApiError>) {
        self.create_in_flight = false;
        if self.sync.apply_create(result) {
            self.set_notification("Conversation created".to_string());
        } else {
            self.set_notification("Couldn't create conversation".to_string());
        }
    }

    /// Fold a contact details response in.
    pub fn apply_contact(&mut self, result: Result<User, ApiError>) {
        self.contact = result.ok();
    }

    fn clamp_list_index(&mut self) {
        let len = self.filtered_conversations().len();
        self.list_index = self.list_index.min(len.saturating_sub(1));
    }

    /// Set a temporary notification message.
    pub fn set_notification(&mut self, msg: String) {
        self.notification = Some(msg);
        // Display for ~3 seconds at 4 Hz tick rate (250ms) = 12 ticks
        self.notification_ttl = 12;
    }

    /// Increment tick counter and update time-based state.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);

        // Clear notification after TTL expires
        if self.notification_ttl > 0 {
            self.notification_ttl -= 1;
            if self.notification_ttl == 0 {
                self.notification = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn conversation(id: &str, a: &str, b: &str) -> Conversation {
        Conversation {
            conversation_id: id.into(),
            participants: vec![a.into(), b.into()],
            last_message: Message {
                id: "m0".into(),
                from: b.into(),
                to: a.into(),
                content: "hi".into(),
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            },
        }
    }

    fn app_with_conversations() -> App {
        let mut app = App::new("alice");
        app.take_effects();
        app.apply_conversations(Ok(vec![
            conversation("a", "alice", "bob"),
            conversation("b", "alice", "carol"),
        ]));
        app
    }

    #[test]
    fn test_new_app_requests_initial_load() {
        let mut app = App::new("alice");
        let effects = app.take_effects();
        assert!(matches!(
            effects.as_slice(),
            [Effect::LoadConversations(req)] if req.user == "alice"
        ));
        assert!(app.loading_conversations);
    }

    #[test]
    fn test_empty_user_requests_nothing() {
        let mut app = App::new("");
        assert!(app.take_effects().is_empty());
        assert!(!app.loading_conversations);
        assert!(app.notification.is_some());
    }

    #[test]
    fn test_select_requests_thread_and_contact() {
        let mut app = app_with_conversations();
        app.handle_action(Action::Down);
        app.handle_action(Action::Select);

        let effects = app.take_effects();
        assert_eq!(effects.len(), 2);
        assert!(matches!(
            &effects[0],
            Effect::LoadThread(req) if req.conversation_id == "b"
        ));
        assert!(matches!(
            &effects[1],
            Effect::LoadContact(name) if name == "carol"
        ));
        assert!(app.loading_thread());
        assert_eq!(app.focus, Focus::Composer);
    }

    #[test]
    fn test_send_flow_clears_composer_on_success() {
        let mut app = app_with_conversations();
        app.handle_action(Action::Select);
        let effects = app.take_effects();
        let Effect::LoadThread(request) = &effects[0] else {
            panic!("expected thread load");
        };
        app.apply_thread(request, Ok(vec![]));

        app.composer_input.insert_str("hello");
        app.handle_action(Action::Select); // composer focused after select
        let effects = app.take_effects();
        let Effect::SendMessage(pending) = &effects[0] else {
            panic!("expected send");
        };
        assert!(app.send_in_flight);

        app.apply_send(pending, Ok(()));
        assert!(!app.send_in_flight);
        assert!(app.composer_input.is_empty());
        assert_eq!(app.sync.messages().len(), 1);
    }

    #[test]
    fn test_failed_send_keeps_composer_text() {
        let mut app = app_with_conversations();
        app.handle_action(Action::Select);
        let effects = app.take_effects();
        let Effect::LoadThread(request) = &effects[0] else {
            panic!("expected thread load");
        };
        app.apply_thread(request, Ok(vec![]));

        app.composer_input.insert_str("hello");
        app.handle_action(Action::Select);
        let effects = app.take_effects();
        let Effect::SendMessage(pending) = &effects[0] else {
            panic!("expected send");
        };

        app.apply_send(
            pending,
            Err(ApiError::Status {
                status: 500,
                body: "boom".into(),
            }),
        );
        assert_eq!(app.composer_input.content(), "hello");
        assert!(app.sync.messages().is_empty());
        assert!(app.notification.is_some());
    }

    #[test]
    fn test_second_send_blocked_while_in_flight() {
        let mut app = app_with_conversations();
        app.handle_action(Action::Select);
        app.take_effects();

        app.composer_input.insert_str("hello");
        app.handle_action(Action::Select);
        assert_eq!(app.take_effects().len(), 1);

        app.handle_action(Action::Select);
        assert!(app.take_effects().is_empty());
    }

    #[test]
    fn test_new_contact_modal_flow() {
        let mut app = app_with_conversations();
        app.handle_action(Action::NewConversation);
        assert_eq!(app.mode, Mode::NewContact);

        // Blank submit keeps the prompt open.
        app.handle_action(Action::Select);
        assert_eq!(app.mode, Mode::NewContact);
        assert!(app.take_effects().is_empty());

        app.contact_input.insert_str("dave");
        app.handle_action(Action::Select);
        assert_eq!(app.mode, Mode::Normal);
        let effects = app.take_effects();
        assert!(matches!(
            &effects[0],
            Effect::CreateConversation(req)
                if req.participants == ["alice".to_string(), "dave".to_string()]
        ));

        app.apply_create(Ok(conversation("c", "alice", "dave")));
        assert_eq!(app.sync.conversations().len(), 3);
    }

    #[test]
    fn test_search_filters_list() {
        let mut app = app_with_conversations();
        app.handle_action(Action::Search);
        assert_eq!(app.mode, Mode::Search);
        app.search_input.insert_str("car");

        let filtered = app.filtered_conversations();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].conversation_id, "b");

        // Esc clears the filter.
        app.handle_action(Action::Back);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.filtered_conversations().len(), 2);
    }

    #[test]
    fn test_list_navigation_clamps() {
        let mut app = app_with_conversations();
        app.handle_action(Action::Up);
        assert_eq!(app.list_index, 0);
        app.handle_action(Action::Down);
        app.handle_action(Action::Down);
        assert_eq!(app.list_index, 1);
    }

    #[test]
    fn test_help_closes_before_quit() {
        let mut app = app_with_conversations();
        app.show_help = true;

        app.handle_action(Action::Quit);
        assert!(!app.show_help);
        assert!(!app.should_quit);

        app.handle_action(Action::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_notification_expires_after_ticks() {
        let mut app = app_with_conversations();
        app.set_notification("hello".to_string());
        for _ in 0..12 {
            assert!(app.notification.is_some());
            app.tick();
        }
        assert!(app.notification.is_none());
    }
}
