//! Client-side synchronization state for conversations and messages.
//!
//! [`SyncState`] holds everything the UI shows: the conversation cache, the
//! current selection, the message buffer for the selected conversation, and
//! the composer. It is single-threaded; network I/O happens elsewhere.
//!
//! Every remote trigger follows a begin/apply protocol: `begin_*` validates
//! the trigger and returns a request descriptor (or `None` when local
//! validation fails), the caller performs the fetch, and the matching
//! `apply_*` folds the result back in. State only changes inside `apply_*`,
//! after a response — a failed call never leaves a partial mutation behind.

use crate::api::ApiError;
use crate::model::{contact_for, Conversation, Message, OutgoingMessage};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// A requested conversation list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// User whose conversations to fetch.
    pub user: String,
}

/// A requested thread fetch, tagged with the selection sequence current at
/// issue time. Responses whose sequence no longer matches are discarded, so
/// a later selection always wins over an earlier in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRequest {
    /// Conversation whose messages to fetch.
    pub conversation_id: String,
    seq: u64,
}

/// A requested conversation create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// Canonically ordered participant pair.
    pub participants: [String; 2],
}

/// A message send in flight.
#[derive(Debug, Clone)]
pub struct PendingSend {
    /// Conversation the message was addressed to.
    pub conversation_id: String,
    /// The outgoing wire body.
    pub message: OutgoingMessage,
}

/// Synchronization state for one user session.
#[derive(Debug, Default)]
pub struct SyncState {
    user: String,
    conversations: Vec<Conversation>,
    selected: Option<Conversation>,
    messages: Vec<Message>,
    composer: String,
    thread_seq: u64,
}

impl SyncState {
    /// Create state for the given user. An empty identifier is allowed;
    /// it just means no conversation list fetch will be issued.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Self::default()
        }
    }

    /// Current user's participant identifier.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The conversation cache, in the order the service returned it
    /// (creations appended at the end).
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// The currently selected conversation, if any.
    pub fn selected(&self) -> Option<&Conversation> {
        self.selected.as_ref()
    }

    /// The message buffer for the selected conversation.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages that should appear in a thread view. Blank-content messages
    /// stay in the buffer but are filtered here.
    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.is_displayable())
    }

    /// Current composer text.
    pub fn composer(&self) -> &str {
        &self.composer
    }

    /// Replace the composer text.
    pub fn set_composer(&mut self, text: impl Into<String>) {
        self.composer = text.into();
    }

    // === Conversation list load ===

    /// Trigger a conversation list fetch for the current user.
    ///
    /// Returns `None` when the user identifier is empty: no request is
    /// made and the cache stays as it is.
    pub fn begin_conversations_load(&self) -> Option<ListRequest> {
        if self.user.trim().is_empty() {
            return None;
        }
        Some(ListRequest {
            user: self.user.clone(),
        })
    }

    /// Fold a conversation list response into the cache.
    ///
    /// Success replaces the cache wholesale; failure is logged and leaves
    /// it unchanged (stale-or-empty). Returns whether the cache changed.
    pub fn apply_conversations(&mut self, result: Result<Vec<Conversation>, ApiError>) -> bool {
        match result {
            Ok(conversations) => {
                self.conversations = conversations;
                true
            }
            Err(e) => {
                warn!(error = %e, "conversation list fetch failed, keeping cache");
                false
            }
        }
    }

    // === Selection / thread load ===

    /// Select a conversation from the cache and trigger its thread fetch.
    ///
    /// Unknown ids are a no-op. Re-selecting the current conversation
    /// issues a fresh fetch. The previous buffer stays visible until the
    /// response replaces it.
    pub fn begin_select(&mut self, conversation_id: &str) -> Option<ThreadRequest> {
        let conversation = self
            .conversations
            .iter()
            .find(|c| c.conversation_id == conversation_id)?
            .clone();
        self.selected = Some(conversation);
        self.thread_seq += 1;
        Some(ThreadRequest {
            conversation_id: conversation_id.to_string(),
            seq: self.thread_seq,
        })
    }

    /// Fold a thread fetch response into the message buffer.
    ///
    /// A response for a superseded selection (sequence mismatch) is
    /// discarded. Success replaces the buffer wholesale; failure is logged
    /// and leaves it unchanged. Returns whether the buffer was replaced.
    pub fn apply_thread(
        &mut self,
        request: &ThreadRequest,
        result: Result<Vec<Message>, ApiError>,
    ) -> bool {
        if request.seq != self.thread_seq {
            debug!(
                conversation = %request.conversation_id,
                "discarding stale thread response"
            );
            return false;
        }
        match result {
            Ok(messages) => {
                self.messages = messages;
                true
            }
            Err(e) => {
                warn!(
                    conversation = %request.conversation_id,
                    error = %e,
                    "thread fetch failed, keeping buffer"
                );
                false
            }
        }
    }

    // === Conversation creation ===

    /// Trigger creation of a conversation with `contact`.
    ///
    /// The participant pair is sorted lexicographically so both sides of a
    /// pairing produce the same request. Blank contact names and a missing
    /// user identity are silent no-ops.
    pub fn begin_create(&self, contact: &str) -> Option<CreateRequest> {
        let contact = contact.trim();
        if contact.is_empty() || self.user.trim().is_empty() {
            return None;
        }
        Some(CreateRequest {
            participants: crate::model::canonical_participants(self.user.clone(), contact),
        })
    }

    /// Fold a create response into the cache.
    ///
    /// Success appends the new conversation (never replaces the cache);
    /// failure is logged with the service's diagnostic body and leaves the
    /// cache untouched. Returns whether a conversation was appended.
    pub fn apply_create(&mut self, result: Result<Conversation, ApiError>) -> bool {
        match result {
            Ok(conversation) => {
                self.conversations.push(conversation);
                true
            }
            Err(e) => {
                warn!(error = %e, "conversation create failed");
                false
            }
        }
    }

    // === Message send ===

    /// Trigger a send of the current composer text.
    ///
    /// No-ops (returning `None`): composer blank after trimming, no
    /// selected conversation, or no recipient derivable from the selected
    /// conversation's participants.
    pub fn begin_send(&self, now: DateTime<Utc>) -> Option<PendingSend> {
        if self.composer.trim().is_empty() {
            return None;
        }
        let selected = self.selected.as_ref()?;
        let Some(to) = contact_for(&selected.participants, &self.user) else {
            warn!(
                conversation = %selected.conversation_id,
                "no recipient derivable, dropping send"
            );
            return None;
        };
        Some(PendingSend {
            conversation_id: selected.conversation_id.clone(),
            message: OutgoingMessage::new(self.user.clone(), to, self.composer.clone(), now),
        })
    }

    /// Fold a send outcome back in.
    ///
    /// Success clears the composer and appends the optimistic local copy to
    /// the buffer — unless the selection moved on while the send was in
    /// flight, in which case the append is skipped so the buffer keeps
    /// matching the selected conversation. Failure is logged; the composer
    /// keeps its text for retry and the buffer is untouched.
    ///
    /// Returns `true` when the send succeeded (composer cleared).
    pub fn apply_send(&mut self, pending: &PendingSend, result: Result<(), ApiError>) -> bool {
        match result {
            Ok(()) => {
                self.composer.clear();
                let still_selected = self
                    .selected
                    .as_ref()
                    .is_some_and(|c| c.conversation_id == pending.conversation_id);
                if still_selected {
                    self.messages.push(pending.message.to_local());
                } else {
                    debug!(
                        conversation = %pending.conversation_id,
                        "send confirmed after selection change, skipping append"
                    );
                }
                true
            }
            Err(e) => {
                warn!(
                    conversation = %pending.conversation_id,
                    error = %e,
                    "message send failed, keeping composer"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Message;
    use chrono::TimeZone;

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap()
    }

    fn message(id: &str, from: &str, to: &str, content: &str) -> Message {
        Message {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            content: content.into(),
            timestamp: ts(0),
        }
    }

    fn conversation(id: &str, a: &str, b: &str) -> Conversation {
        Conversation {
            conversation_id: id.into(),
            participants: vec![a.into(), b.into()],
            last_message: message("last", b, a, "hi"),
        }
    }

    fn network_error() -> ApiError {
        ApiError::Status {
            status: 500,
            body: "boom".into(),
        }
    }

    #[test]
    fn test_list_load_replaces_wholesale() {
        // P1: loading twice with the same backing data never duplicates.
        let mut state = SyncState::new("alice");
        let convs = vec![conversation("c1", "alice", "bob")];

        assert!(state.begin_conversations_load().is_some());
        state.apply_conversations(Ok(convs.clone()));
        state.apply_conversations(Ok(convs.clone()));

        assert_eq!(state.conversations(), convs.as_slice());
    }

    #[test]
    fn test_empty_user_makes_no_request() {
        let state = SyncState::new("");
        assert!(state.begin_conversations_load().is_none());
        assert!(SyncState::new("   ").begin_conversations_load().is_none());
    }

    #[test]
    fn test_failed_list_load_keeps_cache() {
        let mut state = SyncState::new("alice");
        state.apply_conversations(Ok(vec![conversation("c1", "alice", "bob")]));

        assert!(!state.apply_conversations(Err(network_error())));
        assert_eq!(state.conversations().len(), 1);
    }

    #[test]
    fn test_selection_isolation() {
        // P2: A -> B -> A yields exactly the fresh fetch for A.
        let mut state = SyncState::new("alice");
        state.apply_conversations(Ok(vec![
            conversation("a", "alice", "bob"),
            conversation("b", "alice", "carol"),
        ]));

        let req = state.begin_select("a").unwrap();
        state.apply_thread(&req, Ok(vec![message("m1", "bob", "alice", "one")]));

        let req = state.begin_select("b").unwrap();
        state.apply_thread(&req, Ok(vec![message("m2", "carol", "alice", "two")]));

        let req = state.begin_select("a").unwrap();
        let fresh = vec![
            message("m1", "bob", "alice", "one"),
            message("m3", "bob", "alice", "three"),
        ];
        state.apply_thread(&req, Ok(fresh.clone()));

        assert_eq!(state.messages(), fresh.as_slice());
    }

    #[test]
    fn test_stale_thread_response_discarded() {
        let mut state = SyncState::new("alice");
        state.apply_conversations(Ok(vec![
            conversation("a", "alice", "bob"),
            conversation("b", "alice", "carol"),
        ]));

        // Fetch for "a" is still in flight when the user selects "b".
        let stale = state.begin_select("a").unwrap();
        let current = state.begin_select("b").unwrap();

        assert!(!state.apply_thread(&stale, Ok(vec![message("m1", "bob", "alice", "old")])));
        assert!(state.messages().is_empty());

        assert!(state.apply_thread(&current, Ok(vec![message("m2", "carol", "alice", "new")])));
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].id, "m2");
    }

    #[test]
    fn test_failed_thread_load_keeps_buffer() {
        let mut state = SyncState::new("alice");
        state.apply_conversations(Ok(vec![conversation("a", "alice", "bob")]));

        let req = state.begin_select("a").unwrap();
        state.apply_thread(&req, Ok(vec![message("m1", "bob", "alice", "hi")]));

        let req = state.begin_select("a").unwrap();
        assert!(!state.apply_thread(&req, Err(network_error())));
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn test_select_unknown_conversation_is_noop() {
        let mut state = SyncState::new("alice");
        assert!(state.begin_select("nope").is_none());
        assert!(state.selected().is_none());
    }

    #[test]
    fn test_recipient_derivation_guards_send() {
        // P3 edge: a conversation where no other participant exists.
        let mut state = SyncState::new("alice");
        state.apply_conversations(Ok(vec![conversation("solo", "alice", "alice")]));
        state.begin_select("solo").unwrap();
        state.set_composer("hello");

        assert!(state.begin_send(ts(1)).is_none());
    }

    #[test]
    fn test_blank_composer_or_no_selection_is_noop() {
        let mut state = SyncState::new("alice");
        state.apply_conversations(Ok(vec![conversation("a", "alice", "bob")]));

        // No selection yet.
        state.set_composer("hello");
        assert!(state.begin_send(ts(1)).is_none());

        // Blank text.
        state.begin_select("a").unwrap();
        state.set_composer("   ");
        assert!(state.begin_send(ts(1)).is_none());
    }

    #[test]
    fn test_send_success_appends_and_clears_composer() {
        let mut state = SyncState::new("alice");
        state.apply_conversations(Ok(vec![conversation("a", "alice", "bob")]));
        let req = state.begin_select("a").unwrap();
        state.apply_thread(&req, Ok(vec![message("m1", "bob", "alice", "hi")]));

        state.set_composer("hello");
        let pending = state.begin_send(ts(5)).unwrap();
        assert_eq!(pending.message.from_name, "alice");
        assert_eq!(pending.message.to_name, "bob");
        assert_eq!(pending.message.timestamp, ts(5));

        assert!(state.apply_send(&pending, Ok(())));
        assert_eq!(state.composer(), "");
        assert_eq!(state.messages().len(), 2);
        let appended = &state.messages()[1];
        assert_eq!(appended.content, "hello");
        assert!(appended.id.starts_with("local-"));
    }

    #[test]
    fn test_failed_send_leaves_buffer_and_composer() {
        // P4 + P5.
        let mut state = SyncState::new("alice");
        state.apply_conversations(Ok(vec![conversation("a", "alice", "bob")]));
        let req = state.begin_select("a").unwrap();
        state.apply_thread(&req, Ok(vec![message("m1", "bob", "alice", "hi")]));

        state.set_composer("hello");
        let pending = state.begin_send(ts(5)).unwrap();

        assert!(!state.apply_send(&pending, Err(network_error())));
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.composer(), "hello");
    }

    #[test]
    fn test_send_confirmed_after_selection_change_skips_append() {
        let mut state = SyncState::new("alice");
        state.apply_conversations(Ok(vec![
            conversation("a", "alice", "bob"),
            conversation("b", "alice", "carol"),
        ]));
        state.begin_select("a").unwrap();
        state.set_composer("hello");
        let pending = state.begin_send(ts(5)).unwrap();

        // Selection moves on while the POST is in flight.
        let req = state.begin_select("b").unwrap();
        state.apply_thread(&req, Ok(vec![]));

        assert!(state.apply_send(&pending, Ok(())));
        assert_eq!(state.composer(), "");
        assert!(state.messages().is_empty());
    }

    #[test]
    fn test_create_appends_never_replaces() {
        // P6.
        let mut state = SyncState::new("alice");
        let existing = vec![
            conversation("a", "alice", "bob"),
            conversation("b", "alice", "carol"),
        ];
        state.apply_conversations(Ok(existing.clone()));

        let request = state.begin_create("dave").unwrap();
        assert_eq!(request.participants, ["alice".to_string(), "dave".to_string()]);

        state.apply_create(Ok(conversation("c", "alice", "dave")));
        assert_eq!(state.conversations().len(), 3);
        assert_eq!(&state.conversations()[..2], existing.as_slice());
        assert_eq!(state.conversations()[2].conversation_id, "c");
    }

    #[test]
    fn test_create_sorts_participants() {
        let state = SyncState::new("zoe");
        let request = state.begin_create("bob").unwrap();
        assert_eq!(request.participants, ["bob".to_string(), "zoe".to_string()]);
    }

    #[test]
    fn test_create_validation() {
        let state = SyncState::new("alice");
        assert!(state.begin_create("").is_none());
        assert!(state.begin_create("  ").is_none());
        assert!(SyncState::new("").begin_create("bob").is_none());
    }

    #[test]
    fn test_failed_create_keeps_cache() {
        let mut state = SyncState::new("alice");
        state.apply_conversations(Ok(vec![conversation("a", "alice", "bob")]));

        assert!(!state.apply_create(Err(ApiError::Status {
            status: 400,
            body: "Invalid request payload".into(),
        })));
        assert_eq!(state.conversations().len(), 1);
    }

    #[test]
    fn test_visible_messages_filters_blank_content() {
        let mut state = SyncState::new("alice");
        state.apply_conversations(Ok(vec![conversation("a", "alice", "bob")]));
        let req = state.begin_select("a").unwrap();
        state.apply_thread(
            &req,
            Ok(vec![
                message("m1", "bob", "alice", "hi"),
                message("m2", "bob", "alice", "   "),
                message("m3", "bob", "alice", "there"),
            ]),
        );

        let visible: Vec<_> = state.visible_messages().map(|m| m.id.as_str()).collect();
        assert_eq!(visible, ["m1", "m3"]);
        // The buffer itself keeps all three.
        assert_eq!(state.messages().len(), 3);
    }
}
