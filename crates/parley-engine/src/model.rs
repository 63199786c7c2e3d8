//! Core data types for conversations and messages.
//!
//! These mirror the wire format of the conversation service: the JSON field
//! names here are the API contract, so renames must stay in sync with the
//! server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single message in a conversation.
///
/// Immutable once created; identity is `id`. Messages built locally for an
/// optimistic append carry a temporary client-generated id until the next
/// full thread fetch replaces them with server data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message id. Server-assigned, or a client temporary id for
    /// optimistically appended messages.
    #[serde(default)]
    pub id: String,
    /// Sender's participant identifier.
    pub from: String,
    /// Recipient's participant identifier.
    pub to: String,
    /// Message text.
    pub content: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Whether this message should appear in a thread view.
    ///
    /// Blank-content messages are hidden from display but kept in the
    /// buffer; this is a display rule, not a storage rule.
    pub fn is_displayable(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Wire body for posting a message to a conversation.
///
/// The server assigns the durable id; the client only ships sender,
/// recipient, text, and its own timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Sender's participant identifier.
    pub from_name: String,
    /// Recipient's participant identifier.
    pub to_name: String,
    /// Message text.
    pub content: String,
    /// Client-generated creation instant.
    pub timestamp: DateTime<Utc>,
}

impl OutgoingMessage {
    /// Create an outgoing message.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            from_name: from.into(),
            to_name: to.into(),
            content: content.into(),
            timestamp,
        }
    }

    /// Build the local copy appended to the buffer after a successful send.
    ///
    /// Assigns a temporary UUID so the message has a stable display key
    /// until the next thread fetch returns the server's copy.
    pub fn to_local(&self) -> Message {
        Message {
            id: format!("local-{}", Uuid::new_v4()),
            from: self.from_name.clone(),
            to: self.to_name.clone(),
            content: self.content.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// A two-party conversation as served by the conversation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Server-assigned conversation id. The client never creates one.
    pub conversation_id: String,
    /// Participant identifiers. Nominally a pair; degenerate shapes from
    /// the server are tolerated, not rejected.
    pub participants: Vec<String>,
    /// Most recent message, possibly stale or synthesized by the server.
    pub last_message: Message,
}

impl Conversation {
    /// The other participant, from the current user's point of view.
    pub fn contact<'a>(&'a self, user: &str) -> Option<&'a str> {
        contact_for(&self.participants, user)
    }
}

/// Contact details served by the user endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub avatar: String,
    pub status: String,
}

/// Derive the other participant of a conversation.
///
/// Returns the first participant not equal to `user`, or `None` when there
/// is no such entry (empty list, or every entry equals the current user).
/// Total over all inputs.
pub fn contact_for<'a>(participants: &'a [String], user: &str) -> Option<&'a str> {
    participants
        .iter()
        .find(|p| p.as_str() != user)
        .map(String::as_str)
}

/// Canonical participant pair for conversation creation.
///
/// The pair is sorted lexicographically so that the same two users always
/// produce the same create request regardless of who initiates.
pub fn canonical_participants(a: impl Into<String>, b: impl Into<String>) -> [String; 2] {
    let a = a.into();
    let b = b.into();
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}
