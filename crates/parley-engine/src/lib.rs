//! parley-engine: Headless sync engine for the parley messaging client
//!
//! This crate provides the core client logic for parley, including:
//! - The conversation/message data model
//! - The remote conversation service client
//! - The synchronization state machine driving the UI
//! - Configuration management

pub mod api;
pub mod config;
pub mod model;
pub mod sync;

// Re-export commonly used types
pub use api::{ApiError, ConversationApi, HttpConversationApi};
pub use config::{Config, ConfigError};
pub use model::{
    canonical_participants, contact_for, Conversation, Message, OutgoingMessage, User,
};
pub use sync::{CreateRequest, ListRequest, PendingSend, SyncState, ThreadRequest};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
