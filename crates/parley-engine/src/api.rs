//! Client for the remote conversation service.
//!
//! [`ConversationApi`] is the seam between the sync layer and the network:
//! the HTTP implementation lives here, tests drive the sync layer through
//! in-memory implementations.

use crate::model::{Conversation, Message, OutgoingMessage, User};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Request timeout for all service calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the conversation service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or the response body not read.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status. The body text is
    /// kept as diagnostic detail.
    #[error("service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, read as text.
        body: String,
    },

    /// The response body could not be parsed as the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Operations exposed by the conversation service.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    /// Fetch all conversations involving `user`.
    async fn list_conversations(&self, user: &str) -> Result<Vec<Conversation>, ApiError>;

    /// Fetch the full message list of a conversation.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError>;

    /// Create a conversation between the given participants.
    async fn create_conversation(
        &self,
        participants: [String; 2],
    ) -> Result<Conversation, ApiError>;

    /// Post a message to a conversation.
    ///
    /// Only the response status is inspected; the caller appends its own
    /// optimistic copy rather than waiting for a server echo.
    async fn send_message(
        &self,
        conversation_id: &str,
        message: &OutgoingMessage,
    ) -> Result<(), ApiError>;

    /// Fetch contact details for a user.
    async fn get_user(&self, user_id: &str) -> Result<User, ApiError>;
}

/// HTTP/JSON implementation of [`ConversationApi`].
#[derive(Debug, Clone)]
pub struct HttpConversationApi {
    client: Client,
    base_url: String,
}

/// Wire body for creating a conversation.
#[derive(Debug, Serialize)]
struct CreateConversationBody {
    participants: [String; 2],
}

impl HttpConversationApi {
    /// Create a client against the given base URL (e.g. `http://localhost:8080`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn conversations_url(&self) -> String {
        format!("{}/api/conversations", self.base_url)
    }

    fn messages_url(&self, conversation_id: &str) -> String {
        format!(
            "{}/api/conversations/{conversation_id}/messages",
            self.base_url
        )
    }

    fn user_url(&self, user_id: &str) -> String {
        format!("{}/api/users/{user_id}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_body(status, &body)
    }
}

#[async_trait]
impl ConversationApi for HttpConversationApi {
    async fn list_conversations(&self, user: &str) -> Result<Vec<Conversation>, ApiError> {
        self.get_json(&self.conversations_url(), &[("name", user)])
            .await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        self.get_json(&self.messages_url(conversation_id), &[]).await
    }

    async fn create_conversation(
        &self,
        participants: [String; 2],
    ) -> Result<Conversation, ApiError> {
        let response = self
            .client
            .post(self.conversations_url())
            .json(&CreateConversationBody { participants })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        decode_body(status, &body)
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        message: &OutgoingMessage,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.messages_url(conversation_id))
            .json(message)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            // The service answers with a plain-text acknowledgement; the
            // body carries nothing the client uses.
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn get_user(&self, user_id: &str) -> Result<User, ApiError> {
        self.get_json(&self.user_url(user_id), &[]).await
    }
}

/// Turn a status/body pair into a decoded value or an [`ApiError`].
fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }
    serde_json::from_str(body).map_err(ApiError::Decode)
}
