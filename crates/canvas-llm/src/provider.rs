use std::time::Duration;

use async_trait::async_trait;
use canvas_core::ChatMessage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Protocol conversion error: {0}")]
    Protocol(#[from] crate::protocol::ProtocolError),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, LLMError>;

/// One chat-completion endpoint.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Single, non-streamed completion.
    ///
    /// # Arguments
    /// * `system_message` - Sent ahead of the conversation
    /// * `messages` - Conversation in order, oldest first
    /// * `model` - Optional model override. If None, uses the provider's default model
    async fn complete(
        &self,
        system_message: &str,
        messages: &[ChatMessage],
        model: Option<&str>,
    ) -> Result<String>;
}
