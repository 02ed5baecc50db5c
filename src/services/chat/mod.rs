use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::models::chat::ChatReply;

mod mock_chat;
mod openai;

pub use mock_chat::MockChatService;
pub use openai::{OpenAiChatService, OpenAiSettings, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat provider responded with status {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("chat provider returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// The gated action: one user message in, one assistant reply out.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn reply(&self, user_id: &str, message: &str) -> Result<ChatReply, ChatError>;
}
