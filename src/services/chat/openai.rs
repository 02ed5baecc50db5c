use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ChatError, ChatService};
use crate::models::chat::ChatReply;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are a warm, grounded spiritual wellness companion. \
Offer gentle reflection, mindfulness practices, and encouragement. \
Do not give medical, legal, or financial advice.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct OpenAiChatService {
    settings: OpenAiSettings,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiChatService {
    pub fn new(http: &Client, settings: OpenAiSettings) -> Self {
        Self {
            settings,
            http: http.clone(),
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ChatService for OpenAiChatService {
    async fn reply(&self, user_id: &str, message: &str) -> Result<ChatReply, ChatError> {
        let payload = json!({
            "model": self.settings.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": message }
            ],
            "user": user_id,
        });

        let resp = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.settings.api_key)
            .timeout(self.settings.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            warn!(%status, %user_id, "chat provider rejected request");
            return Err(ChatError::Api { status, message });
        }

        let body: CompletionResponse = resp
            .json()
            .await
            .map_err(|err| ChatError::InvalidResponse(err.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ChatError::InvalidResponse("response contained no reply".into()))?;

        debug!(%user_id, chars = content.len(), "received chat reply");

        Ok(ChatReply {
            id: Uuid::new_v4(),
            content,
            model: body.model.unwrap_or_else(|| self.settings.model.clone()),
        })
    }
}
