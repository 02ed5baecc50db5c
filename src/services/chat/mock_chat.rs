use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

use super::{ChatError, ChatService};
use crate::models::chat::ChatReply;

/// Records prompts and echoes a canned reply.
#[derive(Debug, Default)]
pub struct MockChatService {
    pub prompts: Mutex<Vec<(String, String)>>,
    pub fail_reply: bool,
}

impl MockChatService {
    pub fn failing() -> Self {
        Self {
            fail_reply: true,
            ..Default::default()
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatService for MockChatService {
    async fn reply(&self, user_id: &str, message: &str) -> Result<ChatReply, ChatError> {
        self.prompts
            .lock()
            .unwrap()
            .push((user_id.to_string(), message.to_string()));
        if self.fail_reply {
            return Err(ChatError::InvalidResponse("mock failure".into()));
        }
        Ok(ChatReply {
            id: Uuid::new_v4(),
            content: format!("Breathe deeply. You said: {message}"),
            model: "mock".into(),
        })
    }
}
