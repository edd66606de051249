//! Floating chat assistant.

use std::sync::Arc;

use serde_json::Value;

use crate::consumer::{PayloadMerger, SessionCorrelator, Status, StreamingConsumer};
use crate::error::CogniError;
use crate::execution::{StreamRequest, Transport};
use crate::streaming::StreamHandle;

pub const CHAT_PATH: &str = "/api/assistant/chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation so far plus the backend thread it belongs to.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    pub messages: Vec<ChatMessage>,
    pub thread: SessionCorrelator,
}

impl PayloadMerger for ChatHistory {
    fn merge(&mut self, payload: &Value) {
        self.thread.observe(payload);

        let Some(delta) = payload.get("delta").and_then(Value::as_str) else {
            return;
        };
        if let Some(last) = self.messages.last_mut() {
            last.content.push_str(delta);
        }
    }

    /// The thread survives a cancelled round; only the messages roll back.
    fn restore(&mut self, baseline: Self) {
        self.messages = baseline.messages;
    }

    fn on_failure(&mut self, message: &str) {
        if let Some(last) = self.messages.last_mut() {
            last.content = message.to_string();
        }
    }

    fn server_error_message(&self) -> &'static str {
        "An error occurred."
    }

    fn connect_error_message(&self) -> &'static str {
        "Failed to connect to the assistant."
    }
}

pub struct ChatAssistant {
    consumer: StreamingConsumer<ChatHistory>,
}

impl ChatAssistant {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            consumer: StreamingConsumer::new(transport, "assistant", ChatHistory::default()),
        }
    }

    pub async fn start_send(&mut self, message: &str) -> Result<StreamHandle, CogniError> {
        if message.trim().is_empty() {
            return Err(CogniError::invalid_input("message must not be empty"));
        }

        let request = StreamRequest::new(CHAT_PATH)
            .param("thread_id", self.consumer.state().thread.wire_value())
            .param("message", message);
        let message = message.to_string();
        self.consumer
            .start(request, move |history| {
                history.messages.push(ChatMessage::user(message));
                history.messages.push(ChatMessage::assistant(""));
            })
            .await
    }

    pub async fn send(&mut self, message: &str) -> Result<Status, CogniError> {
        self.start_send(message).await?;
        Ok(self.consumer.drive().await)
    }

    /// Forget the transcript and the thread.
    pub fn new_conversation(&mut self) {
        self.consumer.cancel();
        *self.consumer.view_mut().state_mut() = ChatHistory::default();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.consumer.state().messages
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.consumer.state().thread.get()
    }

    pub fn status(&self) -> Status {
        self.consumer.status()
    }

    pub fn cancel(&mut self) -> bool {
        self.consumer.cancel()
    }

    pub fn consumer_mut(&mut self) -> &mut StreamingConsumer<ChatHistory> {
        &mut self.consumer
    }
}
