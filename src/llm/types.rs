//! Common types for LLM interactions

use serde::{Deserialize, Serialize};

/// Message role on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Role-tagged message exchanged with the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

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

/// The unit sent to a transport: one model, one ordered message list
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationRequest {
    pub model_endpoint_id: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
}

impl ConversationRequest {
    pub fn new(model_endpoint_id: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model_endpoint_id: model_endpoint_id.into(),
            messages,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Text of the system message, if the request carries one
    #[cfg(test)]
    pub fn system_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
    }
}

/// Transport reply
#[derive(Debug, Clone, Default)]
pub struct ChatCompletion {
    pub messages: Vec<ChatMessage>,
    pub usage: Option<Usage>,
}

impl ChatCompletion {
    /// Content of the first assistant message, falling back to the first
    /// message of any role, or an empty string for an empty completion
    pub fn text(&self) -> String {
        self.messages
            .iter()
            .find(|m| m.role == ChatRole::Assistant)
            .or_else(|| self.messages.first())
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

/// Token counters reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}
