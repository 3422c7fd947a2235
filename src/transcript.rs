//! Conversation transcript
//!
//! Append-only sequence of display records. The orchestrator is the only
//! writer; renderers read through [`TranscriptReader`] snapshots or
//! subscribe to [`SessionEvent`] notifications.

use crate::llm::{ChatMessage, Usage};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Who a display record is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayRole {
    User,
    Assistant,
}

/// Record category. Model-supplied payload types that are not one of the
/// built-in kinds are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum MessageKind {
    User,
    System,
    StoryPlan,
    Story,
    Error,
    Assistant,
    Other(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::User => "user",
            MessageKind::System => "system",
            MessageKind::StoryPlan => "story_plan",
            MessageKind::Story => "story",
            MessageKind::Error => "error",
            MessageKind::Assistant => "assistant",
            MessageKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for MessageKind {
    fn from(kind: &str) -> Self {
        match kind {
            "user" => MessageKind::User,
            "system" => MessageKind::System,
            "story_plan" => MessageKind::StoryPlan,
            "story" => MessageKind::Story,
            "error" => MessageKind::Error,
            "assistant" => MessageKind::Assistant,
            other => MessageKind::Other(other.to_string()),
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One rendered transcript entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMessage {
    pub role: DisplayRole,
    pub kind: MessageKind,
    pub text: String,
    pub language: Option<String>,
    /// Local wall-clock time of creation, `HH:MM`
    pub timestamp: Option<String>,
    pub confidence: Option<f64>,
    pub latency_ms: Option<u64>,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
    pub model_name: Option<String>,
}

impl DisplayMessage {
    fn new(role: DisplayRole, kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            role,
            kind,
            text: text.into(),
            language: None,
            timestamp: Some(local_timestamp()),
            confidence: None,
            latency_ms: None,
            prompt_tokens: None,
            completion_tokens: None,
            total_tokens: None,
            model_name: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(DisplayRole::User, MessageKind::User, text)
    }

    pub fn assistant(kind: MessageKind, text: impl Into<String>) -> Self {
        Self::new(DisplayRole::Assistant, kind, text)
    }

    /// Informational notice produced by the orchestrator itself
    pub fn system_notice(text: impl Into<String>) -> Self {
        Self::new(DisplayRole::Assistant, MessageKind::System, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(DisplayRole::Assistant, MessageKind::Error, text)
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    /// Confidence is clamped into `[0, 1]`; non-finite values are dropped
    pub fn with_confidence(mut self, confidence: Option<f64>) -> Self {
        self.confidence = confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency_ms = Some(u64::try_from(latency.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_usage(mut self, usage: Option<Usage>) -> Self {
        if let Some(usage) = usage {
            self.prompt_tokens = Some(usage.prompt_tokens);
            self.completion_tokens = Some(usage.completion_tokens);
            self.total_tokens = Some(usage.total_tokens);
        }
        self
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Replay form sent back to the model as history
    pub fn to_chat_message(&self) -> ChatMessage {
        match self.role {
            DisplayRole::User => ChatMessage::user(self.text.clone()),
            DisplayRole::Assistant => ChatMessage::assistant(self.text.clone()),
        }
    }
}

fn local_timestamp() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

/// Change notifications for one session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A record was appended at the tail
    Appended(DisplayMessage),
    /// The transcript was cleared by "new chat"
    Cleared,
    TurnStarted,
    TurnFinished,
}

type Entries = Arc<RwLock<Vec<DisplayMessage>>>;

/// Writer side of the transcript
pub struct Transcript {
    entries: Entries,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            events,
        }
    }

    /// Append one record at the tail and notify subscribers
    pub fn append(&self, message: DisplayMessage) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        // No subscribers is fine
        let _ = self.events.send(SessionEvent::Appended(message));
    }

    /// Drop every record ("new chat")
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        let _ = self.events.send(SessionEvent::Cleared);
    }

    /// Whole transcript in replay form
    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(DisplayMessage::to_chat_message)
            .collect()
    }

    /// Sender shared with the session runtime for turn lifecycle events
    pub fn events(&self) -> broadcast::Sender<SessionEvent> {
        self.events.clone()
    }

    pub fn reader(&self) -> TranscriptReader {
        TranscriptReader {
            entries: self.entries.clone(),
            events: self.events.clone(),
        }
    }
}

/// Read-only handle for renderers
#[derive(Clone)]
pub struct TranscriptReader {
    entries: Entries,
    events: broadcast::Sender<SessionEvent>,
}

impl TranscriptReader {
    pub fn snapshot(&self) -> Vec<DisplayMessage> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
