//! Mock implementations for testing
//!
//! These mocks enable orchestrator and runtime tests without real I/O.

use crate::llm::{ChatCompletion, ChatMessage, ChatTransport, ConversationRequest, LlmError, Usage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Completion carrying a single assistant message
pub fn completion(text: &str) -> ChatCompletion {
    ChatCompletion {
        messages: vec![ChatMessage::assistant(text)],
        usage: None,
    }
}

pub fn completion_with_usage(text: &str, prompt: u64, completion_tokens: u64) -> ChatCompletion {
    ChatCompletion {
        messages: vec![ChatMessage::assistant(text)],
        usage: Some(Usage {
            prompt_tokens: prompt,
            completion_tokens,
            total_tokens: prompt + completion_tokens,
        }),
    }
}

// ============================================================================
// Mock Transport
// ============================================================================

/// Mock transport that returns queued responses
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<ChatCompletion, LlmError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ConversationRequest>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: ChatCompletion) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a plain assistant reply
    pub fn queue_text(&self, text: &str) {
        self.queue_response(completion(text));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<ConversationRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<ChatCompletion, LlmError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send(&self, request: &ConversationRequest) -> Result<ChatCompletion, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_response()
    }
}

// ============================================================================
// Delayed Mock Transport (for timeout and cancellation testing)
// ============================================================================

/// Mock transport with configurable delay
pub struct DelayedMockTransport {
    inner: MockTransport,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockTransport {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockTransport::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_text(&self, text: &str) {
        self.inner.queue_text(text);
    }

    pub fn recorded_requests(&self) -> Vec<ConversationRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl ChatTransport for DelayedMockTransport {
    async fn send(&self, request: &ConversationRequest) -> Result<ChatCompletion, LlmError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.next_response()
    }
}

// ============================================================================
// Runtime tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationConfig;
    use crate::llm::all_models;
    use crate::runtime::{RuntimeError, SessionManager, SettingsUpdate};
    use crate::transcript::{MessageKind, SessionEvent};

    fn manager(transport: Arc<dyn ChatTransport>) -> SessionManager {
        SessionManager::new(transport, all_models().to_vec(), ConversationConfig::default())
    }

    /// Wait until the session reports `TurnFinished`
    async fn wait_turn_finished(rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>) {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("Timeout waiting for turn")
                .expect("Channel closed");
            if matches!(event, SessionEvent::TurnFinished) {
                return;
            }
        }
    }

    #[tokio::test]
    async fn test_turn_runs_through_queue() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_text(r#"{"type":"chat","content":"Привет!"}"#);
        let sessions = manager(transport.clone());

        let handle = sessions.create_session().await.unwrap();
        let mut rx = handle.subscribe();

        assert!(handle.send_message("привет").await.unwrap());
        wait_turn_finished(&mut rx).await;

        let messages = handle.snapshot();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text, "Привет!");
        assert_eq!(transport.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_message_is_not_queued() {
        let transport = Arc::new(MockTransport::new());
        let sessions = manager(transport.clone());
        let handle = sessions.create_session().await.unwrap();

        assert!(!handle.send_message("   \n").await.unwrap());
        assert!(handle.snapshot().is_empty());
        assert!(transport.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_rapid_sends_do_not_interleave() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_text("первый ответ");
        transport.queue_text("второй ответ");
        let sessions = manager(transport.clone());
        let handle = sessions.create_session().await.unwrap();
        let mut rx = handle.subscribe();

        handle.send_message("один").await.unwrap();
        handle.send_message("два").await.unwrap();
        wait_turn_finished(&mut rx).await;
        wait_turn_finished(&mut rx).await;

        let texts: Vec<_> = handle.snapshot().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["один", "первый ответ", "два", "второй ответ"]);

        // The second turn replays the whole first turn
        let requests = transport.recorded_requests();
        assert_eq!(requests[1].messages.len(), 4);
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_turn() {
        let transport = Arc::new(DelayedMockTransport::new(Duration::from_secs(10)));
        transport.queue_text("никогда");
        let started = transport.request_started.clone();
        let sessions = manager(transport.clone());
        let handle = sessions.create_session().await.unwrap();
        let mut rx = handle.subscribe();

        handle.send_message("привет").await.unwrap();
        started.notified().await;
        handle.cancel();
        wait_turn_finished(&mut rx).await;

        let messages = handle.snapshot();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].kind, MessageKind::Error);
        assert!(!handle.status().busy);
    }

    #[tokio::test]
    async fn test_new_chat_clears_transcript() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_text("ok");
        let sessions = manager(transport);
        let handle = sessions.create_session().await.unwrap();
        let mut rx = handle.subscribe();

        handle.send_message("да").await.unwrap();
        wait_turn_finished(&mut rx).await;
        assert!(handle.status().interview.is_active());

        handle.new_chat().await.unwrap();
        loop {
            if matches!(rx.recv().await.unwrap(), SessionEvent::Cleared) {
                break;
            }
        }
        assert!(handle.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_update_settings_round_trip() {
        let sessions = manager(Arc::new(MockTransport::new()));
        let handle = sessions.create_session().await.unwrap();

        let settings = handle
            .update_settings(SettingsUpdate {
                model: Some("GPT OSS 120B".into()),
                temperature: Some(0.5),
                chain_of_thought: Some(true),
            })
            .await
            .unwrap();
        assert_eq!(settings.model.display_name, "GPT OSS 120B");
        assert!((settings.temperature - 0.5).abs() < f32::EPSILON);
        assert!(settings.chain_of_thought);
        assert_eq!(handle.status().settings, settings);

        let err = handle
            .update_settings(SettingsUpdate {
                temperature: Some(0.7),
                ..SettingsUpdate::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Settings(_)));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_text("ok");
        let sessions = manager(transport);
        let first = sessions.create_session().await.unwrap();
        let second = sessions.create_session().await.unwrap();
        let mut rx = first.subscribe();

        first.send_message("привет").await.unwrap();
        wait_turn_finished(&mut rx).await;

        assert_eq!(first.snapshot().len(), 2);
        assert!(second.snapshot().is_empty());
        assert!(sessions.get(first.id()).await.is_some());
        assert!(sessions.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_remove_stops_runtime() {
        let transport = Arc::new(DelayedMockTransport::new(Duration::from_secs(10)));
        transport.queue_text("никогда");
        transport.queue_text("тоже никогда");
        let started = transport.request_started.clone();
        let sessions = manager(transport.clone());
        let handle = sessions.create_session().await.unwrap();
        let mut status = handle.status.clone();

        handle.send_message("привет").await.unwrap();
        handle.send_message("ещё раз").await.unwrap();
        started.notified().await;

        assert!(sessions.remove(handle.id()).await);
        assert!(sessions.get(handle.id()).await.is_none());

        // The status sender is dropped when the runtime task ends
        tokio::time::timeout(Duration::from_secs(5), async {
            while status.changed().await.is_ok() {}
        })
        .await
        .expect("Runtime still running after removal");

        // In-flight turn cancelled, queued turn dropped
        assert_eq!(transport.recorded_requests().len(), 1);
        assert!(matches!(
            handle.send_message("снова").await,
            Err(RuntimeError::Closed)
        ));
        assert!(!sessions.remove(handle.id()).await);
    }

    #[test]
    fn test_settings_update_accepts_both_spellings() {
        let snake: SettingsUpdate =
            serde_json::from_str(r#"{"chain_of_thought": true, "model": "GPT OSS 120B"}"#).unwrap();
        assert_eq!(snake.chain_of_thought, Some(true));
        assert_eq!(snake.model.as_deref(), Some("GPT OSS 120B"));

        let camel: SettingsUpdate = serde_json::from_str(r#"{"chainOfThought": false}"#).unwrap();
        assert_eq!(camel.chain_of_thought, Some(false));
    }
}
