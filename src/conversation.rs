//! Conversation orchestration
//!
//! One [`Orchestrator`] owns a session: its transcript, settings and
//! interview flag. A turn appends the user record immediately, then
//! optionally summarizes over-long input, then routes to either the story
//! pipeline or regular chat. Every model call is sequential, bounded by a
//! timeout and raced against the turn's cancellation token.

mod chat;
mod error;
mod story;


pub use error::{SettingsError, Stage, TurnError};

use crate::interview::{InterviewState, InterviewTracker};
use crate::llm::{ChatCompletion, ChatMessage, ChatTransport, ConversationRequest, ModelSpec};
use crate::system_prompt::AgentRole;
use crate::transcript::{DisplayMessage, Transcript, TranscriptReader};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Case-folded prefix that routes a turn to the story pipeline
const STORY_PREFIX: &str = "напиши рассказ о";

/// Orchestrator tunables
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Input budget in tokens before the summarizer kicks in
    pub max_input_tokens: usize,
    /// Approximate characters per token
    pub chars_per_token: usize,
    /// Upper bound on a single model call
    pub call_timeout: Duration,
    pub chain_of_thought: bool,
    /// Display name of the initially selected model
    pub default_model: Option<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_input_tokens: 1000,
            chars_per_token: 4,
            call_timeout: Duration::from_secs(30),
            chain_of_thought: false,
            default_model: None,
        }
    }
}

impl ConversationConfig {
    pub fn max_input_chars(&self) -> usize {
        self.max_input_tokens.saturating_mul(self.chars_per_token)
    }
}

/// Per-session user choices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSettings {
    pub model: ModelSpec,
    pub temperature: f32,
    pub chain_of_thought: bool,
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing appended, no call made
    Ignored,
    Completed,
    /// A fatal failure was recorded as one error entry
    Failed,
}

pub struct Orchestrator<T: ChatTransport> {
    transport: T,
    catalog: Vec<ModelSpec>,
    config: ConversationConfig,
    settings: SessionSettings,
    interview: InterviewTracker,
    transcript: Transcript,
}

impl<T: ChatTransport> Orchestrator<T> {
    pub fn new(
        transport: T,
        catalog: Vec<ModelSpec>,
        config: ConversationConfig,
    ) -> Result<Self, SettingsError> {
        let model = match config.default_model.as_deref() {
            Some(name) => crate::llm::find_by_name(&catalog, name)
                .ok_or_else(|| SettingsError::UnknownModel(name.to_string()))?,
            None => catalog.first().ok_or(SettingsError::EmptyCatalog)?,
        }
        .clone();

        let settings = SessionSettings {
            temperature: model.default_temperature(),
            chain_of_thought: config.chain_of_thought,
            model,
        };

        Ok(Self {
            transport,
            catalog,
            config,
            settings,
            interview: InterviewTracker::new(),
            transcript: Transcript::new(),
        })
    }

    /// Run one turn for `utterance`.
    ///
    /// Blank input is ignored. Otherwise the user record is appended before
    /// any network call, and a fatal failure is recorded as exactly one
    /// `error` entry without touching earlier records.
    pub async fn send_message(&mut self, utterance: &str, cancel: &CancellationToken) -> TurnOutcome {
        if utterance.trim().is_empty() {
            return TurnOutcome::Ignored;
        }

        let history = self.transcript.chat_history();
        self.transcript.append(DisplayMessage::user(utterance));

        match self.run_turn(utterance, history, cancel).await {
            Ok(()) => TurnOutcome::Completed,
            Err(e) => {
                tracing::warn!(stage = ?e.stage(), error = %e, "Turn failed");
                self.transcript.append(DisplayMessage::error(format!("Ошибка: {e}")));
                TurnOutcome::Failed
            }
        }
    }

    async fn run_turn(
        &mut self,
        utterance: &str,
        history: Vec<ChatMessage>,
        cancel: &CancellationToken,
    ) -> Result<(), TurnError> {
        let input = self.triage(utterance, cancel).await?;

        if is_story_request(&input) {
            tracing::info!("Routing turn to story pipeline");
            self.run_story(&input, cancel).await
        } else {
            self.run_chat(&input, history, cancel).await
        }
    }

    /// Replace over-long input with a deterministic summary
    async fn triage(&self, utterance: &str, cancel: &CancellationToken) -> Result<String, TurnError> {
        let length = utterance.chars().count();
        let limit = self.config.max_input_chars();
        if length <= limit {
            return Ok(utterance.to_string());
        }

        tracing::info!(length, limit, "Input exceeds limit, summarizing");
        self.transcript.append(DisplayMessage::system_notice(format!(
            "Сообщение слишком длинное ({length} символов при лимите {limit}), сокращаю его перед отправкой."
        )));

        let model = self.settings.model.clone();
        let messages = vec![
            ChatMessage::system(AgentRole::Summarizer.system_prompt()),
            ChatMessage::user(utterance),
        ];
        let (completion, _) = self
            .call(Stage::Summarizer, &model, messages, model.coerce_temperature(0.0), cancel)
            .await?;

        let summary = completion.text();
        if summary.trim().is_empty() {
            tracing::warn!("Summarizer returned nothing, truncating input instead");
            return Ok(utterance.chars().take(limit).collect());
        }
        Ok(summary.trim().to_string())
    }

    /// Issue one model call bounded by the call timeout and the turn's
    /// cancellation token. Returns the completion and its wall-clock latency.
    async fn call(
        &self,
        stage: Stage,
        model: &ModelSpec,
        messages: Vec<ChatMessage>,
        temperature: f32,
        cancel: &CancellationToken,
    ) -> Result<(ChatCompletion, Duration), TurnError> {
        let request = ConversationRequest::new(model.endpoint_id, messages).with_temperature(temperature);
        let after = self.config.call_timeout;

        tracing::debug!(?stage, model = %model.display_name, temperature, "Calling model");
        let start = Instant::now();

        let result = tokio::select! {
            biased;

            () = cancel.cancelled() => return Err(TurnError::Cancelled { stage }),

            result = tokio::time::timeout(after, self.transport.send(&request)) => result,
        };

        let completion = result
            .map_err(|_| TurnError::Timeout { stage, after })?
            .map_err(|source| TurnError::Transport { stage, source })?;

        Ok((completion, start.elapsed()))
    }

    // ============================================================
    // Session state
    // ============================================================

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &[ModelSpec] {
        &self.catalog
    }

    /// Switch model, coercing the temperature if the new model disallows it
    pub fn select_model(&mut self, name: &str) -> Result<(), SettingsError> {
        let model = crate::llm::find_by_name(&self.catalog, name)
            .ok_or_else(|| SettingsError::UnknownModel(name.to_string()))?
            .clone();
        self.settings.temperature = model.coerce_temperature(self.settings.temperature);
        self.settings.model = model;
        Ok(())
    }

    pub fn set_temperature(&mut self, temperature: f32) -> Result<(), SettingsError> {
        if !self.settings.model.allows_temperature(temperature) {
            return Err(SettingsError::TemperatureNotAllowed {
                temperature,
                model: self.settings.model.display_name.to_string(),
            });
        }
        self.settings.temperature = temperature;
        Ok(())
    }

    pub fn set_chain_of_thought(&mut self, enabled: bool) {
        self.settings.chain_of_thought = enabled;
    }

    pub fn interview_state(&self) -> InterviewState {
        self.interview.state()
    }

    /// Clear the transcript and end any interview
    pub fn new_chat(&mut self) {
        self.transcript.clear();
        self.interview.reset();
    }

    pub fn transcript(&self) -> TranscriptReader {
        self.transcript.reader()
    }

    pub fn events(&self) -> tokio::sync::broadcast::Sender<crate::transcript::SessionEvent> {
        self.transcript.events()
    }
}

/// Story requests start with the story prefix, ignoring case and leading
/// whitespace
pub fn is_story_request(input: &str) -> bool {
    input.trim_start().to_lowercase().starts_with(STORY_PREFIX)
}
