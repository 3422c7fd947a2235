//! Session runtime
//!
//! Each session runs one [`SessionRuntime`] task that drains a command
//! queue, so turns for the same session never overlap. Handles enqueue
//! commands, read transcript snapshots and cancel the in-flight turn.
//! Removing a session from the [`SessionManager`] shuts its task down.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::conversation::{ConversationConfig, Orchestrator, SessionSettings, SettingsError};
use crate::interview::InterviewState;
use crate::llm::{ChatTransport, ModelSpec};
use crate::transcript::{DisplayMessage, SessionEvent, TranscriptReader};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};
use tokio_util::sync::CancellationToken;

const COMMAND_QUEUE_CAPACITY: usize = 32;

/// Work queued for a session
#[derive(Debug)]
pub enum SessionCommand {
    SendMessage {
        text: String,
    },
    NewChat,
    UpdateSettings {
        update: SettingsUpdate,
        reply: oneshot::Sender<Result<SessionSettings, SettingsError>>,
    },
}

/// Partial settings change; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    #[serde(alias = "chainOfThought")]
    pub chain_of_thought: Option<bool>,
}

/// Latest observable session state, published after every command
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub settings: SessionSettings,
    pub interview: InterviewState,
    /// A turn is in flight
    pub busy: bool,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Session runtime has stopped")]
    Closed,
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Token of the turn currently in flight, if any
type TurnSlot = Arc<Mutex<Option<CancellationToken>>>;

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    commands: mpsc::Sender<SessionCommand>,
    transcript: TranscriptReader,
    status: watch::Receiver<SessionStatus>,
    current_turn: TurnSlot,
    /// Parent of every turn token; cancelled when the session is removed
    shutdown: CancellationToken,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a turn. Blank input is dropped here and reported as `false`.
    pub async fn send_message(&self, text: &str) -> Result<bool, RuntimeError> {
        if text.trim().is_empty() {
            return Ok(false);
        }
        self.enqueue(SessionCommand::SendMessage {
            text: text.to_string(),
        })
        .await?;
        Ok(true)
    }

    pub async fn new_chat(&self) -> Result<(), RuntimeError> {
        self.enqueue(SessionCommand::NewChat).await
    }

    /// Apply a settings change after any queued turns and return the result
    pub async fn update_settings(
        &self,
        update: SettingsUpdate,
    ) -> Result<SessionSettings, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.enqueue(SessionCommand::UpdateSettings { update, reply })
            .await?;
        Ok(rx.await.map_err(|_| RuntimeError::Closed)??)
    }

    /// Cancel the in-flight turn. Queued commands still run.
    pub fn cancel(&self) -> bool {
        let token = self
            .current_turn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match token {
            Some(token) => {
                tracing::info!(session_id = %self.id, "Cancelling in-flight turn");
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<DisplayMessage> {
        self.transcript.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.transcript.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    async fn enqueue(&self, command: SessionCommand) -> Result<(), RuntimeError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RuntimeError::Closed)
    }
}

/// Manager for all session runtimes
pub struct SessionManager {
    transport: Arc<dyn ChatTransport>,
    catalog: Vec<ModelSpec>,
    config: ConversationConfig,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        catalog: Vec<ModelSpec>,
        config: ConversationConfig,
    ) -> Self {
        Self {
            transport,
            catalog,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &[ModelSpec] {
        &self.catalog
    }

    /// Start a fresh session and its runtime task
    pub async fn create_session(&self) -> Result<SessionHandle, RuntimeError> {
        let orchestrator = Orchestrator::new(
            self.transport.clone(),
            self.catalog.clone(),
            self.config.clone(),
        )?;

        let id = uuid::Uuid::new_v4().to_string();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (status_tx, status_rx) = watch::channel(SessionStatus {
            settings: orchestrator.settings().clone(),
            interview: orchestrator.interview_state(),
            busy: false,
        });
        let current_turn = TurnSlot::default();
        let shutdown = CancellationToken::new();

        let handle = SessionHandle {
            id: id.clone(),
            commands: command_tx,
            transcript: orchestrator.transcript(),
            status: status_rx,
            current_turn: current_turn.clone(),
            shutdown: shutdown.clone(),
        };

        let runtime = SessionRuntime::new(
            id.clone(),
            orchestrator,
            command_rx,
            status_tx,
            current_turn,
            shutdown,
        );
        tokio::spawn(runtime.run());

        self.sessions.write().await.insert(id.clone(), handle.clone());
        tracing::info!(session_id = %id, "Session created");
        Ok(handle)
    }

    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Forget a session and stop its runtime. The in-flight turn is
    /// cancelled and queued commands are dropped; outstanding handles
    /// start failing with [`RuntimeError::Closed`].
    pub async fn remove(&self, id: &str) -> bool {
        let Some(handle) = self.sessions.write().await.remove(id) else {
            return false;
        };
        handle.cancel();
        handle.shutdown.cancel();
        tracing::info!(session_id = %id, "Session removed");
        true
    }
}
