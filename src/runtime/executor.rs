//! Session runtime executor

use super::{SessionCommand, SessionStatus, SettingsUpdate, TurnSlot};
use crate::conversation::{Orchestrator, SessionSettings, SettingsError, TurnOutcome};
use crate::llm::{find_by_name, ChatTransport};
use crate::transcript::SessionEvent;
use std::sync::PoisonError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Drains one session's command queue, one command at a time
pub struct SessionRuntime<T: ChatTransport> {
    session_id: String,
    orchestrator: Orchestrator<T>,
    commands: mpsc::Receiver<SessionCommand>,
    status: watch::Sender<SessionStatus>,
    events: broadcast::Sender<SessionEvent>,
    current_turn: TurnSlot,
    shutdown: CancellationToken,
}

impl<T: ChatTransport + 'static> SessionRuntime<T> {
    pub(super) fn new(
        session_id: String,
        orchestrator: Orchestrator<T>,
        commands: mpsc::Receiver<SessionCommand>,
        status: watch::Sender<SessionStatus>,
        current_turn: TurnSlot,
        shutdown: CancellationToken,
    ) -> Self {
        let events = orchestrator.events();
        Self {
            session_id,
            orchestrator,
            commands,
            status,
            events,
            current_turn,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "Starting session runtime");

        loop {
            let command = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                command = self.commands.recv() => command,
            };
            // None once every handle is dropped
            let Some(command) = command else {
                break;
            };
            self.handle(command).await;
        }

        tracing::info!(session_id = %self.session_id, "Session runtime stopped");
    }

    async fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SendMessage { text } => self.run_turn(&text).await,
            SessionCommand::NewChat => {
                tracing::info!(session_id = %self.session_id, "Starting new chat");
                self.orchestrator.new_chat();
                self.publish_status(false);
            }
            SessionCommand::UpdateSettings { update, reply } => {
                let result = self.apply_settings(&update);
                if let Err(e) = &result {
                    tracing::warn!(session_id = %self.session_id, error = %e, "Settings update rejected");
                }
                self.publish_status(false);
                // Caller may have given up waiting
                let _ = reply.send(result);
            }
        }
    }

    async fn run_turn(&mut self, text: &str) {
        let cancel = self.shutdown.child_token();
        *self
            .current_turn
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(cancel.clone());

        self.publish_status(true);
        let _ = self.events.send(SessionEvent::TurnStarted);

        let outcome = self.orchestrator.send_message(text, &cancel).await;
        tracing::debug!(
            session_id = %self.session_id,
            ?outcome,
            messages = self.orchestrator.transcript().len(),
            "Turn finished"
        );
        if outcome == TurnOutcome::Failed && cancel.is_cancelled() {
            tracing::info!(session_id = %self.session_id, "Turn was cancelled");
        }

        self.current_turn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        self.publish_status(false);
        let _ = self.events.send(SessionEvent::TurnFinished);
    }

    /// All-or-nothing: an explicit temperature is checked against the model
    /// being selected before anything changes
    fn apply_settings(&mut self, update: &SettingsUpdate) -> Result<SessionSettings, SettingsError> {
        if let Some(temperature) = update.temperature {
            let target = match update.model.as_deref() {
                Some(name) => find_by_name(self.orchestrator.catalog(), name)
                    .ok_or_else(|| SettingsError::UnknownModel(name.to_string()))?,
                None => &self.orchestrator.settings().model,
            };
            if !target.allows_temperature(temperature) {
                return Err(SettingsError::TemperatureNotAllowed {
                    temperature,
                    model: target.display_name.to_string(),
                });
            }
        }

        if let Some(model) = update.model.as_deref() {
            self.orchestrator.select_model(model)?;
        }
        if let Some(temperature) = update.temperature {
            self.orchestrator.set_temperature(temperature)?;
        }
        if let Some(enabled) = update.chain_of_thought {
            self.orchestrator.set_chain_of_thought(enabled);
        }
        Ok(self.orchestrator.settings().clone())
    }

    fn publish_status(&self, busy: bool) {
        self.status.send_replace(SessionStatus {
            settings: self.orchestrator.settings().clone(),
            interview: self.orchestrator.interview_state(),
            busy,
        });
    }
}
