//! Regular chat turn

use super::{Orchestrator, Stage, TurnError};
use crate::llm::{ChatMessage, ChatTransport};
use crate::parser::parse_reply;
use crate::system_prompt::build_chat_prompt;
use tokio_util::sync::CancellationToken;

impl<T: ChatTransport> Orchestrator<T> {
    /// Replay the whole visible history plus the processed input and append
    /// the parsed reply.
    pub(super) async fn run_chat(
        &mut self,
        input: &str,
        history: Vec<ChatMessage>,
        cancel: &CancellationToken,
    ) -> Result<(), TurnError> {
        let interview = self.interview.track(input);
        let prompt = build_chat_prompt(self.settings.chain_of_thought, interview.is_active());

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(prompt));
        messages.extend(history);
        messages.push(ChatMessage::user(input));

        let model = self.settings.model.clone();
        let temperature = self.settings.temperature;
        let (completion, latency) = self
            .call(Stage::Chat, &model, messages, temperature, cancel)
            .await?;

        let reply = parse_reply(&completion.text())
            .with_latency(latency)
            .with_usage(completion.usage)
            .with_model(model.display_name);
        self.transcript.append(reply);
        Ok(())
    }
}
