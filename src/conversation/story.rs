//! Two-stage story pipeline: planner, then writer

use super::{Orchestrator, Stage, TurnError};
use crate::llm::{find_by_prefix, ChatMessage, ChatTransport, ModelSpec};
use crate::parser::decode_story_plan;
use crate::system_prompt::AgentRole;
use crate::transcript::{DisplayMessage, MessageKind};
use tokio_util::sync::CancellationToken;

const PLANNER_MODEL_PREFIX: &str = "Qwen3";
const WRITER_MODEL_PREFIX: &str = "GPT OSS";

impl<T: ChatTransport> Orchestrator<T> {
    /// First catalog entry whose name starts with `prefix`, else the
    /// currently selected model
    fn model_for_role(&self, prefix: &str) -> ModelSpec {
        find_by_prefix(&self.catalog, prefix)
            .unwrap_or(&self.settings.model)
            .clone()
    }

    pub(super) async fn run_story(
        &mut self,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<(), TurnError> {
        let planner = self.model_for_role(PLANNER_MODEL_PREFIX);
        let writer = self.model_for_role(WRITER_MODEL_PREFIX);
        let temperature = self.settings.temperature;

        let messages = vec![
            ChatMessage::system(AgentRole::Planner.system_prompt()),
            ChatMessage::user(input),
        ];
        let (planned, _) = self
            .call(
                Stage::Planner,
                &planner,
                messages,
                planner.coerce_temperature(temperature),
                cancel,
            )
            .await?;

        let raw_plan = planned.text();
        let plan = decode_story_plan(&raw_plan).map_err(TurnError::InvalidPlan)?;
        tracing::debug!(title = %plan.title, points = plan.plot_points.len(), "Story plan ready");

        self.transcript.append(
            DisplayMessage::assistant(MessageKind::StoryPlan, plan.summary())
                .with_usage(planned.usage)
                .with_model(planner.display_name),
        );

        // The writer consumes the planner's JSON, not the prose summary
        let messages = vec![
            ChatMessage::system(AgentRole::Writer.system_prompt()),
            ChatMessage::user(raw_plan),
        ];
        let (written, latency) = self
            .call(
                Stage::Writer,
                &writer,
                messages,
                writer.coerce_temperature(temperature),
                cancel,
            )
            .await?;

        self.transcript.append(
            DisplayMessage::assistant(MessageKind::Story, written.text())
                .with_latency(latency)
                .with_usage(written.usage)
                .with_model(writer.display_name),
        );
        Ok(())
    }
}
