//! Turn and settings error types

use crate::llm::LlmError;
use crate::parser::SchemaError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Model call within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Summarizer,
    Planner,
    Writer,
    Chat,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Summarizer => "суммаризатор",
            Stage::Planner => "планировщик",
            Stage::Writer => "писатель",
            Stage::Chat => "чат",
        };
        f.write_str(name)
    }
}

/// Failure that terminates the current turn
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("запрос к модели ({stage}) завершился ошибкой: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: LlmError,
    },
    #[error("модель ({stage}) не ответила за {} с", .after.as_secs())]
    Timeout { stage: Stage, after: Duration },
    #[error("запрос к модели ({stage}) отменён")]
    Cancelled { stage: Stage },
    #[error("план рассказа не соответствует схеме ({}). Ответ планировщика: {}", .0.reason, .0.raw)]
    InvalidPlan(SchemaError),
}

impl TurnError {
    pub fn stage(&self) -> Stage {
        match self {
            TurnError::Transport { stage, .. }
            | TurnError::Timeout { stage, .. }
            | TurnError::Cancelled { stage } => *stage,
            TurnError::InvalidPlan(_) => Stage::Planner,
        }
    }
}

/// Rejected settings change
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SettingsError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    #[error("Temperature {temperature} is not allowed for {model}")]
    TemperatureNotAllowed { temperature: f32, model: String },
    #[error("Model catalog is empty")]
    EmptyCatalog,
}
