//! Structured model reply decoding
//!
//! Models are prompted to answer with a single JSON object but may not.
//! Decoding returns a tagged result; callers decide the fallback.

use crate::transcript::{DisplayMessage, MessageKind};
use serde::{de::DeserializeOwned, Deserialize};
use std::fmt::Write;
use thiserror::Error;

/// Envelope requested for ordinary turns
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Planner output consumed by the writer stage
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoryPlan {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub title: String,
    #[serde(alias = "plotPoints")]
    pub plot_points: Vec<String>,
}

impl StoryPlan {
    /// Human-readable plan: title line, then numbered plot points
    pub fn summary(&self) -> String {
        let mut text = format!("План рассказа: {}", self.title);
        for (i, point) in self.plot_points.iter().enumerate() {
            let _ = write!(text, "\n{}. {}", i + 1, point);
        }
        text
    }
}

/// Reply did not match the requested schema
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct SchemaError {
    pub reason: String,
    /// The reply exactly as received
    pub raw: String,
}

pub fn decode_payload(raw: &str) -> Result<AgentPayload, SchemaError> {
    decode(raw)
}

pub fn decode_story_plan(raw: &str) -> Result<StoryPlan, SchemaError> {
    decode(raw)
}

/// Decode a reply into a display record, falling back to the raw text as
/// a plain assistant message when it is not a valid payload.
pub fn parse_reply(raw: &str) -> DisplayMessage {
    match decode_payload(raw) {
        Ok(payload) => {
            DisplayMessage::assistant(MessageKind::from(payload.kind.as_str()), payload.content)
                .with_language(payload.language)
                .with_confidence(payload.confidence)
        }
        Err(e) => {
            tracing::debug!(reason = %e.reason, "Reply is not a structured payload");
            DisplayMessage::assistant(MessageKind::Assistant, raw)
        }
    }
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, SchemaError> {
    let body = unwrap_fenced(raw);
    // serde accepts positional arrays for structs; only objects count here
    if !body.starts_with('{') {
        return Err(SchemaError {
            reason: "ожидался JSON-объект".to_string(),
            raw: raw.to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| SchemaError {
        reason: e.to_string(),
        raw: raw.to_string(),
    })
}

/// Strip a surrounding Markdown code fence (with optional language tag)
fn unwrap_fenced(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    match body.split_once('\n') {
        Some((_tag, inner)) => inner.trim(),
        None => body.trim(),
    }
}
