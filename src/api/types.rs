//! API request and response types

use crate::conversation::SessionSettings;
use crate::llm::ModelSpec;
use crate::transcript::DisplayMessage;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Response for a newly created session
#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
}

/// Full session snapshot
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub messages: Vec<DisplayMessage>,
    pub settings: SessionSettings,
    pub interview_active: bool,
    pub busy: bool,
}

/// Response for send action
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub queued: bool,
}

/// Response for cancel action
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub ok: bool,
    /// Whether a turn was actually in flight
    pub cancelled: bool,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Response with available models
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelSpec>,
    pub default: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
