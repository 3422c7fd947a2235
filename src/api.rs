//! HTTP API for parley
//!
//! JSON endpoints plus a per-session SSE stream over the session manager.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    /// Configured default model name, if any
    pub default_model: Option<String>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionManager>, default_model: Option<String>) -> Self {
        Self {
            sessions,
            default_model,
        }
    }
}
