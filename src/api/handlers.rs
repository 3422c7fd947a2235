//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    CancelResponse, ErrorResponse, MessageRequest, MessageResponse, ModelsResponse,
    SessionCreatedResponse, SessionResponse, SuccessResponse,
};
use super::AppState;
use crate::conversation::SessionSettings;
use crate::runtime::{RuntimeError, SessionHandle, SettingsUpdate};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // User actions
        .route("/api/sessions/:id/messages", post(send_message))
        .route("/api/sessions/:id/cancel", post(cancel_turn))
        .route("/api/sessions/:id/reset", post(reset_session))
        .route("/api/sessions/:id/settings", patch(update_settings))
        // Model info
        .route("/api/models", get(list_models))
        .with_state(state)
}

async fn session(state: &AppState, id: &str) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

// ============================================================
// Session lifecycle
// ============================================================

async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<SessionCreatedResponse>, AppError> {
    let handle = state.sessions.create_session().await?;
    Ok(Json(SessionCreatedResponse {
        session_id: handle.id().to_string(),
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = session(&state, &id).await?;
    let status = handle.status();

    Ok(Json(SessionResponse {
        session_id: id,
        messages: handle.snapshot(),
        settings: status.settings,
        interview_active: status.interview.is_active(),
        busy: status.busy,
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.sessions.remove(&id).await {
        return Err(AppError::NotFound(format!("Session not found: {id}")));
    }
    Ok(Json(SuccessResponse { success: true }))
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = session(&state, &id).await?;

    // Subscribe before the snapshot so nothing falls in between
    let broadcast_rx = handle.subscribe();
    let status = handle.status();
    let init = json!({
        "type": "init",
        "session_id": id,
        "messages": handle.snapshot(),
        "settings": status.settings,
        "interview_active": status.interview.is_active(),
        "busy": status.busy,
    });

    Ok(sse_stream(init, broadcast_rx))
}

// ============================================================
// User actions
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let handle = session(&state, &id).await?;
    let queued = handle.send_message(&req.text).await?;
    Ok(Json(MessageResponse { queued }))
}

async fn cancel_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, AppError> {
    let handle = session(&state, &id).await?;
    let cancelled = handle.cancel();
    Ok(Json(CancelResponse {
        ok: true,
        cancelled,
    }))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let handle = session(&state, &id).await?;
    handle.new_chat().await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn update_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SessionSettings>, AppError> {
    let handle = session(&state, &id).await?;
    let settings = handle.update_settings(update).await?;
    Ok(Json(settings))
}

// ============================================================
// Model info
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = state.sessions.catalog().to_vec();
    let default = state
        .default_model
        .clone()
        .or_else(|| models.first().map(|m| m.display_name.to_string()))
        .unwrap_or_default();

    Json(ModelsResponse { models, default })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
pub(super) enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::Settings(e) => AppError::BadRequest(e.to_string()),
            closed @ RuntimeError::Closed => AppError::Internal(closed.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ConversationConfig, SettingsError};
    use crate::llm::all_models;
    use crate::runtime::testing::MockTransport;
    use crate::runtime::SessionManager;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(
            Arc::new(SessionManager::new(
                Arc::new(MockTransport::new()),
                all_models().to_vec(),
                ConversationConfig::default(),
            )),
            None,
        )
    }

    #[test]
    fn test_error_status_codes() {
        let settings: AppError =
            RuntimeError::Settings(SettingsError::UnknownModel("x".into())).into();
        assert_eq!(settings.into_response().status(), StatusCode::BAD_REQUEST);

        let closed: AppError = RuntimeError::Closed.into();
        assert_eq!(
            closed.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let missing = AppError::NotFound("nope".into());
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let result = get_session(State(state()), Path("missing".into())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_blank_message_is_not_queued() {
        let state = state();
        let Json(created) = create_session(State(state.clone())).await.unwrap();

        let Json(response) = send_message(
            State(state.clone()),
            Path(created.session_id.clone()),
            Json(MessageRequest { text: "  ".into() }),
        )
        .await
        .unwrap();
        assert!(!response.queued);

        let Json(session) = get_session(State(state), Path(created.session_id))
            .await
            .unwrap();
        assert!(session.messages.is_empty());
        assert!(!session.interview_active);
    }

    #[tokio::test]
    async fn test_rejected_settings_are_bad_request() {
        let state = state();
        let Json(created) = create_session(State(state.clone())).await.unwrap();

        let result = update_settings(
            State(state),
            Path(created.session_id),
            Json(SettingsUpdate {
                temperature: Some(0.42),
                ..SettingsUpdate::default()
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_settings_patch_accepts_snake_case() {
        let state = state();
        let Json(created) = create_session(State(state.clone())).await.unwrap();
        let update: SettingsUpdate =
            serde_json::from_str(r#"{"chain_of_thought": true}"#).unwrap();

        let Json(settings) = update_settings(
            State(state.clone()),
            Path(created.session_id.clone()),
            Json(update),
        )
        .await
        .unwrap();
        assert!(settings.chain_of_thought);

        let Json(session) = get_session(State(state), Path(created.session_id))
            .await
            .unwrap();
        assert!(session.settings.chain_of_thought);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let state = state();
        let Json(created) = create_session(State(state.clone())).await.unwrap();

        let Json(response) = delete_session(State(state.clone()), Path(created.session_id.clone()))
            .await
            .unwrap();
        assert!(response.success);

        let result = get_session(State(state.clone()), Path(created.session_id.clone())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let again = delete_session(State(state), Path(created.session_id)).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_router_serves_session_routes_only() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(state())).await.unwrap();
        });
        let client = reqwest::Client::new();
        let base = format!("http://{addr}");

        let created: serde_json::Value = client
            .post(format!("{base}/api/sessions"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let session_url = format!("{base}/api/sessions/{}", created["session_id"].as_str().unwrap());

        let deleted = client.delete(&session_url).send().await.unwrap();
        assert_eq!(deleted.status(), reqwest::StatusCode::OK);
        let gone = client.get(&session_url).send().await.unwrap();
        assert_eq!(gone.status(), reqwest::StatusCode::NOT_FOUND);

        let version = client.get(format!("{base}/version")).send().await.unwrap();
        assert_eq!(version.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_models_default_is_first_entry() {
        let Json(models) = list_models(State(state())).await;
        assert_eq!(models.models.len(), 3);
        assert_eq!(models.default, "Qwen3 235B");
    }
}
