//! parley - conversational front-end over an LLM chat-completions endpoint
//!
//! Routes user input through summarization, a planner/writer story
//! pipeline or regular chat, and streams the transcript over HTTP.

mod api;
mod config;
mod conversation;
mod interview;
mod llm;
mod parser;
mod runtime;
mod system_prompt;
mod transcript;

use api::{create_router, AppState};
use config::Config;
use llm::{all_models, ChatTransport, LoggingTransport, OpenAiTransport};
use runtime::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env();
    let api_key = config.api_key.clone().unwrap_or_else(|| {
        tracing::warn!("No API key configured. Set PARLEY_API_KEY or LLM_API_KEY.");
        String::new()
    });

    // Initialize transport
    let openai = OpenAiTransport::new(
        api_key,
        config.base_url.as_deref(),
        config.max_completion_tokens,
    )?;
    let transport: Arc<dyn ChatTransport> = Arc::new(LoggingTransport::new(Arc::new(openai)));

    let catalog = all_models().to_vec();
    tracing::info!(
        models = ?catalog.iter().map(|m| m.display_name).collect::<Vec<_>>(),
        default = ?config.conversation.default_model,
        max_input_chars = config.conversation.max_input_chars(),
        "Model catalog loaded"
    );

    // Fail fast on a misconfigured default model
    if let Some(name) = config.conversation.default_model.as_deref() {
        if llm::find_by_name(&catalog, name).is_none() {
            return Err(format!("Unknown PARLEY_DEFAULT_MODEL: {name}").into());
        }
    }

    // Create application state
    let sessions = Arc::new(SessionManager::new(
        transport,
        catalog,
        config.conversation.clone(),
    ));
    let state = AppState::new(sessions, config.conversation.default_model.clone());

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("parley server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
