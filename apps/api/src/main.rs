mod config;
mod errors;
mod interview;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::store::SessionStore;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

/// How often expired interview sessions are swept from memory.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing or invalid env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.openai_base_url.clone(),
    )
    .context("Failed to build LLM HTTP client")?;
    info!(
        "LLM client initialized (model: {}, questions per interview: {})",
        llm.model(),
        config.question_count
    );

    // Session store with background eviction
    let sessions = SessionStore::new();
    sessions.spawn_sweeper(config.retention, SESSION_SWEEP_INTERVAL);
    info!(
        "Session retention: finished {}s, idle {}s",
        config.retention.finished_ttl.as_secs(),
        config.retention.idle_ttl.as_secs()
    );

    // Build app state
    let state = AppState {
        sessions,
        gateway: Arc::new(llm),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
