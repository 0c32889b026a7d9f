use std::sync::Arc;

use crate::config::Config;
use crate::interview::store::SessionStore;
use crate::llm_client::CompletionGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Pluggable model backend. Default: the OpenAI-compatible `LlmClient`.
    pub gateway: Arc<dyn CompletionGateway>,
    pub config: Config,
}
