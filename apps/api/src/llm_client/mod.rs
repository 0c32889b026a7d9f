//! LLM Client: the single point of entry for all model calls in the interview service.
//!
//! ARCHITECTURAL RULE: No other module may call the chat-completions API directly.
//! Everything goes through the `CompletionGateway` trait so the phase logic can be
//! driven by a scripted gateway in tests.
//!
//! Model: taken from `OPENAI_MODEL` at startup.
use std::pin::Pin;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::interview::models::Turn;

#[cfg(test)]
pub mod scripted;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Text fragments of one reply, in order. Finite and consumed once.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send + 'static>>;

/// The completion gateway trait. Implement this to swap model backends without
/// touching the phase controller or the handlers.
///
/// Carried in `AppState` as `Arc<dyn CompletionGateway>`.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Opens a streamed completion over `turns`. Errors before the first
    /// fragment are returned directly; later errors arrive as stream items.
    async fn stream(&self, turns: &[Turn]) -> Result<FragmentStream, LlmError>;
}

/// Concatenates every fragment of `stream`. Any error, or a reply that is
/// blank once complete, fails the whole reply.
pub async fn collect_reply(mut stream: FragmentStream) -> Result<String, LlmError> {
    let mut reply = String::new();
    while let Some(fragment) = stream.next().await {
        reply.push_str(&fragment?);
    }
    if reply.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(reply)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Streaming client for any OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionGateway for LlmClient {
    async fn stream(&self, turns: &[Turn]) -> Result<FragmentStream, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: turns
                .iter()
                .map(|t| ChatMessage {
                    role: t.role.as_str(),
                    content: &t.content,
                })
                .collect(),
            stream: true,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(turns = turns.len(), model = %self.model, "Completion stream opened");

        let mut events = response.bytes_stream().eventsource();
        let fragments: FragmentStream = Box::pin(async_stream::try_stream! {
            while let Some(event) = events.next().await {
                let event = event.map_err(|e| LlmError::Stream(e.to_string()))?;
                if event.data.trim() == DONE_SENTINEL {
                    break;
                }
                if let Some(text) = parse_chunk(&event.data)? {
                    yield text;
                }
            }
        });
        Ok(fragments)
    }
}

/// Extracts the text delta from one SSE `data:` payload. Role-only and
/// finish chunks carry no content and yield `None`.
fn parse_chunk(data: &str) -> Result<Option<String>, LlmError> {
    let chunk: ChatChunk = serde_json::from_str(data)?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[test]
    fn test_parse_chunk_with_content() {
        let data = r#"{"id":"c1","choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}"#;
        assert_eq!(parse_chunk(data).unwrap(), Some("Hello".to_string()));
    }

    #[test]
    fn test_parse_chunk_role_only() {
        let data = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_chunk(data).unwrap(), None);
    }

    #[test]
    fn test_parse_chunk_no_choices() {
        let data = r#"{"choices":[],"usage":{"prompt_tokens":10,"completion_tokens":5}}"#;
        assert_eq!(parse_chunk(data).unwrap(), None);
    }

    #[test]
    fn test_parse_chunk_invalid_json() {
        assert!(matches!(parse_chunk("not json"), Err(LlmError::Parse(_))));
    }

    #[tokio::test]
    async fn test_collect_reply_concatenates_in_order() {
        let fragments: FragmentStream = Box::pin(stream::iter(vec![
            Ok("What ".to_string()),
            Ok("is ".to_string()),
            Ok("Rust?".to_string()),
        ]));
        assert_eq!(collect_reply(fragments).await.unwrap(), "What is Rust?");
    }

    #[tokio::test]
    async fn test_collect_reply_fails_on_mid_stream_error() {
        let fragments: FragmentStream = Box::pin(stream::iter(vec![
            Ok("partial".to_string()),
            Err(LlmError::Stream("connection reset".to_string())),
            Ok("never seen".to_string()),
        ]));
        assert!(matches!(
            collect_reply(fragments).await,
            Err(LlmError::Stream(_))
        ));
    }

    #[tokio::test]
    async fn test_collect_reply_rejects_blank_reply() {
        let fragments: FragmentStream = Box::pin(stream::iter(vec![Ok("  ".to_string())]));
        assert!(matches!(
            collect_reply(fragments).await,
            Err(LlmError::EmptyContent)
        ));
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = LlmClient::new(
            "key".to_string(),
            "gpt-4o-mini".to_string(),
            "http://localhost:11434/v1/".to_string(),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:11434/v1");
        assert_eq!(client.model(), "gpt-4o-mini");
    }
}
