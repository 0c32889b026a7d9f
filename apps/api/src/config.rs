use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::interview::store::Retention;
use crate::llm_client::DEFAULT_BASE_URL;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    /// Questions asked before the interview switches to the summary.
    pub question_count: u32,
    /// How long clients should show the incomplete-intake message.
    pub validation_message_ttl: Duration,
    /// How long sessions are kept in memory.
    pub retention: Retention,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_model: require_env("OPENAI_MODEL")?,
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            question_count: parse_question_count(&require_env("QUESTIONS_COUNT")?)?,
            validation_message_ttl: env_secs("VALIDATION_MESSAGE_SECS", 3)?,
            retention: Retention {
                finished_ttl: env_secs("FINISHED_SESSION_TTL_SECS", 15 * 60)?,
                idle_ttl: env_secs("SESSION_IDLE_TTL_SECS", 60 * 60)?,
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_secs(key: &str, default: u64) -> Result<Duration> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .with_context(|| format!("{key} must be a whole number of seconds")),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

/// `QUESTIONS_COUNT` must be a positive integer.
pub fn parse_question_count(raw: &str) -> Result<u32> {
    let count = raw
        .trim()
        .parse::<u32>()
        .with_context(|| format!("QUESTIONS_COUNT must be a positive integer, got '{raw}'"))?;
    if count == 0 {
        bail!("QUESTIONS_COUNT must be greater than zero");
    }
    Ok(count)
}
