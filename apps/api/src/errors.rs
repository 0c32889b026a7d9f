use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::interview::error::InterviewError;
use crate::interview::prompts::{INCOMPLETE_INTAKE_MESSAGE, RETRY_LATER_MESSAGE};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Incomplete intake: {}", missing.join(", "))]
    IncompleteIntake {
        missing: Vec<&'static str>,
        dismiss_after: Duration,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("LLM error: {0}")]
    Llm(String),
}

impl AppError {
    /// Maps a domain error, attaching the transient-message duration used for
    /// intake rejections.
    pub fn from_interview(err: InterviewError, dismiss_after: Duration) -> Self {
        match err {
            InterviewError::IncompleteIntake { missing } => AppError::IncompleteIntake {
                missing,
                dismiss_after,
            },
            InterviewError::EmptyMessage => AppError::Validation(err.to_string()),
            InterviewError::NotStarted
            | InterviewError::AlreadyStarted
            | InterviewError::Finished => AppError::Conflict(err.to_string()),
            InterviewError::Completion(e) => AppError::Llm(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::IncompleteIntake {
                missing,
                dismiss_after,
            } => {
                let body = Json(json!({
                    "error": {
                        "code": "INCOMPLETE_INTAKE",
                        "message": INCOMPLETE_INTAKE_MESSAGE,
                        "missing": missing,
                        "dismiss_after_ms": dismiss_after.as_millis() as u64,
                    }
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    RETRY_LATER_MESSAGE.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;

    #[test]
    fn test_interview_errors_map_to_http_classes() {
        let ttl = Duration::from_secs(3);
        let cases = [
            (InterviewError::Finished, StatusCode::CONFLICT),
            (InterviewError::NotStarted, StatusCode::CONFLICT),
            (InterviewError::EmptyMessage, StatusCode::BAD_REQUEST),
            (
                InterviewError::IncompleteIntake {
                    missing: vec!["name"],
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                InterviewError::Completion(LlmError::EmptyContent),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            let response = AppError::from_interview(err, ttl).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
