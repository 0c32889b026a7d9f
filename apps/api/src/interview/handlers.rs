//! Axum route handlers for the Interview API.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::intake::IntakeForm;
use crate::interview::models::Phase;
use crate::interview::prompts::RETRY_LATER_MESSAGE;
use crate::interview::session::{PendingReply, Session, SessionView};
use crate::interview::store::Checkout;
use crate::llm_client::CompletionGateway;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateInterviewResponse {
    pub session_id: Uuid,
    pub phase: Phase,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews
///
/// Multipart intake: `name`, `job_description`, `resume` (PDF), `experience_value`,
/// `experience_unit`. Creates the session and moves it to questioning.
pub async fn handle_create_interview(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreateInterviewResponse>), AppError> {
    let form = read_intake_form(multipart).await?;

    let mut session = Session::new(state.config.question_count);
    session
        .submit_intake(form)
        .await
        .map_err(|e| AppError::from_interview(e, state.config.validation_message_ttl))?;

    let phase = session.phase();
    let session_id = state.sessions.insert(session);
    info!(%session_id, "Interview created");

    Ok((
        StatusCode::CREATED,
        Json(CreateInterviewResponse { session_id, phase }),
    ))
}

/// POST /api/v1/interviews/:id/start
///
/// Streams the opening question. Retryable until it succeeds once.
pub async fn handle_start_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let session = checkout(&state, id)?;
    let pending = session
        .prepare_opening()
        .map_err(|e| AppError::from_interview(e, state.config.validation_message_ttl))?;

    Ok(reply_stream(Arc::clone(&state.gateway), session, pending))
}

/// POST /api/v1/interviews/:id/messages
///
/// Streams the next question, or the final evaluation once the question
/// budget is spent.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let session = checkout(&state, id)?;
    let pending = session
        .prepare_reply(&request.message)
        .map_err(|e| AppError::from_interview(e, state.config.validation_message_ttl))?;

    Ok(reply_stream(Arc::clone(&state.gateway), session, pending))
}

/// GET /api/v1/interviews/:id
///
/// Read-only view of the session. The setup prompt is never included.
/// Answers 409 instead of waiting while a reply is streaming.
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .sessions
        .snapshot(id)
        .map_err(|c| checkout_error(id, c))?;
    Ok(Json(session.view()))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn checkout(state: &AppState, id: Uuid) -> Result<OwnedMutexGuard<Session>, AppError> {
    state
        .sessions
        .checkout(id)
        .map_err(|c| checkout_error(id, c))
}

fn checkout_error(id: Uuid, checkout: Checkout) -> AppError {
    match checkout {
        Checkout::NotFound => AppError::NotFound(format!("Interview {id} not found")),
        Checkout::Busy => {
            AppError::Conflict("A reply for this interview is still streaming".to_string())
        }
    }
}

/// Streams one reply as SSE and commits it once complete. The session guard
/// is held until the stream ends, so no other turn can interleave. If the
/// client goes away mid-stream the generator is dropped and nothing is
/// committed.
fn reply_stream(
    gateway: Arc<dyn CompletionGateway>,
    mut session: OwnedMutexGuard<Session>,
    pending: PendingReply,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        let session_id = session.id();
        let phase = json!({ "phase": pending.phase() });
        yield Ok::<_, Infallible>(Event::default().event("phase").data(phase.to_string()));

        let mut fragments = match gateway.stream(pending.payload()).await {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(%session_id, "Completion request failed: {e}");
                yield Ok(error_event());
                return;
            }
        };

        let mut reply = String::new();
        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(text) => {
                    let data = json!({ "text": text });
                    yield Ok(Event::default().event("text_delta").data(data.to_string()));
                    reply.push_str(&text);
                }
                Err(e) => {
                    warn!(%session_id, "Completion stream failed: {e}");
                    yield Ok(error_event());
                    return;
                }
            }
        }

        match session.commit(pending, reply) {
            Ok(phase) => {
                let data = json!({ "phase": phase });
                yield Ok(Event::default().event("done").data(data.to_string()));
            }
            Err(e) => {
                warn!(%session_id, "Reply not committed: {e}");
                yield Ok(error_event());
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

fn error_event() -> Event {
    let data = json!({ "message": RETRY_LATER_MESSAGE });
    Event::default().event("error").data(data.to_string())
}

async fn read_intake_form(mut multipart: Multipart) -> Result<IntakeForm, AppError> {
    let mut form = IntakeForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read resume: {e}")))?;
                form.resume = Some(bytes);
            }
            "name" | "job_description" | "experience_value" | "experience_unit" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))?;
                apply_text_field(&mut form, &name, text)?;
            }
            _ => {}
        }
    }

    Ok(form)
}

fn apply_text_field(form: &mut IntakeForm, name: &str, text: String) -> Result<(), AppError> {
    match name {
        "name" => form.name = Some(text),
        "job_description" => form.job_description = Some(text),
        "experience_value" if text.trim().is_empty() => form.experience_value = None,
        "experience_value" => {
            let value = text.trim().parse::<u32>().map_err(|_| {
                AppError::Validation("experience_value must be a non-negative integer".to_string())
            })?;
            form.experience_value = Some(value);
        }
        "experience_unit" => {
            form.experience_unit = text.parse().map_err(AppError::Validation)?;
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::models::ExperienceUnit;

    #[test]
    fn test_apply_text_field_parses_experience() {
        let mut form = IntakeForm::default();
        apply_text_field(&mut form, "experience_value", " 4 ".to_string()).unwrap();
        apply_text_field(&mut form, "experience_unit", "Months".to_string()).unwrap();
        assert_eq!(form.experience_value, Some(4));
        assert_eq!(form.experience_unit, ExperienceUnit::Months);
    }

    #[test]
    fn test_apply_text_field_rejects_negative_experience() {
        let mut form = IntakeForm::default();
        assert!(matches!(
            apply_text_field(&mut form, "experience_value", "-1".to_string()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_apply_text_field_blank_experience_is_absent() {
        let mut form = IntakeForm::default();
        apply_text_field(&mut form, "experience_value", "".to_string()).unwrap();
        assert_eq!(form.experience_value, None);
        assert!(form.missing_fields().contains(&"experience_value"));
    }
}
