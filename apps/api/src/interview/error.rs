use thiserror::Error;

use crate::llm_client::LlmError;

/// Why a step of the interview was refused or failed. None of these leave a
/// partial turn in the transcript.
#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("Incomplete intake, missing: {}", missing.join(", "))]
    IncompleteIntake { missing: Vec<&'static str> },

    #[error("Interview has not started: the opening question has not been produced")]
    NotStarted,

    #[error("Interview already started")]
    AlreadyStarted,

    #[error("Interview is finished")]
    Finished,

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Completion failed: {0}")]
    Completion(#[from] LlmError),
}
