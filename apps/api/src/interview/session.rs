//! Phase Controller: one interview session and the rules for moving it
//! forward.
//!
//! A turn is handled in three steps: `prepare_*` computes the payload without
//! touching the session, the caller streams it through a `CompletionGateway`,
//! and `commit` appends the staged user turns together with the finished
//! reply. Nothing is written unless the reply completed, so a failed or
//! abandoned stream leaves the transcript and phase exactly as they were.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::interview::composer::{compose_interview_setup, compose_summary_request};
use crate::interview::error::InterviewError;
use crate::interview::intake::{accept_intake, IntakeForm};
use crate::interview::models::{CandidateProfile, Phase, Turn, TurnKind};
use crate::interview::transcript::Transcript;
use crate::llm_client::{collect_reply, CompletionGateway, LlmError};

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    question_count: u32,
    profile: Option<CandidateProfile>,
    transcript: Transcript,
    phase: Phase,
}

/// A turn that has been planned but not committed.
#[derive(Debug)]
pub struct PendingReply {
    /// User turns to append alongside the reply.
    staged: Vec<Turn>,
    /// Everything the model sees, oldest first.
    payload: Vec<Turn>,
    summarizing: bool,
    base_len: usize,
}

impl PendingReply {
    pub fn payload(&self) -> &[Turn] {
        &self.payload
    }

    /// Phase to report while this reply streams.
    pub fn phase(&self) -> Phase {
        if self.summarizing {
            Phase::Summarizing
        } else {
            Phase::Questioning
        }
    }
}

impl Session {
    pub fn new(question_count: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_activity: now,
            question_count,
            profile: None,
            transcript: Transcript::new(),
            phase: Phase::AwaitingIntake,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn profile(&self) -> Option<&CandidateProfile> {
        self.profile.as_ref()
    }

    /// When the session last changed state.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// AWAITING_INTAKE → QUESTIONING. On success the transcript holds exactly
    /// the hidden setup turn. On failure nothing changes.
    pub async fn submit_intake(&mut self, form: IntakeForm) -> Result<(), InterviewError> {
        if self.phase != Phase::AwaitingIntake {
            return Err(InterviewError::AlreadyStarted);
        }
        let profile = accept_intake(form).await?;
        self.transcript
            .append(compose_interview_setup(&profile, self.question_count));
        self.profile = Some(profile);
        self.phase = Phase::Questioning;
        self.last_activity = Utc::now();

        info!(session_id = %self.id, question_count = self.question_count, "Intake accepted");
        Ok(())
    }

    /// Plans the first question: the setup turn alone is sent to the model.
    /// May be repeated until an opening reply has been committed.
    pub fn prepare_opening(&self) -> Result<PendingReply, InterviewError> {
        match self.phase {
            Phase::AwaitingIntake => return Err(InterviewError::NotStarted),
            Phase::Done => return Err(InterviewError::Finished),
            Phase::Questioning | Phase::Summarizing => {}
        }
        if self.transcript.assistant_question_count() > 0 {
            return Err(InterviewError::AlreadyStarted);
        }
        Ok(self.plan(Vec::new(), false))
    }

    /// Plans the reply to a candidate message. While fewer than
    /// `question_count` questions have been asked the transcript is forwarded
    /// as-is; after that the summary request is added and this becomes the
    /// final turn.
    pub fn prepare_reply(&self, message: &str) -> Result<PendingReply, InterviewError> {
        match self.phase {
            Phase::AwaitingIntake => return Err(InterviewError::NotStarted),
            Phase::Done => return Err(InterviewError::Finished),
            Phase::Questioning | Phase::Summarizing => {}
        }
        let asked = self.transcript.assistant_question_count();
        if asked == 0 {
            return Err(InterviewError::NotStarted);
        }
        if message.trim().is_empty() {
            return Err(InterviewError::EmptyMessage);
        }

        let mut staged = vec![Turn::user(message)];
        let summarizing = asked >= self.question_count as usize;
        if summarizing {
            let profile = self.profile.as_ref().ok_or(InterviewError::NotStarted)?;
            staged.push(compose_summary_request(profile, &self.transcript));
        }
        Ok(self.plan(staged, summarizing))
    }

    fn plan(&self, staged: Vec<Turn>, summarizing: bool) -> PendingReply {
        let payload = self
            .transcript
            .turns()
            .iter()
            .chain(staged.iter())
            .cloned()
            .collect();
        PendingReply {
            staged,
            payload,
            summarizing,
            base_len: self.transcript.len(),
        }
    }

    /// Appends the staged turns and the completed reply, then applies the
    /// phase transition. Returns the phase after the commit.
    pub fn commit(&mut self, pending: PendingReply, reply: String) -> Result<Phase, InterviewError> {
        debug_assert_eq!(
            pending.base_len,
            self.transcript.len(),
            "pending reply planned against a different transcript"
        );
        if reply.trim().is_empty() {
            return Err(LlmError::EmptyContent.into());
        }

        for turn in pending.staged {
            self.transcript.append(turn);
        }
        if pending.summarizing {
            self.transcript
                .append(Turn::assistant(reply).with_kind(TurnKind::Summary));
            self.phase = Phase::Done;
        } else {
            self.transcript.append(Turn::assistant(reply));
        }
        self.last_activity = Utc::now();

        info!(
            session_id = %self.id,
            phase = %self.phase,
            questions_asked = self.transcript.assistant_question_count(),
            "Turn committed"
        );
        Ok(self.phase)
    }

    /// Streams `pending` to completion and commits it.
    pub async fn advance(
        &mut self,
        gateway: &dyn CompletionGateway,
        pending: PendingReply,
    ) -> Result<String, InterviewError> {
        let fragments = gateway.stream(pending.payload()).await?;
        let reply = collect_reply(fragments).await?;
        self.commit(pending, reply.clone())?;
        Ok(reply)
    }

    /// Produces and commits the opening question.
    pub async fn open(&mut self, gateway: &dyn CompletionGateway) -> Result<String, InterviewError> {
        let pending = self.prepare_opening()?;
        self.advance(gateway, pending).await
    }

    /// Handles one candidate message and commits the model's reply.
    pub async fn respond(
        &mut self,
        gateway: &dyn CompletionGateway,
        message: &str,
    ) -> Result<String, InterviewError> {
        let pending = self.prepare_reply(message)?;
        self.advance(gateway, pending).await
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            phase: self.phase,
            created_at: self.created_at,
            questions_asked: self.transcript.assistant_question_count(),
            question_count: self.question_count,
            transcript: self.transcript.visible().cloned().collect(),
        }
    }
}

/// Read-only rendering of a session for the candidate.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub phase: Phase,
    pub created_at: DateTime<Utc>,
    pub questions_asked: usize,
    pub question_count: u32,
    pub transcript: Vec<Turn>,
}
