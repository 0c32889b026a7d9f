use std::fmt;

use serde::{Deserialize, Serialize};

/// Unit the candidate's experience is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceUnit {
    #[default]
    Years,
    Months,
}

impl fmt::Display for ExperienceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperienceUnit::Years => f.write_str("Years"),
            ExperienceUnit::Months => f.write_str("Months"),
        }
    }
}

impl std::str::FromStr for ExperienceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "years" | "year" => Ok(ExperienceUnit::Years),
            "months" | "month" => Ok(ExperienceUnit::Months),
            other => Err(format!("unknown experience unit '{other}'")),
        }
    }
}

/// Candidate metadata captured at intake. Never mutated after submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateProfile {
    pub name: String,
    pub job_description: String,
    pub resume_text: String,
    pub experience_value: u32,
    pub experience_unit: ExperienceUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// What a turn is for. Drives visibility and question counting; the model only
/// ever sees role and content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// System-generated interview instructions. Hidden from the candidate.
    InterviewSetup,
    Conversation,
    SummaryRequest,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub kind: TurnKind,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            kind: TurnKind::Conversation,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            kind: TurnKind::Conversation,
        }
    }

    pub fn with_kind(mut self, kind: TurnKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.kind == TurnKind::InterviewSetup
    }
}

/// Coarse stage of the interview workflow. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingIntake,
    Questioning,
    /// Only observed while a summary reply is streaming; the stored phase goes
    /// straight from `Questioning` to `Done` when that reply is committed.
    Summarizing,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::AwaitingIntake => "awaiting_intake",
            Phase::Questioning => "questioning",
            Phase::Summarizing => "summarizing",
            Phase::Done => "done",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            r#""assistant""#
        );
    }

    #[test]
    fn test_experience_unit_parse_is_case_insensitive() {
        assert_eq!("Years".parse::<ExperienceUnit>(), Ok(ExperienceUnit::Years));
        assert_eq!(" months ".parse::<ExperienceUnit>(), Ok(ExperienceUnit::Months));
        assert!("decades".parse::<ExperienceUnit>().is_err());
    }

    #[test]
    fn test_only_setup_turn_is_hidden() {
        assert!(Turn::user("x").with_kind(TurnKind::InterviewSetup).is_hidden());
        assert!(!Turn::user("x").is_hidden());
        assert!(!Turn::user("x").with_kind(TurnKind::SummaryRequest).is_hidden());
    }

    #[test]
    fn test_phase_display_matches_serde() {
        for phase in [
            Phase::AwaitingIntake,
            Phase::Questioning,
            Phase::Summarizing,
            Phase::Done,
        ] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{phase}\""));
        }
    }
}
