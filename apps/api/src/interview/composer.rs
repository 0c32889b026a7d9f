//! Prompt Composer: pure functions from candidate profile and transcript to
//! the user turns the interview injects into the conversation.
//!
//! Output is byte-identical for identical inputs.

use crate::interview::models::{CandidateProfile, Turn, TurnKind};
use crate::interview::prompts::{INTERVIEW_SETUP_TEMPLATE, SUMMARY_REQUEST_TEMPLATE};
use crate::interview::transcript::Transcript;

/// Builds the hidden setup turn that opens every interview.
pub fn compose_interview_setup(profile: &CandidateProfile, question_count: u32) -> Turn {
    let experience = experience_label(profile);
    let question_count = question_count.to_string();
    let content = fill_template(
        INTERVIEW_SETUP_TEMPLATE,
        &[
            ("name", &profile.name),
            ("job_description", &profile.job_description),
            ("experience", &experience),
            ("resume_text", &profile.resume_text),
            ("question_count", &question_count),
        ],
    );
    Turn::user(content).with_kind(TurnKind::InterviewSetup)
}

/// Builds the evaluation request sent once the question budget is spent.
///
/// Only the assistant's questions are listed. Candidate answers reach the
/// model through the rest of the transcript, not through this prompt.
pub fn compose_summary_request(profile: &CandidateProfile, transcript: &Transcript) -> Turn {
    let experience = experience_label(profile);
    let mut content = fill_template(
        SUMMARY_REQUEST_TEMPLATE,
        &[
            ("job_description", &profile.job_description),
            ("experience", &experience),
        ],
    );
    for question in transcript.assistant_questions() {
        content.push_str("- ");
        content.push_str(question);
        content.push('\n');
    }
    Turn::user(content).with_kind(TurnKind::SummaryRequest)
}

fn experience_label(profile: &CandidateProfile) -> String {
    format!("{} {}", profile.experience_value, profile.experience_unit)
}

/// Single-pass `{key}` substitution. Substituted values are never rescanned,
/// so candidate text containing `{name}` and the like is left alone.
/// Unknown placeholders are emitted verbatim.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
