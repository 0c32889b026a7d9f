//! Intake: turns the submitted form into a `CandidateProfile`.

use bytes::Bytes;
use tracing::warn;

use crate::interview::error::InterviewError;
use crate::interview::models::{CandidateProfile, ExperienceUnit};

/// Substituted when the resume cannot be read.
pub const NO_RESUME_TEXT: &str = "No text found in resume";

/// Raw intake fields as submitted. Every field may be absent.
#[derive(Debug, Clone, Default)]
pub struct IntakeForm {
    pub name: Option<String>,
    pub job_description: Option<String>,
    pub resume: Option<Bytes>,
    pub experience_value: Option<u32>,
    pub experience_unit: ExperienceUnit,
}

impl IntakeForm {
    /// Names of required fields that are missing or falsy. An experience of
    /// zero counts as missing.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(self.name.as_deref()) {
            missing.push("name");
        }
        if is_blank(self.job_description.as_deref()) {
            missing.push("job_description");
        }
        if self.resume.as_ref().map_or(true, |r| r.is_empty()) {
            missing.push("resume");
        }
        if self.experience_value.unwrap_or(0) == 0 {
            missing.push("experience_value");
        }
        missing
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Validates the form and extracts the resume text.
///
/// Extraction only runs once every field is present, and never fails the
/// intake: unreadable resumes get `NO_RESUME_TEXT`.
pub async fn accept_intake(form: IntakeForm) -> Result<CandidateProfile, InterviewError> {
    let missing = form.missing_fields();
    if !missing.is_empty() {
        return Err(InterviewError::IncompleteIntake { missing });
    }

    let resume_text = extract_resume_text_blocking(form.resume.unwrap_or_default()).await;
    Ok(CandidateProfile {
        name: form.name.unwrap_or_default().trim().to_string(),
        job_description: form.job_description.unwrap_or_default().trim().to_string(),
        resume_text,
        experience_value: form.experience_value.unwrap_or_default(),
        experience_unit: form.experience_unit,
    })
}

/// PDF parsing is CPU-bound and must run inside `tokio::task::spawn_blocking`.
pub async fn extract_resume_text_blocking(pdf: Bytes) -> String {
    tokio::task::spawn_blocking(move || extract_resume_text(&pdf))
        .await
        .unwrap_or_else(|e| {
            warn!("spawn_blocking failed during resume extraction: {e}");
            NO_RESUME_TEXT.to_string()
        })
}

/// Extracts text from a PDF payload, falling back to `NO_RESUME_TEXT`.
///
/// `pdf-extract` can panic on malformed input, so the call is isolated.
pub fn extract_resume_text(pdf: &[u8]) -> String {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(pdf)) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("Error extracting text from PDF: {e}");
            NO_RESUME_TEXT.to_string()
        }
        Err(_) => {
            warn!("PDF extractor panicked on resume payload");
            NO_RESUME_TEXT.to_string()
        }
    }
}
