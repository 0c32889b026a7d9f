// Interview LLM prompt templates.
// Placeholders are `{name}`-style and filled by `composer::fill_template`.

/// Opening instructions sent as the first (hidden) user turn.
/// Placeholders: {name}, {job_description}, {experience}, {resume_text}, {question_count}
pub const INTERVIEW_SETUP_TEMPLATE: &str = r#"
You are conducting an interview for the following candidate. Here is the candidate's information:
- **Name**: {name}
- **Job Description**: {job_description}
- **Experience**: {experience}
- **Resume Text**: {resume_text}

Please create {question_count} interview questions tailored to the candidate's experience and the provided job description.
Make sure to send the questions one after the other following a conversational style.
Focus on assessing the candidate's skills, qualifications, and fit for the role.
"#;

/// Final evaluation request. The question list is appended after the template.
/// Placeholders: {job_description}, {experience}
pub const SUMMARY_REQUEST_TEMPLATE: &str = r#"
Please review the interview questions below, the candidate's experience, and the job description provided. 
Give an overall analysis of the candidate's suitability for the role, including:
1. A rating for the candidate's expertise in the technology stack.
2. A conclusion on whether the candidate is a suitable fit for the job based on their responses.

The analysis should be concise, clear, and easy to understand. Also include a thank you note at the end.

**Job Description**: {job_description}
**Candidate's Experience**: {experience}

Interview Questions:
"#;

/// Shown to the candidate when any gateway call fails.
pub const RETRY_LATER_MESSAGE: &str = "An error occurred. Please try again later.";

/// Shown when intake is submitted with a missing field.
pub const INCOMPLETE_INTAKE_MESSAGE: &str = "Please fill in all fields.";
