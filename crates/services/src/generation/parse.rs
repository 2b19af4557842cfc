use study_core::model::{ArtifactError, Quiz, QuizDraft, StudyPlan, StudyPlanDraft};

use crate::error::GenerationError;

/// Remove markdown code fences a model may wrap around its JSON.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string, e.g. `json`.
        body = rest.split_once('\n').map_or("", |(_, after)| after);
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Parse and validate a generated study plan.
///
/// # Errors
///
/// Returns `GenerationError::Malformed` for unparseable JSON and
/// `GenerationError::Invalid` when the plan breaks day-number rules.
pub fn parse_plan(text: &str) -> Result<StudyPlan, GenerationError> {
    let draft: StudyPlanDraft = serde_json::from_str(strip_code_fences(text))?;
    StudyPlan::try_from(draft).map_err(|e| GenerationError::Invalid(ArtifactError::from(e)))
}

/// Parse and validate a generated quiz.
///
/// # Errors
///
/// Returns `GenerationError::Malformed` for unparseable JSON or unknown question
/// types and `GenerationError::Invalid` when the quiz breaks its invariants.
pub fn parse_quiz(text: &str) -> Result<Quiz, GenerationError> {
    let draft: QuizDraft = serde_json::from_str(strip_code_fences(text))?;
    Quiz::try_from(draft).map_err(|e| GenerationError::Invalid(ArtifactError::from(e)))
}
