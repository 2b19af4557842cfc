//! Generation of study plans and quizzes from material text.

mod client;
mod parse;
mod prompt;

use async_trait::async_trait;
use study_core::model::{Quiz, StudyPlan};

use crate::error::GenerationError;

pub use client::{ChatGenerator, GeneratorConfig};
pub use parse::{parse_plan, parse_quiz, strip_code_fences};
pub use prompt::{
    GENERATION_CHAR_CAP, GENERATION_TRUNCATION_MARKER, plan_prompt, prepare_content, quiz_prompt,
};

/// Produces structured artifacts from study material.
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    /// Generate a plan spanning `days` days.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the request fails or the response is not a valid plan.
    async fn generate_plan(&self, content: &str, days: u32) -> Result<StudyPlan, GenerationError>;

    /// Generate a quiz with `num_questions` questions.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the request fails or the response is not a valid quiz.
    async fn generate_quiz(
        &self,
        content: &str,
        num_questions: u32,
    ) -> Result<Quiz, GenerationError>;
}
