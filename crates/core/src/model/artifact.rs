use thiserror::Error;

use crate::model::plan::PlanError;
use crate::model::quiz::QuizError;

/// Which artifact a generation request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Plan,
    Quiz,
}

impl ArtifactKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Plan => "plan",
            ArtifactKind::Quiz => "quiz",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated artifact failed boundary validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArtifactError {
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}
