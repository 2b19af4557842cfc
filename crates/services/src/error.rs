//! Shared error types for the services crate.

use thiserror::Error;

use storage::sqlite::SqliteInitError;
use study_core::model::{ArtifactError, MaterialError, QuestionId};

use crate::sessions::HostStep;

/// Errors emitted while turning an uploaded file into text.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractionError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("file is not valid UTF-8 text")]
    InvalidEncoding,
    #[error("no text could be extracted from the file")]
    NoText,
    #[error("could not read PDF: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors emitted by the artifact generator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("generation is not configured")]
    Disabled,
    #[error("generator returned an empty response")]
    EmptyResponse,
    #[error("generator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("generator response is not valid JSON for the requested artifact: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ArtifactError),
}

/// Errors emitted by `QuizSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizSessionError {
    #[error("number of questions must be at least 1")]
    InvalidQuestionCount,
    #[error("a quiz has already been generated")]
    NotConfiguring,
    #[error("no quiz in progress")]
    NotInProgress,
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error("question index {index} is out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("answer the current question before moving on")]
    CurrentUnanswered,
    #[error("already at the last question")]
    AtLastQuestion,
    #[error("already at the first question")]
    AtFirstQuestion,
    #[error("{missing} question(s) still unanswered")]
    Incomplete { missing: usize },
    #[error("failed to generate quiz, please try again")]
    Generation(#[source] GenerationError),
}

/// Errors emitted by `PlanTracker`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlanTrackerError {
    #[error("no study plan has been generated")]
    NoPlan,
    #[error("day {0} is not part of this plan")]
    UnknownDay(u32),
    #[error("failed to generate study plan, please try again")]
    Generation(#[source] GenerationError),
}

/// Errors emitted by `SessionHost`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HostError {
    #[error("expected step {expected:?}, currently at {actual:?}")]
    WrongStep { expected: HostStep, actual: HostStep },
    #[error(transparent)]
    Input(#[from] MaterialError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
