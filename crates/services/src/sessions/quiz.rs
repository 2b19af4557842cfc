use std::fmt;
use std::sync::Arc;

use study_core::model::{Answer, AnswerSet, Material, Question, QuestionId, Quiz, QuizResult};
use study_core::scoring::{self, ScoreReport};
use tracing::{info, warn};

use super::progress::QuizProgress;
use crate::Clock;
use crate::error::QuizSessionError;
use crate::generation::ArtifactGenerator;
use crate::mirror::PersistenceMirror;

/// Lifecycle phase of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Configuring,
    InProgress,
    Completed,
}

struct ActiveQuiz {
    quiz: Quiz,
    answers: AnswerSet,
    cursor: usize,
}

struct CompletedQuiz {
    quiz: Quiz,
    result: QuizResult,
    report: ScoreReport,
}

enum QuizState {
    Configuring,
    InProgress(ActiveQuiz),
    Completed(CompletedQuiz),
}

/// Interactive quiz over one material.
///
/// `configuring` → `in_progress` once a quiz is generated, → `completed` on
/// submit. `reset` returns to `configuring` and drops the quiz and answers.
pub struct QuizSession {
    material: Material,
    num_questions: u32,
    state: QuizState,
    generator: Arc<dyn ArtifactGenerator>,
    mirror: PersistenceMirror,
    clock: Clock,
}

impl QuizSession {
    #[must_use]
    pub fn new(
        material: Material,
        generator: Arc<dyn ArtifactGenerator>,
        mirror: PersistenceMirror,
        clock: Clock,
    ) -> Self {
        Self {
            material,
            num_questions: study_core::model::quiz::DEFAULT_QUESTION_COUNT,
            state: QuizState::Configuring,
            generator,
            mirror,
            clock,
        }
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        match self.state {
            QuizState::Configuring => QuizPhase::Configuring,
            QuizState::InProgress(_) => QuizPhase::InProgress,
            QuizState::Completed(_) => QuizPhase::Completed,
        }
    }

    #[must_use]
    pub fn material(&self) -> &Material {
        &self.material
    }

    pub(crate) fn into_material(self) -> Material {
        self.material
    }

    #[must_use]
    pub fn num_questions(&self) -> u32 {
        self.num_questions
    }

    #[must_use]
    pub fn mirror(&self) -> &PersistenceMirror {
        &self.mirror
    }

    /// Wait for pending result writes.
    pub async fn flush(&mut self) {
        self.mirror.flush().await;
    }

    /// Choose how many questions the next quiz should have.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::InvalidQuestionCount` for 0 and
    /// `QuizSessionError::NotConfiguring` once a quiz exists.
    pub fn set_num_questions(&mut self, n: u32) -> Result<(), QuizSessionError> {
        if !matches!(self.state, QuizState::Configuring) {
            return Err(QuizSessionError::NotConfiguring);
        }
        if n == 0 {
            return Err(QuizSessionError::InvalidQuestionCount);
        }
        self.num_questions = n;
        Ok(())
    }

    /// Request a quiz and start answering it.
    ///
    /// On generator failure the session stays in `configuring` and can be retried.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Generation` when the generator fails and
    /// `QuizSessionError::NotConfiguring` when a quiz already exists.
    pub async fn generate(&mut self) -> Result<&Quiz, QuizSessionError> {
        if !matches!(self.state, QuizState::Configuring) {
            return Err(QuizSessionError::NotConfiguring);
        }

        let quiz = match self
            .generator
            .generate_quiz(self.material.content(), self.num_questions)
            .await
        {
            Ok(quiz) => quiz,
            Err(err) => {
                warn!(error = %err, "quiz generation failed");
                return Err(QuizSessionError::Generation(err));
            }
        };

        let quiz = match self
            .mirror
            .save_quiz(self.material.id(), &quiz, self.clock.now())
            .await
        {
            Some(id) => quiz.with_id(id),
            None => quiz,
        };
        info!(questions = quiz.len(), quiz_id = ?quiz.id(), "quiz started");

        self.state = QuizState::InProgress(ActiveQuiz {
            quiz,
            answers: AnswerSet::new(),
            cursor: 0,
        });
        match &self.state {
            QuizState::InProgress(active) => Ok(&active.quiz),
            _ => Err(QuizSessionError::NotInProgress),
        }
    }

    /// The quiz being answered or already submitted.
    #[must_use]
    pub fn quiz(&self) -> Option<&Quiz> {
        match &self.state {
            QuizState::Configuring => None,
            QuizState::InProgress(active) => Some(&active.quiz),
            QuizState::Completed(done) => Some(&done.quiz),
        }
    }

    #[must_use]
    pub fn answers(&self) -> Option<&AnswerSet> {
        match &self.state {
            QuizState::Configuring => None,
            QuizState::InProgress(active) => Some(&active.answers),
            QuizState::Completed(done) => Some(&done.result.answers),
        }
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.active().ok().map(|a| a.cursor)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.active().ok().map(|a| &a.quiz.questions()[a.cursor])
    }

    /// Whether the question at `index` has a recorded answer.
    #[must_use]
    pub fn is_answered(&self, index: usize) -> bool {
        let (Some(quiz), Some(answers)) = (self.quiz(), self.answers()) else {
            return false;
        };
        quiz.questions()
            .get(index)
            .is_some_and(|q| answers.contains(q.id()))
    }

    #[must_use]
    pub fn progress(&self) -> Option<QuizProgress> {
        let quiz = self.quiz()?;
        let answered = self.answers().map_or(0, AnswerSet::len);
        Some(QuizProgress {
            total: quiz.len(),
            answered,
            remaining: quiz.len().saturating_sub(answered),
            current: self.current_index().unwrap_or(0),
            is_complete: self.phase() == QuizPhase::Completed,
        })
    }

    /// Record or replace the answer to a question.
    ///
    /// The value is not checked against the question type.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::NotInProgress` outside `in_progress` and
    /// `QuizSessionError::UnknownQuestion` for ids the quiz does not contain.
    pub fn answer(
        &mut self,
        question_id: &QuestionId,
        value: impl Into<Answer>,
    ) -> Result<(), QuizSessionError> {
        let active = self.active_mut()?;
        if active.quiz.question(question_id).is_none() {
            return Err(QuizSessionError::UnknownQuestion(question_id.clone()));
        }
        active.answers.upsert(question_id.clone(), value.into());
        Ok(())
    }

    /// Answer the question under the cursor.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::NotInProgress` outside `in_progress`.
    pub fn answer_current(&mut self, value: impl Into<Answer>) -> Result<(), QuizSessionError> {
        let active = self.active_mut()?;
        let id = active.quiz.questions()[active.cursor].id().clone();
        active.answers.upsert(id, value.into());
        Ok(())
    }

    /// Jump to any question.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::IndexOutOfRange` for an invalid index.
    pub fn go_to(&mut self, index: usize) -> Result<(), QuizSessionError> {
        let active = self.active_mut()?;
        let len = active.quiz.len();
        if index >= len {
            return Err(QuizSessionError::IndexOutOfRange { index, len });
        }
        active.cursor = index;
        Ok(())
    }

    /// Advance to the next question; the current one must be answered.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::CurrentUnanswered` or
    /// `QuizSessionError::AtLastQuestion`; the cursor is unchanged.
    pub fn next(&mut self) -> Result<usize, QuizSessionError> {
        let active = self.active_mut()?;
        let current = active.quiz.questions()[active.cursor].id();
        if !active.answers.contains(current) {
            return Err(QuizSessionError::CurrentUnanswered);
        }
        if active.cursor + 1 >= active.quiz.len() {
            return Err(QuizSessionError::AtLastQuestion);
        }
        active.cursor += 1;
        Ok(active.cursor)
    }

    /// Go back one question.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::AtFirstQuestion` at the first question.
    pub fn previous(&mut self) -> Result<usize, QuizSessionError> {
        let active = self.active_mut()?;
        if active.cursor == 0 {
            return Err(QuizSessionError::AtFirstQuestion);
        }
        active.cursor -= 1;
        Ok(active.cursor)
    }

    /// Score of the answers given so far, or the frozen report once submitted.
    #[must_use]
    pub fn live_score(&self) -> Option<ScoreReport> {
        match &self.state {
            QuizState::Configuring => None,
            QuizState::InProgress(active) => Some(scoring::score(&active.quiz, &active.answers)),
            QuizState::Completed(done) => Some(done.report.clone()),
        }
    }

    /// Freeze the answers, score them and finish the quiz.
    ///
    /// When the quiz was saved, the result is mirrored to the store in the
    /// background; a failed write does not undo the submission.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Incomplete` while any question is unanswered.
    pub fn submit(&mut self) -> Result<&QuizResult, QuizSessionError> {
        let active = self.active()?;
        let missing = active
            .quiz
            .questions()
            .iter()
            .filter(|q| !active.answers.contains(q.id()))
            .count();
        if missing > 0 {
            return Err(QuizSessionError::Incomplete { missing });
        }

        let QuizState::InProgress(active) =
            std::mem::replace(&mut self.state, QuizState::Configuring)
        else {
            return Err(QuizSessionError::NotInProgress);
        };

        let report = scoring::score(&active.quiz, &active.answers);
        let result = QuizResult {
            score: report.score,
            total_questions: u32::try_from(active.quiz.len()).unwrap_or(u32::MAX),
            answers: active.answers,
            completed_at: self.clock.now(),
        };
        info!(
            score = result.score,
            total = result.total_questions,
            quiz_id = ?active.quiz.id(),
            "quiz submitted"
        );

        if let Some(quiz_id) = active.quiz.id() {
            self.mirror.record_result(quiz_id, result.clone());
        }

        self.state = QuizState::Completed(CompletedQuiz {
            quiz: active.quiz,
            result,
            report,
        });
        self.result().ok_or(QuizSessionError::NotInProgress)
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        match &self.state {
            QuizState::Completed(done) => Some(&done.result),
            _ => None,
        }
    }

    /// Drop the quiz, answers and cursor and return to `configuring`.
    pub fn reset(&mut self) {
        self.state = QuizState::Configuring;
    }

    fn active(&self) -> Result<&ActiveQuiz, QuizSessionError> {
        match &self.state {
            QuizState::InProgress(active) => Ok(active),
            _ => Err(QuizSessionError::NotInProgress),
        }
    }

    fn active_mut(&mut self) -> Result<&mut ActiveQuiz, QuizSessionError> {
        match &mut self.state {
            QuizState::InProgress(active) => Ok(active),
            _ => Err(QuizSessionError::NotInProgress),
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("material", &self.material.title())
            .field("num_questions", &self.num_questions)
            .field("phase", &self.phase())
            .field("current", &self.current_index())
            .field("mirror", &self.mirror)
            .finish_non_exhaustive()
    }
}
