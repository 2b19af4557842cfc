//! Correctness rules and aggregate scoring for quizzes.
//!
//! Everything here is pure: the same quiz and answers always give the same
//! report, so it backs both live previews and the frozen submission score.

use crate::model::{Answer, AnswerSet, Question, QuestionId, Quiz};

/// Correctness of one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionScore {
    pub question_id: QuestionId,
    pub is_correct: bool,
}

/// Aggregate score plus per-question correctness in quiz order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreReport {
    pub score: u32,
    pub per_question: Vec<QuestionScore>,
}

impl ScoreReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.per_question.len()
    }

    #[must_use]
    pub fn is_correct(&self, id: &QuestionId) -> bool {
        self.per_question
            .iter()
            .any(|q| &q.question_id == id && q.is_correct)
    }
}

/// Score `answers` against `quiz`. Unanswered questions count as incorrect.
#[must_use]
pub fn score(quiz: &Quiz, answers: &AnswerSet) -> ScoreReport {
    let per_question: Vec<QuestionScore> = quiz
        .questions()
        .iter()
        .map(|q| QuestionScore {
            question_id: q.id().clone(),
            is_correct: is_correct(q, answers.get(q.id())),
        })
        .collect();
    let correct = per_question.iter().filter(|q| q.is_correct).count();

    ScoreReport {
        score: u32::try_from(correct).unwrap_or(u32::MAX),
        per_question,
    }
}

/// Whether `answer` is correct for `question`.
///
/// Choice and true/false answers need an exact match of the same shape.
/// Short answers pass when at least half of the reference keywords appear.
#[must_use]
pub fn is_correct(question: &Question, answer: Option<&Answer>) -> bool {
    match (question, answer) {
        (Question::MultipleChoice { correct_answer, .. }, Some(Answer::Text(given))) => {
            given == correct_answer
        }
        (Question::TrueFalse { correct_answer, .. }, Some(Answer::Bool(given))) => {
            given == correct_answer
        }
        (Question::ShortAnswer { correct_answer, .. }, answer) => {
            let given = match answer {
                Some(Answer::Text(text)) => text.as_str(),
                _ => "",
            };
            let keywords = keywords(correct_answer);
            let matches = keyword_matches(&keywords, given);
            // matches >= len / 2 over the reals
            matches * 2 >= keywords.len()
        }
        _ => false,
    }
}

/// Lower-cased whitespace-separated keywords of a reference answer.
///
/// Runs of whitespace never produce empty keywords, so a reference with doubled
/// spaces does not gain free matches.
#[must_use]
pub fn keywords(reference: &str) -> Vec<String> {
    reference
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Number of keywords contained, case-insensitively, in `given`.
#[must_use]
pub fn keyword_matches(keywords: &[String], given: &str) -> usize {
    let given = given.to_lowercase();
    keywords
        .iter()
        .filter(|kw| given.contains(kw.as_str()))
        .count()
}
