use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};

/// Quiz length used before the user picks one.
pub const DEFAULT_QUESTION_COUNT: u32 = 10;
/// Curated quiz lengths offered to the user.
pub const QUESTION_COUNT_OPTIONS: [u32; 4] = [5, 10, 15, 20];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    NoQuestions,

    #[error("question id {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error("multiple choice question {0} needs at least two options")]
    TooFewOptions(QuestionId),

    #[error("correct answer of question {0} is not one of its options")]
    AnswerNotInOptions(QuestionId),
}

/// A single quiz question, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Question {
    #[serde(rename = "mcq")]
    MultipleChoice {
        id: QuestionId,
        question: String,
        options: Vec<String>,
        correct_answer: String,
        #[serde(default)]
        explanation: String,
    },
    #[serde(rename = "true-false")]
    TrueFalse {
        id: QuestionId,
        question: String,
        correct_answer: bool,
        #[serde(default)]
        explanation: String,
    },
    #[serde(rename = "short-answer")]
    ShortAnswer {
        id: QuestionId,
        question: String,
        correct_answer: String,
        #[serde(default)]
        explanation: String,
    },
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        match self {
            Question::MultipleChoice { id, .. }
            | Question::TrueFalse { id, .. }
            | Question::ShortAnswer { id, .. } => id,
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        match self {
            Question::MultipleChoice { question, .. }
            | Question::TrueFalse { question, .. }
            | Question::ShortAnswer { question, .. } => question,
        }
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        match self {
            Question::MultipleChoice { explanation, .. }
            | Question::TrueFalse { explanation, .. }
            | Question::ShortAnswer { explanation, .. } => explanation,
        }
    }

    /// Human-readable label for the question type.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self {
            Question::MultipleChoice { .. } => "Multiple Choice",
            Question::TrueFalse { .. } => "True/False",
            Question::ShortAnswer { .. } => "Short Answer",
        }
    }

    /// The reference answer rendered as text.
    #[must_use]
    pub fn correct_answer_text(&self) -> String {
        match self {
            Question::MultipleChoice { correct_answer, .. }
            | Question::ShortAnswer { correct_answer, .. } => correct_answer.clone(),
            Question::TrueFalse { correct_answer, .. } => correct_answer.to_string(),
        }
    }
}

/// A submitted answer.
///
/// The shape is not checked against the question type when recorded; a
/// mismatched shape simply never scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Text(String),
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Bool(b) => write!(f, "{b}"),
            Answer::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Answer {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Answer {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Answer {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Answers keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<QuestionId, Answer>);

impl AnswerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the answer for a question.
    pub fn upsert(&mut self, id: QuestionId, answer: Answer) {
        self.0.insert(id, answer);
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Answer> {
        self.0.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.0.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &Answer)> {
        self.0.iter()
    }
}

impl FromIterator<(QuestionId, Answer)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (QuestionId, Answer)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Loosely-typed quiz as it arrives from the generator, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizDraft {
    pub title: String,
    pub questions: Vec<Question>,
}

/// A validated quiz: at least one question, unique ids, well-formed choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuizDraft")]
pub struct Quiz {
    #[serde(skip)]
    id: Option<QuizId>,
    title: String,
    questions: Vec<Question>,
}

impl TryFrom<QuizDraft> for Quiz {
    type Error = QuizError;

    fn try_from(draft: QuizDraft) -> Result<Self, Self::Error> {
        if draft.questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }

        let mut seen = HashSet::with_capacity(draft.questions.len());
        for question in &draft.questions {
            if !seen.insert(question.id()) {
                return Err(QuizError::DuplicateQuestion(question.id().clone()));
            }
            if let Question::MultipleChoice {
                id,
                options,
                correct_answer,
                ..
            } = question
            {
                if options.len() < 2 {
                    return Err(QuizError::TooFewOptions(id.clone()));
                }
                if !options.contains(correct_answer) {
                    return Err(QuizError::AnswerNotInOptions(id.clone()));
                }
            }
        }

        Ok(Self {
            id: None,
            title: draft.title,
            questions: draft.questions,
        })
    }
}

impl Quiz {
    #[must_use]
    pub fn with_id(mut self, id: QuizId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<QuizId> {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false for a validated quiz.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }
}
