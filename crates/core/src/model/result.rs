use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::quiz::AnswerSet;

/// Frozen outcome of a submitted quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub score: u32,
    pub total_questions: u32,
    pub answers: AnswerSet,
    pub completed_at: DateTime<Utc>,
}

/// Feedback band shown with a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeBand {
    Excellent,
    Great,
    GoodEffort,
    KeepStudying,
}

impl GradeBand {
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Self::Excellent,
            70..=89 => Self::Great,
            50..=69 => Self::GoodEffort,
            _ => Self::KeepStudying,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent!",
            Self::Great => "Great Job!",
            Self::GoodEffort => "Good Effort!",
            Self::KeepStudying => "Keep Studying!",
        }
    }
}

impl QuizResult {
    /// Score as a whole percentage, rounded half away from zero.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        percentage(self.score, self.total_questions)
    }

    #[must_use]
    pub fn grade(&self) -> GradeBand {
        GradeBand::from_percentage(self.percentage())
    }
}

/// `score / total` as a rounded percentage; 0 when `total` is 0.
#[must_use]
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score) * 100;
    let total = u64::from(total);
    u32::try_from((score * 2 + total) / (total * 2)).unwrap_or(u32::MAX)
}
