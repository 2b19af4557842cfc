mod artifact;
mod ids;
mod material;
pub mod plan;
pub mod quiz;
mod result;

pub use artifact::{ArtifactError, ArtifactKind};
pub use ids::{MaterialId, ParseIdError, PlanId, QuestionId, QuizId, QuizResultId, UserId};
pub use material::{Material, MaterialError, PREVIEW_CHARS};
pub use plan::{Day, PlanError, StudyPlan, StudyPlanDraft, clamp_plan_days};
pub use quiz::{Answer, AnswerSet, Question, Quiz, QuizDraft, QuizError};
pub use result::{GradeBand, QuizResult, percentage};
