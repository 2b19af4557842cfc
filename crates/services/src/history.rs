use storage::repository::{MaterialRecord, QuizResultRecord};
use storage::{Storage, StorageError};
use study_core::PlanProgress;
use study_core::model::{StudyPlan, UserId};

/// A stored plan with its saved completion flags.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanHistoryItem {
    pub plan: StudyPlan,
    pub progress: PlanProgress,
}

impl PlanHistoryItem {
    #[must_use]
    pub fn completion_ratio(&self) -> f64 {
        self.progress.completion_ratio(self.plan.days().len())
    }
}

/// Read-only view over what a user has stored.
#[derive(Clone)]
pub struct HistoryService {
    user: UserId,
    storage: Storage,
}

impl HistoryService {
    #[must_use]
    pub fn new(user: UserId, storage: Storage) -> Self {
        Self { user, storage }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    pub async fn materials(&self) -> Result<Vec<MaterialRecord>, StorageError> {
        self.storage.materials.list_materials(self.user).await
    }

    /// Plans newest first, each with its progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a plan or its progress cannot be loaded.
    pub async fn plans(&self) -> Result<Vec<PlanHistoryItem>, StorageError> {
        let plans = self.storage.plans.list_plans(self.user).await?;
        let mut items = Vec::with_capacity(plans.len());
        for plan in plans {
            let progress = match plan.id() {
                Some(id) => self.storage.plans.get_plan_progress(id).await?,
                None => PlanProgress::new(),
            };
            items.push(PlanHistoryItem { plan, progress });
        }
        Ok(items)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    pub async fn quiz_results(&self) -> Result<Vec<QuizResultRecord>, StorageError> {
        self.storage.quizzes.list_quiz_results(self.user).await
    }
}
