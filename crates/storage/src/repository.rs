use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use study_core::PlanProgress;
use study_core::model::{
    Material, MaterialId, PlanId, Quiz, QuizId, QuizResult, QuizResultId, StudyPlan, UserId,
};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted material as listed back to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialRecord {
    pub id: MaterialId,
    pub user_id: UserId,
    pub title: String,
    pub content_preview: String,
    pub created_at: DateTime<Utc>,
}

/// Persisted quiz result with its owning quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResultRecord {
    pub id: QuizResultId,
    pub quiz_id: QuizId,
    pub user_id: UserId,
    pub result: QuizResult,
}

/// Anonymous identity bootstrap.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Returns the identity stored on this device, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn current_user(&self) -> Result<Option<UserId>, StorageError>;

    /// Store a freshly minted identity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id already exists.
    async fn save_user(&self, user: UserId, created_at: DateTime<Utc>)
    -> Result<(), StorageError>;
}

#[async_trait]
pub trait MaterialRepository: Send + Sync {
    /// Persist an uploaded material and return its new id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the material cannot be stored.
    async fn save_material(
        &self,
        user: UserId,
        material: &Material,
        created_at: DateTime<Utc>,
    ) -> Result<MaterialId, StorageError>;

    /// List a user's materials, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_materials(&self, user: UserId) -> Result<Vec<MaterialRecord>, StorageError>;
}

#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Persist a generated plan and return its new id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the plan cannot be stored.
    async fn save_plan(
        &self,
        user: UserId,
        material_id: Option<MaterialId>,
        plan: &StudyPlan,
        created_at: DateTime<Utc>,
    ) -> Result<PlanId, StorageError>;

    /// Fetch a plan with its id attached.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_plan(&self, id: PlanId) -> Result<StudyPlan, StorageError>;

    /// List a user's plans, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_plans(&self, user: UserId) -> Result<Vec<StudyPlan>, StorageError>;

    /// Record the completion flag of one plan day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the plan does not exist.
    async fn update_plan_progress(
        &self,
        plan_id: PlanId,
        day: u32,
        completed: bool,
    ) -> Result<(), StorageError>;

    /// Load the stored completion flags of a plan.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the plan does not exist.
    async fn get_plan_progress(&self, plan_id: PlanId) -> Result<PlanProgress, StorageError>;
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist a generated quiz and return its new id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn save_quiz(
        &self,
        user: UserId,
        material_id: Option<MaterialId>,
        quiz: &Quiz,
        created_at: DateTime<Utc>,
    ) -> Result<QuizId, StorageError>;

    /// Fetch a quiz with its id attached.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError>;

    /// Append one submitted result for a saved quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz does not exist.
    async fn save_quiz_result(
        &self,
        user: UserId,
        quiz_id: QuizId,
        result: &QuizResult,
    ) -> Result<QuizResultId, StorageError>;

    /// List a user's quiz results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_quiz_results(&self, user: UserId)
    -> Result<Vec<QuizResultRecord>, StorageError>;
}

struct StoredPlan {
    user_id: UserId,
    plan: StudyPlan,
    progress: PlanProgress,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct InMemoryState {
    next_id: u64,
    user: Option<UserId>,
    materials: Vec<MaterialRecord>,
    plans: HashMap<PlanId, StoredPlan>,
    quizzes: HashMap<QuizId, Quiz>,
    results: Vec<QuizResultRecord>,
}

impl InMemoryState {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl IdentityRepository for InMemoryRepository {
    async fn current_user(&self) -> Result<Option<UserId>, StorageError> {
        Ok(self.lock()?.user)
    }

    async fn save_user(
        &self,
        user: UserId,
        _created_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.user == Some(user) {
            return Err(StorageError::Conflict);
        }
        guard.user = Some(user);
        Ok(())
    }
}

#[async_trait]
impl MaterialRepository for InMemoryRepository {
    async fn save_material(
        &self,
        user: UserId,
        material: &Material,
        created_at: DateTime<Utc>,
    ) -> Result<MaterialId, StorageError> {
        let mut guard = self.lock()?;
        let id = MaterialId::new(guard.allocate());
        guard.materials.push(MaterialRecord {
            id,
            user_id: user,
            title: material.title().to_owned(),
            content_preview: material.preview().to_owned(),
            created_at,
        });
        Ok(id)
    }

    async fn list_materials(&self, user: UserId) -> Result<Vec<MaterialRecord>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .materials
            .iter()
            .rev()
            .filter(|m| m.user_id == user)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PlanRepository for InMemoryRepository {
    async fn save_plan(
        &self,
        user: UserId,
        _material_id: Option<MaterialId>,
        plan: &StudyPlan,
        created_at: DateTime<Utc>,
    ) -> Result<PlanId, StorageError> {
        let mut guard = self.lock()?;
        let id = PlanId::new(guard.allocate());
        guard.plans.insert(
            id,
            StoredPlan {
                user_id: user,
                plan: plan.clone().with_id(id),
                progress: PlanProgress::new(),
                created_at,
            },
        );
        Ok(id)
    }

    async fn get_plan(&self, id: PlanId) -> Result<StudyPlan, StorageError> {
        let guard = self.lock()?;
        guard
            .plans
            .get(&id)
            .map(|p| p.plan.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_plans(&self, user: UserId) -> Result<Vec<StudyPlan>, StorageError> {
        let guard = self.lock()?;
        let mut plans: Vec<&StoredPlan> =
            guard.plans.values().filter(|p| p.user_id == user).collect();
        plans.sort_by_key(|p| std::cmp::Reverse((p.created_at, p.plan.id())));
        Ok(plans.into_iter().map(|p| p.plan.clone()).collect())
    }

    async fn update_plan_progress(
        &self,
        plan_id: PlanId,
        day: u32,
        completed: bool,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let stored = guard.plans.get_mut(&plan_id).ok_or(StorageError::NotFound)?;
        // Flags for days the plan does not have are dropped.
        if stored.plan.has_day(day) {
            stored.progress.set(day, completed);
        }
        Ok(())
    }

    async fn get_plan_progress(&self, plan_id: PlanId) -> Result<PlanProgress, StorageError> {
        let guard = self.lock()?;
        guard
            .plans
            .get(&plan_id)
            .map(|p| p.progress.clone())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn save_quiz(
        &self,
        _user: UserId,
        _material_id: Option<MaterialId>,
        quiz: &Quiz,
        _created_at: DateTime<Utc>,
    ) -> Result<QuizId, StorageError> {
        let mut guard = self.lock()?;
        let id = QuizId::new(guard.allocate());
        guard.quizzes.insert(id, quiz.clone().with_id(id));
        Ok(id)
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError> {
        let guard = self.lock()?;
        guard
            .quizzes
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn save_quiz_result(
        &self,
        user: UserId,
        quiz_id: QuizId,
        result: &QuizResult,
    ) -> Result<QuizResultId, StorageError> {
        let mut guard = self.lock()?;
        if !guard.quizzes.contains_key(&quiz_id) {
            return Err(StorageError::NotFound);
        }
        let id = QuizResultId::new(guard.allocate());
        guard.results.push(QuizResultRecord {
            id,
            quiz_id,
            user_id: user,
            result: result.clone(),
        });
        Ok(id)
    }

    async fn list_quiz_results(
        &self,
        user: UserId,
    ) -> Result<Vec<QuizResultRecord>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .results
            .iter()
            .rev()
            .filter(|r| r.user_id == user)
            .cloned()
            .collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub identity: Arc<dyn IdentityRepository>,
    pub materials: Arc<dyn MaterialRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            identity: Arc::new(repo.clone()),
            materials: Arc::new(repo.clone()),
            plans: Arc::new(repo.clone()),
            quizzes: Arc::new(repo),
        }
    }
}
