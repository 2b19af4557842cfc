#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use services::generation::{parse_plan, parse_quiz};
use services::{ArtifactGenerator, GenerationError};
use storage::repository::{
    IdentityRepository, MaterialRecord, MaterialRepository, PlanRepository, QuizRepository,
    QuizResultRecord,
};
use storage::{InMemoryRepository, Storage, StorageError};
use study_core::PlanProgress;
use study_core::model::{
    Material, MaterialId, PlanId, Quiz, QuizId, QuizResult, QuizResultId, StudyPlan, UserId,
};

pub const QUIZ_JSON: &str = r#"```json
{
  "title": "Cell biology",
  "questions": [
    {"id": 1, "type": "mcq", "question": "Which organelle makes ATP?",
     "options": ["Nucleus", "Mitochondria", "Ribosome"], "correctAnswer": "Mitochondria"},
    {"id": 2, "type": "true-false", "question": "Plant cells have walls.", "correctAnswer": true},
    {"id": 3, "type": "short-answer", "question": "Describe the mitochondria.",
     "correctAnswer": "mitochondria powerhouse cell"}
  ]
}
```"#;

pub const PLAN_JSON: &str = r#"{
  "title": "Three days of cells",
  "overview": "From organelles to division.",
  "days": [
    {"day": 1, "title": "Organelles", "topics": ["mitochondria"], "duration": "1 hour"},
    {"day": 2, "title": "Membranes"},
    {"day": 3, "title": "Division", "activities": ["draw mitosis"]}
  ],
  "tips": ["Review daily"]
}"#;

/// Generator returning canned artifacts, or failing while `fail` is set.
#[derive(Default)]
pub struct FakeGenerator {
    fail: AtomicBool,
    plan_calls: AtomicUsize,
    quiz_calls: AtomicUsize,
    last_days: AtomicUsize,
}

impl FakeGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let generator = Self::default();
        generator.fail.store(true, Ordering::SeqCst);
        Arc::new(generator)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn plan_calls(&self) -> usize {
        self.plan_calls.load(Ordering::SeqCst)
    }

    pub fn quiz_calls(&self) -> usize {
        self.quiz_calls.load(Ordering::SeqCst)
    }

    pub fn last_days(&self) -> usize {
        self.last_days.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactGenerator for FakeGenerator {
    async fn generate_plan(&self, _content: &str, days: u32) -> Result<StudyPlan, GenerationError> {
        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        self.last_days.store(days as usize, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerationError::EmptyResponse);
        }
        parse_plan(PLAN_JSON)
    }

    async fn generate_quiz(
        &self,
        _content: &str,
        _num_questions: u32,
    ) -> Result<Quiz, GenerationError> {
        self.quiz_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerationError::EmptyResponse);
        }
        parse_quiz(QUIZ_JSON)
    }
}

/// Store whose every call fails, as if the backend were unreachable.
#[derive(Clone, Copy, Default)]
pub struct OfflineRepository;

fn offline() -> StorageError {
    StorageError::Connection("backend unreachable".into())
}

#[async_trait]
impl IdentityRepository for OfflineRepository {
    async fn current_user(&self) -> Result<Option<UserId>, StorageError> {
        Err(offline())
    }

    async fn save_user(&self, _: UserId, _: DateTime<Utc>) -> Result<(), StorageError> {
        Err(offline())
    }
}

#[async_trait]
impl MaterialRepository for OfflineRepository {
    async fn save_material(
        &self,
        _: UserId,
        _: &Material,
        _: DateTime<Utc>,
    ) -> Result<MaterialId, StorageError> {
        Err(offline())
    }

    async fn list_materials(&self, _: UserId) -> Result<Vec<MaterialRecord>, StorageError> {
        Err(offline())
    }
}

#[async_trait]
impl PlanRepository for OfflineRepository {
    async fn save_plan(
        &self,
        _: UserId,
        _: Option<MaterialId>,
        _: &StudyPlan,
        _: DateTime<Utc>,
    ) -> Result<PlanId, StorageError> {
        Err(offline())
    }

    async fn get_plan(&self, _: PlanId) -> Result<StudyPlan, StorageError> {
        Err(offline())
    }

    async fn list_plans(&self, _: UserId) -> Result<Vec<StudyPlan>, StorageError> {
        Err(offline())
    }

    async fn update_plan_progress(&self, _: PlanId, _: u32, _: bool) -> Result<(), StorageError> {
        Err(offline())
    }

    async fn get_plan_progress(&self, _: PlanId) -> Result<PlanProgress, StorageError> {
        Err(offline())
    }
}

#[async_trait]
impl QuizRepository for OfflineRepository {
    async fn save_quiz(
        &self,
        _: UserId,
        _: Option<MaterialId>,
        _: &Quiz,
        _: DateTime<Utc>,
    ) -> Result<QuizId, StorageError> {
        Err(offline())
    }

    async fn get_quiz(&self, _: QuizId) -> Result<Quiz, StorageError> {
        Err(offline())
    }

    async fn save_quiz_result(
        &self,
        _: UserId,
        _: QuizId,
        _: &QuizResult,
    ) -> Result<QuizResultId, StorageError> {
        Err(offline())
    }

    async fn list_quiz_results(&self, _: UserId) -> Result<Vec<QuizResultRecord>, StorageError> {
        Err(offline())
    }
}

pub fn offline_storage() -> Storage {
    Storage {
        identity: Arc::new(OfflineRepository),
        materials: Arc::new(OfflineRepository),
        plans: Arc::new(OfflineRepository),
        quizzes: Arc::new(OfflineRepository),
    }
}

pub fn material() -> Material {
    Material::new("Cells", "Mitochondria are the powerhouse of the cell.").unwrap()
}

/// In-memory store that accepts saves but rejects progress and result writes.
#[derive(Clone, Default)]
pub struct FlakyRepository {
    inner: InMemoryRepository,
}

#[async_trait]
impl PlanRepository for FlakyRepository {
    async fn save_plan(
        &self,
        user: UserId,
        material_id: Option<MaterialId>,
        plan: &StudyPlan,
        at: DateTime<Utc>,
    ) -> Result<PlanId, StorageError> {
        self.inner.save_plan(user, material_id, plan, at).await
    }

    async fn get_plan(&self, id: PlanId) -> Result<StudyPlan, StorageError> {
        self.inner.get_plan(id).await
    }

    async fn list_plans(&self, user: UserId) -> Result<Vec<StudyPlan>, StorageError> {
        self.inner.list_plans(user).await
    }

    async fn update_plan_progress(&self, _: PlanId, _: u32, _: bool) -> Result<(), StorageError> {
        Err(offline())
    }

    async fn get_plan_progress(&self, id: PlanId) -> Result<PlanProgress, StorageError> {
        self.inner.get_plan_progress(id).await
    }
}

#[async_trait]
impl QuizRepository for FlakyRepository {
    async fn save_quiz(
        &self,
        user: UserId,
        material_id: Option<MaterialId>,
        quiz: &Quiz,
        at: DateTime<Utc>,
    ) -> Result<QuizId, StorageError> {
        self.inner.save_quiz(user, material_id, quiz, at).await
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError> {
        self.inner.get_quiz(id).await
    }

    async fn save_quiz_result(
        &self,
        _: UserId,
        _: QuizId,
        _: &QuizResult,
    ) -> Result<QuizResultId, StorageError> {
        Err(offline())
    }

    async fn list_quiz_results(&self, user: UserId) -> Result<Vec<QuizResultRecord>, StorageError> {
        self.inner.list_quiz_results(user).await
    }
}

pub fn flaky_storage() -> Storage {
    let repo = FlakyRepository::default();
    Storage {
        identity: Arc::new(repo.inner.clone()),
        materials: Arc::new(repo.inner.clone()),
        plans: Arc::new(repo.clone()),
        quizzes: Arc::new(repo),
    }
}

/// In-memory store where marking a day complete takes longer than clearing it.
#[derive(Clone, Default)]
pub struct SlowCompletionRepository {
    inner: InMemoryRepository,
}

#[async_trait]
impl PlanRepository for SlowCompletionRepository {
    async fn save_plan(
        &self,
        user: UserId,
        material_id: Option<MaterialId>,
        plan: &StudyPlan,
        at: DateTime<Utc>,
    ) -> Result<PlanId, StorageError> {
        self.inner.save_plan(user, material_id, plan, at).await
    }

    async fn get_plan(&self, id: PlanId) -> Result<StudyPlan, StorageError> {
        self.inner.get_plan(id).await
    }

    async fn list_plans(&self, user: UserId) -> Result<Vec<StudyPlan>, StorageError> {
        self.inner.list_plans(user).await
    }

    async fn update_plan_progress(
        &self,
        plan_id: PlanId,
        day: u32,
        completed: bool,
    ) -> Result<(), StorageError> {
        if completed {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        self.inner.update_plan_progress(plan_id, day, completed).await
    }

    async fn get_plan_progress(&self, id: PlanId) -> Result<PlanProgress, StorageError> {
        self.inner.get_plan_progress(id).await
    }
}

pub fn slow_completion_storage() -> Storage {
    let repo = SlowCompletionRepository::default();
    Storage {
        identity: Arc::new(repo.inner.clone()),
        materials: Arc::new(repo.inner.clone()),
        plans: Arc::new(repo.clone()),
        quizzes: Arc::new(repo.inner),
    }
}

/// A PDF with one Courier text line per page.
pub fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).unwrap();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
