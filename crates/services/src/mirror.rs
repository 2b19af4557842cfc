//! Best-effort mirroring of session state into the store.
//!
//! Local session state is the source of truth. Writes that hand back an id
//! (material, plan, quiz) are awaited but never fail the caller; progress flags
//! and quiz results are detached tasks. Detached writes of one mirror form a
//! chain, each waiting for the previous one, so the store sees them in the order
//! the session issued them. Every failure is logged and counted.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use storage::{Storage, StorageError};
use study_core::model::{Material, MaterialId, PlanId, Quiz, QuizId, QuizResult, StudyPlan, UserId};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Clone)]
struct MirrorTarget {
    user: UserId,
    storage: Storage,
}

/// Persistence writes owned by one session.
pub struct PersistenceMirror {
    target: Option<MirrorTarget>,
    tail: Option<JoinHandle<()>>,
    queued: Arc<AtomicUsize>,
    failures: Arc<AtomicUsize>,
}

impl PersistenceMirror {
    #[must_use]
    pub fn new(user: UserId, storage: Storage) -> Self {
        Self {
            target: Some(MirrorTarget { user, storage }),
            tail: None,
            queued: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A mirror that never writes; sessions run purely in memory.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            target: None,
            tail: None,
            queued: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A fresh mirror to the same user and store, with its own pending writes.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            target: self.target.clone(),
            tail: None,
            queued: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserId> {
        self.target.as_ref().map(|t| t.user)
    }

    /// Number of writes that failed so far.
    #[must_use]
    pub fn failed_writes(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// Number of detached writes not yet applied.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }

    pub async fn save_material(
        &self,
        material: &Material,
        at: DateTime<Utc>,
    ) -> Option<MaterialId> {
        let target = self.target.as_ref()?;
        let res = target
            .storage
            .materials
            .save_material(target.user, material, at)
            .await;
        self.settle("save_material", res)
    }

    pub async fn save_plan(
        &self,
        material_id: Option<MaterialId>,
        plan: &StudyPlan,
        at: DateTime<Utc>,
    ) -> Option<PlanId> {
        let target = self.target.as_ref()?;
        let res = target
            .storage
            .plans
            .save_plan(target.user, material_id, plan, at)
            .await;
        self.settle("save_plan", res)
    }

    pub async fn save_quiz(
        &self,
        material_id: Option<MaterialId>,
        quiz: &Quiz,
        at: DateTime<Utc>,
    ) -> Option<QuizId> {
        let target = self.target.as_ref()?;
        let res = target
            .storage
            .quizzes
            .save_quiz(target.user, material_id, quiz, at)
            .await;
        self.settle("save_quiz", res)
    }

    /// Mirror one day's completion flag without waiting for the store.
    pub fn record_progress(&mut self, plan_id: PlanId, day: u32, completed: bool) {
        let Some(target) = self.target.clone() else {
            return;
        };
        self.detach("update_plan_progress", async move {
            target
                .storage
                .plans
                .update_plan_progress(plan_id, day, completed)
                .await
        });
    }

    /// Mirror a submitted result without waiting for the store.
    pub fn record_result(&mut self, quiz_id: QuizId, result: QuizResult) {
        let Some(target) = self.target.clone() else {
            return;
        };
        self.detach("save_quiz_result", async move {
            target
                .storage
                .quizzes
                .save_quiz_result(target.user, quiz_id, &result)
                .await
                .map(|_| ())
        });
    }

    /// Wait for every detached write issued so far.
    pub async fn flush(&mut self) {
        if let Some(tail) = self.tail.take() {
            if let Err(err) = tail.await {
                warn!(error = %err, "persistence task did not complete");
                self.failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn settle<T: std::fmt::Debug>(
        &self,
        op: &'static str,
        res: Result<T, StorageError>,
    ) -> Option<T> {
        match res {
            Ok(id) => {
                debug!(op, ?id, "persisted");
                Some(id)
            }
            Err(err) => {
                record_failure(&self.failures, op, &err);
                None
            }
        }
    }

    fn detach<F>(&mut self, op: &'static str, write: F)
    where
        F: Future<Output = Result<(), StorageError>> + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(op, "no async runtime available, write dropped");
            self.failures.fetch_add(1, Ordering::Relaxed);
            return;
        };

        let previous = self.tail.take();
        let failures = Arc::clone(&self.failures);
        let queued = Arc::clone(&self.queued);
        queued.fetch_add(1, Ordering::AcqRel);
        self.tail = Some(runtime.spawn(async move {
            if let Some(previous) = previous {
                if let Err(err) = previous.await {
                    warn!(error = %err, "persistence task did not complete");
                    failures.fetch_add(1, Ordering::Relaxed);
                }
            }
            if let Err(err) = write.await {
                record_failure(&failures, op, &err);
            }
            queued.fetch_sub(1, Ordering::AcqRel);
        }));
    }
}

fn record_failure(failures: &AtomicUsize, op: &'static str, err: &StorageError) {
    warn!(op, error = %err, "persistence write failed, continuing without it");
    failures.fetch_add(1, Ordering::Relaxed);
}

impl std::fmt::Debug for PersistenceMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceMirror")
            .field("user", &self.user())
            .field("pending", &self.pending_writes())
            .field("failures", &self.failed_writes())
            .finish()
    }
}
