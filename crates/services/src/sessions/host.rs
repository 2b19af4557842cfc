use std::path::Path;
use std::sync::Arc;

use study_core::model::Material;
use tracing::{debug, info};

use super::plan::PlanTracker;
use super::quiz::QuizSession;
use crate::Clock;
use crate::error::HostError;
use crate::extract::{EXTRACT_CHAR_CAP, EXTRACT_TRUNCATION_MARKER, Extractor, default_title, truncate_text};
use crate::generation::ArtifactGenerator;
use crate::mirror::PersistenceMirror;

/// Top-level step of a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStep {
    Upload,
    Choose,
    Plan,
    Quiz,
}

enum HostState {
    Upload,
    Choose(Material),
    Plan(PlanTracker),
    Quiz(QuizSession),
}

/// Drives one learner from material upload into a plan or quiz workflow.
///
/// `upload → choose → {plan | quiz}`. `back` goes from a workflow to `choose`
/// (keeping the material) and from `choose` to `upload` (dropping it).
pub struct SessionHost {
    state: HostState,
    generator: Arc<dyn ArtifactGenerator>,
    extractor: Arc<dyn Extractor>,
    mirror: PersistenceMirror,
    clock: Clock,
}

impl SessionHost {
    #[must_use]
    pub fn new(
        generator: Arc<dyn ArtifactGenerator>,
        extractor: Arc<dyn Extractor>,
        mirror: PersistenceMirror,
        clock: Clock,
    ) -> Self {
        Self {
            state: HostState::Upload,
            generator,
            extractor,
            mirror,
            clock,
        }
    }

    #[must_use]
    pub fn step(&self) -> HostStep {
        match self.state {
            HostState::Upload => HostStep::Upload,
            HostState::Choose(_) => HostStep::Choose,
            HostState::Plan(_) => HostStep::Plan,
            HostState::Quiz(_) => HostStep::Quiz,
        }
    }

    /// The current material, once one has been provided.
    #[must_use]
    pub fn material(&self) -> Option<&Material> {
        match &self.state {
            HostState::Upload => None,
            HostState::Choose(material) => Some(material),
            HostState::Plan(tracker) => Some(tracker.material()),
            HostState::Quiz(session) => Some(session.material()),
        }
    }

    #[must_use]
    pub fn mirror(&self) -> &PersistenceMirror {
        &self.mirror
    }

    /// Use pasted text as the study material.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Input` for an empty title or content and
    /// `HostError::WrongStep` outside `upload`.
    pub async fn submit_text(
        &mut self,
        title: &str,
        content: &str,
    ) -> Result<&Material, HostError> {
        self.expect_step(HostStep::Upload)?;
        let material = Material::new(title, content)?;
        self.accept(material).await
    }

    /// Extract a document and use its text as the study material.
    ///
    /// Without a title the file name (sans extension) is used.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Extraction` when the file cannot be read as text;
    /// the host stays in `upload`.
    pub async fn upload_file(
        &mut self,
        path: &Path,
        title: Option<&str>,
    ) -> Result<&Material, HostError> {
        self.expect_step(HostStep::Upload)?;
        let text = self.extractor.extract(path).await?;
        let content = truncate_text(&text, EXTRACT_CHAR_CAP, EXTRACT_TRUNCATION_MARKER);
        let title = title.map_or_else(|| default_title(path), str::to_owned);
        let material = Material::new(title, content)?;
        self.accept(material).await
    }

    async fn accept(&mut self, material: Material) -> Result<&Material, HostError> {
        let material = match self.mirror.save_material(&material, self.clock.now()).await {
            Some(id) => material.with_id(id),
            None => material,
        };
        info!(title = material.title(), material_id = ?material.id(), "material ready");
        self.state = HostState::Choose(material);
        self.material().ok_or(HostError::WrongStep {
            expected: HostStep::Choose,
            actual: HostStep::Upload,
        })
    }

    /// Start the study-plan workflow for the current material.
    ///
    /// # Errors
    ///
    /// Returns `HostError::WrongStep` outside `choose`.
    pub fn choose_plan(&mut self) -> Result<&mut PlanTracker, HostError> {
        let material = self.take_material()?;
        let tracker = PlanTracker::new(
            material,
            Arc::clone(&self.generator),
            self.mirror.fork(),
            self.clock,
        );
        debug!("entering plan workflow");
        self.state = HostState::Plan(tracker);
        self.plan_tracker_mut().ok_or(HostError::WrongStep {
            expected: HostStep::Plan,
            actual: HostStep::Choose,
        })
    }

    /// Start the quiz workflow for the current material.
    ///
    /// # Errors
    ///
    /// Returns `HostError::WrongStep` outside `choose`.
    pub fn choose_quiz(&mut self) -> Result<&mut QuizSession, HostError> {
        let material = self.take_material()?;
        let session = QuizSession::new(
            material,
            Arc::clone(&self.generator),
            self.mirror.fork(),
            self.clock,
        );
        debug!("entering quiz workflow");
        self.state = HostState::Quiz(session);
        self.quiz_session_mut().ok_or(HostError::WrongStep {
            expected: HostStep::Quiz,
            actual: HostStep::Choose,
        })
    }

    #[must_use]
    pub fn plan_tracker(&self) -> Option<&PlanTracker> {
        match &self.state {
            HostState::Plan(tracker) => Some(tracker),
            _ => None,
        }
    }

    pub fn plan_tracker_mut(&mut self) -> Option<&mut PlanTracker> {
        match &mut self.state {
            HostState::Plan(tracker) => Some(tracker),
            _ => None,
        }
    }

    #[must_use]
    pub fn quiz_session(&self) -> Option<&QuizSession> {
        match &self.state {
            HostState::Quiz(session) => Some(session),
            _ => None,
        }
    }

    pub fn quiz_session_mut(&mut self) -> Option<&mut QuizSession> {
        match &mut self.state {
            HostState::Quiz(session) => Some(session),
            _ => None,
        }
    }

    /// Step back one level and return the new step.
    ///
    /// Leaving a workflow discards its plan or quiz; leaving `choose` discards
    /// the material. Detached writes already issued keep running.
    pub fn back(&mut self) -> HostStep {
        self.state = match std::mem::replace(&mut self.state, HostState::Upload) {
            HostState::Upload | HostState::Choose(_) => HostState::Upload,
            HostState::Plan(tracker) => HostState::Choose(tracker.into_material()),
            HostState::Quiz(session) => HostState::Choose(session.into_material()),
        };
        let step = self.step();
        debug!(?step, "stepped back");
        step
    }

    /// Wait for the detached writes of the active workflow.
    pub async fn flush(&mut self) {
        match &mut self.state {
            HostState::Plan(tracker) => tracker.flush().await,
            HostState::Quiz(session) => session.flush().await,
            HostState::Upload | HostState::Choose(_) => {}
        }
    }

    fn expect_step(&self, expected: HostStep) -> Result<(), HostError> {
        let actual = self.step();
        if actual == expected {
            Ok(())
        } else {
            Err(HostError::WrongStep { expected, actual })
        }
    }

    fn take_material(&mut self) -> Result<Material, HostError> {
        self.expect_step(HostStep::Choose)?;
        match std::mem::replace(&mut self.state, HostState::Upload) {
            HostState::Choose(material) => Ok(material),
            other => {
                self.state = other;
                Err(HostError::WrongStep {
                    expected: HostStep::Choose,
                    actual: self.step(),
                })
            }
        }
    }
}

impl std::fmt::Debug for SessionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHost")
            .field("step", &self.step())
            .field("material", &self.material().map(Material::title))
            .field("mirror", &self.mirror)
            .finish_non_exhaustive()
    }
}
